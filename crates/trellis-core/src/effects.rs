//! Effect traits: the operating-system facilities the synchronizer consumes
//!
//! This module defines **what** can be asked of the OS; handlers define
//! **how**:
//! - `trellis-effects` talks to the real ACL tools, passwd database and
//!   `chown(2)`
//! - `trellis-testkit` keeps everything in memory for deterministic tests
//!
//! All calls are synchronous and blocking. ACL state is treated abstractly as
//! list / set / remove-default; validation and mask computation happen in
//! [`crate::acl`] before a handler ever sees a spec.

use crate::acl::{AclEntry, AclKind, AclSpec};
use crate::errors::AclEffectError;
use crate::principal::{Identity, Principal};
use std::path::Path;

/// Reading and writing POSIX ACLs
pub trait AclEffects: Send + Sync {
    /// Entries of the `kind` ACL of `path`.
    ///
    /// An entry without extended ACL reports the minimal access ACL derived
    /// from its mode bits; a directory without a default ACL reports no
    /// default entries.
    fn read_acl(&self, path: &Path, kind: AclKind) -> Result<Vec<AclEntry>, AclEffectError>;

    /// Replace the `kind` ACL of `path` with `spec`
    fn write_acl(&self, path: &Path, kind: AclKind, spec: &AclSpec) -> Result<(), AclEffectError>;

    /// Remove the default ACL of directory `path`
    fn remove_default_acl(&self, path: &Path) -> Result<(), AclEffectError>;
}

/// Principal to identity lookup
pub trait IdentityEffects: Send + Sync {
    /// `Ok(None)` when no such user exists
    fn resolve(&self, principal: &Principal) -> Result<Option<Identity>, AclEffectError>;

    /// Principal the current process runs as
    fn current_principal(&self) -> Result<Principal, AclEffectError>;
}

/// Filesystem ownership changes
pub trait OwnershipEffects: Send + Sync {
    /// Set owner user and group of `path` (not recursive)
    fn set_owner(&self, path: &Path, identity: Identity) -> Result<(), AclEffectError>;
}

/// Everything a synchronize or audit run needs
pub trait ProjectEffects: AclEffects + IdentityEffects + OwnershipEffects {}

impl<T> ProjectEffects for T where T: AclEffects + IdentityEffects + OwnershipEffects {}
