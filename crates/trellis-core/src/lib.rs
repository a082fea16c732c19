//! Trellis Core
//!
//! Shared vocabulary for the Trellis workspace:
//! - `principal` / `project` / `roles` - who may access a project and how
//! - `acl` - the POSIX ACL rule algebra (permission triples, entries, specs)
//! - `effects` - trait boundary to the operating system's ACL, identity and
//!   ownership facilities
//! - `config` - explicit configuration values (no process-wide root path)
//! - `errors` / `reports` - the error taxonomy and the values a synchronize or
//!   audit run hands back to its caller
//!
//! Everything here is pure; handlers live in `trellis-effects` and
//! `trellis-testkit`, the synchronization logic in `trellis-sync`.

#![forbid(unsafe_code)]

pub mod acl;
pub mod config;
pub mod effects;
pub mod errors;
pub mod principal;
pub mod project;
pub mod reports;
pub mod roles;

pub use acl::{AclEntry, AclKind, AclSpec, AclSpecBuilder, AclTag, Perms};
pub use config::{ConfigError, ExecPolicy, ProjectLayout, TrellisConfig};
pub use effects::{AclEffects, IdentityEffects, OwnershipEffects, ProjectEffects};
pub use errors::{AclEffectError, ApplyOp, RoleError, SyncError, SyncResult};
pub use principal::{Identity, Principal};
pub use project::{ProjectId, ProjectIdError};
pub use reports::{DriftReport, DriftViolation, SyncSummary};
pub use roles::{Role, RoleAssignment};
