//! Ownership changes through `chown(2)`

use nix::unistd::{chown, Gid, Uid};
use std::io;
use std::path::Path;
use tracing::debug;
use trellis_core::{AclEffectError, Identity, OwnershipEffects};

/// Ownership handler calling `chown(2)` directly
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOwnershipHandler;

impl SystemOwnershipHandler {
    /// Create a handler
    pub fn new() -> Self {
        Self
    }
}

impl OwnershipEffects for SystemOwnershipHandler {
    fn set_owner(&self, path: &Path, identity: Identity) -> Result<(), AclEffectError> {
        chown(
            path,
            Some(Uid::from_raw(identity.uid)),
            Some(Gid::from_raw(identity.gid)),
        )
        .map_err(|errno| AclEffectError::from_io(path, io::Error::from(errno)))?;
        debug!(path = %path.display(), %identity, "Changed owner");
        Ok(())
    }
}
