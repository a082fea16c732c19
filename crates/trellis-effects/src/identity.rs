//! User database lookups through `getpwnam(3)` / `getpwuid(3)`

use nix::unistd::{getuid, User};
use tracing::trace;
use trellis_core::{AclEffectError, Identity, IdentityEffects, Principal};

/// Identity handler backed by the system user database
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentityHandler;

impl SystemIdentityHandler {
    /// Create a handler
    pub fn new() -> Self {
        Self
    }
}

impl IdentityEffects for SystemIdentityHandler {
    fn resolve(&self, principal: &Principal) -> Result<Option<Identity>, AclEffectError> {
        let user = User::from_name(principal.as_str()).map_err(|errno| AclEffectError::Lookup {
            message: format!("getpwnam({principal}): {errno}"),
        })?;
        let identity = user.map(|u| Identity::new(u.uid.as_raw(), u.gid.as_raw()));
        trace!(principal = %principal, ?identity, "Resolved principal");
        Ok(identity)
    }

    fn current_principal(&self) -> Result<Principal, AclEffectError> {
        let uid = getuid();
        match User::from_uid(uid) {
            Ok(Some(user)) => Ok(Principal::new(user.name)),
            Ok(None) => Err(AclEffectError::Lookup {
                message: format!("uid {uid} has no passwd entry"),
            }),
            Err(errno) => Err(AclEffectError::Lookup {
                message: format!("getpwuid({uid}): {errno}"),
            }),
        }
    }
}
