//! Composite handler wiring the system handlers together

use crate::acl_command::CommandAclHandler;
use crate::identity::SystemIdentityHandler;
use crate::ownership::SystemOwnershipHandler;
use std::path::Path;
use trellis_core::{
    AclEffectError, AclEffects, AclEntry, AclKind, AclSpec, Identity, IdentityEffects,
    OwnershipEffects, Principal, TrellisConfig,
};

/// Every effect a Trellis run needs, backed by the host system
#[derive(Debug, Clone)]
pub struct SystemEffects {
    acl: CommandAclHandler,
    identity: SystemIdentityHandler,
    ownership: SystemOwnershipHandler,
}

impl SystemEffects {
    /// Locate the ACL tools named in `config` (or on `PATH`)
    pub fn from_config(config: &TrellisConfig) -> Result<Self, AclEffectError> {
        Ok(Self {
            acl: CommandAclHandler::locate(config.setfacl.as_deref(), config.getfacl.as_deref())?,
            identity: SystemIdentityHandler::new(),
            ownership: SystemOwnershipHandler::new(),
        })
    }
}

impl AclEffects for SystemEffects {
    fn read_acl(&self, path: &Path, kind: AclKind) -> Result<Vec<AclEntry>, AclEffectError> {
        self.acl.read_acl(path, kind)
    }

    fn write_acl(&self, path: &Path, kind: AclKind, spec: &AclSpec) -> Result<(), AclEffectError> {
        self.acl.write_acl(path, kind, spec)
    }

    fn remove_default_acl(&self, path: &Path) -> Result<(), AclEffectError> {
        self.acl.remove_default_acl(path)
    }
}

impl IdentityEffects for SystemEffects {
    fn resolve(&self, principal: &Principal) -> Result<Option<Identity>, AclEffectError> {
        self.identity.resolve(principal)
    }

    fn current_principal(&self) -> Result<Principal, AclEffectError> {
        self.identity.current_principal()
    }
}

impl OwnershipEffects for SystemEffects {
    fn set_owner(&self, path: &Path, identity: Identity) -> Result<(), AclEffectError> {
        self.ownership.set_owner(path, identity)
    }
}
