//! In-memory effect handlers
//!
//! `MockEffects` implements every Trellis effect trait without touching real
//! ACLs or ownership, so synchronize and audit runs can be exercised
//! unprivileged against a real temporary directory tree:
//! - ACLs and owners are kept per canonical path, so a write through a
//!   symbolic link lands on its target exactly as the OS would apply it
//! - a path never written reports the minimal access ACL derived from its
//!   mode bits and no default ACL
//! - paths can be marked refused or corrupt to inject failures
//! - every mutation is journaled in order
//!
//! # Blocking Lock Usage
//!
//! Uses `std::sync::Mutex`: the effect traits are synchronous and tests drive
//! them from one thread, so contention is not a concern.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use trellis_core::{
    AclEffectError, AclEffects, AclEntry, AclKind, AclSpec, AclTag, Identity, IdentityEffects,
    OwnershipEffects, Perms, Principal,
};

/// First uid handed out by [`MockEffects::with_users`]
pub const FIRST_MOCK_UID: u32 = 1000;

/// A mutation recorded by [`MockEffects`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    /// `write_acl`
    WriteAcl {
        /// Canonical target
        path: PathBuf,
        /// ACL written
        kind: AclKind,
    },
    /// `remove_default_acl`
    RemoveDefaultAcl {
        /// Canonical target
        path: PathBuf,
    },
    /// `set_owner`
    SetOwner {
        /// Canonical target
        path: PathBuf,
        /// New owner
        identity: Identity,
    },
}

impl MockOp {
    /// Canonical path the operation touched
    pub fn path(&self) -> &Path {
        match self {
            MockOp::WriteAcl { path, .. }
            | MockOp::RemoveDefaultAcl { path }
            | MockOp::SetOwner { path, .. } => path,
        }
    }
}

/// Stored ACLs keyed by canonical path and kind
pub type AclSnapshot = BTreeMap<(PathBuf, AclKind), Vec<AclEntry>>;

#[derive(Debug, Default)]
struct MockState {
    acls: AclSnapshot,
    owners: BTreeMap<PathBuf, Identity>,
    principals: BTreeMap<Principal, Identity>,
    current: Option<Principal>,
    refused: BTreeSet<PathBuf>,
    corrupt: BTreeSet<(PathBuf, AclKind)>,
    journal: Vec<MockOp>,
}

/// Mock effects for deterministic testing
#[derive(Debug, Clone, Default)]
pub struct MockEffects {
    state: Arc<Mutex<MockState>>,
}

impl MockEffects {
    /// Handlers with no users
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers knowing `names`, given uids (and matching gids) counting up
    /// from [`FIRST_MOCK_UID`]. The first name is the current principal.
    pub fn with_users<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for (offset, name) in (0u32..).zip(names) {
            let principal = Principal::new(name);
            let id = FIRST_MOCK_UID + offset;
            let mut state = mock.state();
            if state.current.is_none() {
                state.current = Some(principal.clone());
            }
            state.principals.insert(principal, Identity::new(id, id));
        }
        mock
    }

    /// Identity registered for `name`
    pub fn identity_of(&self, name: &str) -> Option<Identity> {
        self.state().principals.get(&Principal::new(name)).copied()
    }

    /// Refuse every mutation of `path`
    pub fn refuse(&self, path: impl AsRef<Path>) {
        let key = canonical_or_given(path.as_ref());
        self.state().refused.insert(key);
    }

    /// Report the `kind` ACL of `path` as unparsable
    pub fn corrupt(&self, path: impl AsRef<Path>, kind: AclKind) {
        let key = canonical_or_given(path.as_ref());
        self.state().corrupt.insert((key, kind));
    }

    /// Stored `kind` ACL of `path`, `None` if never written
    pub fn acl(&self, path: &Path, kind: AclKind) -> Option<Vec<AclEntry>> {
        let key = canonical_or_given(path);
        self.state().acls.get(&(key, kind)).cloned()
    }

    /// Edit a stored ACL in place, bypassing the journal, to simulate drift
    pub fn tamper(&self, path: &Path, kind: AclKind, edit: impl FnOnce(&mut Vec<AclEntry>)) {
        let key = canonical_or_given(path);
        let mut state = self.state();
        let entries = state.acls.entry((key, kind)).or_default();
        edit(entries);
    }

    /// Owner set on `path`, `None` if never changed
    pub fn owner_of(&self, path: &Path) -> Option<Identity> {
        let key = canonical_or_given(path);
        self.state().owners.get(&key).copied()
    }

    /// Copy of every stored ACL
    pub fn acl_snapshot(&self) -> AclSnapshot {
        self.state().acls.clone()
    }

    /// Mutations so far, oldest first
    pub fn journal(&self) -> Vec<MockOp> {
        self.state().journal.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Canonical key for a mutation, refusing marked paths
    fn writable_key(&self, path: &Path) -> Result<PathBuf, AclEffectError> {
        let key = path
            .canonicalize()
            .map_err(|e| AclEffectError::from_io(path, e))?;
        if self.state().refused.contains(&key) {
            return Err(AclEffectError::Refused {
                path: path.to_path_buf(),
                message: "Operation not permitted".to_string(),
            });
        }
        Ok(key)
    }
}

impl AclEffects for MockEffects {
    fn read_acl(&self, path: &Path, kind: AclKind) -> Result<Vec<AclEntry>, AclEffectError> {
        let key = path
            .canonicalize()
            .map_err(|e| AclEffectError::from_io(path, e))?;
        {
            let state = self.state();
            if state.corrupt.contains(&(key.clone(), kind)) {
                return Err(AclEffectError::Corrupt {
                    path: path.to_path_buf(),
                    reason: "unparsable entry 'user:alice:rwz'".to_string(),
                });
            }
            if let Some(entries) = state.acls.get(&(key.clone(), kind)) {
                return Ok(entries.clone());
            }
        }
        match kind {
            AclKind::Default => Ok(Vec::new()),
            AclKind::Access => {
                let mode = fs::metadata(&key)
                    .map_err(|e| AclEffectError::from_io(path, e))?
                    .permissions()
                    .mode();
                Ok(minimal_acl(mode))
            }
        }
    }

    fn write_acl(&self, path: &Path, kind: AclKind, spec: &AclSpec) -> Result<(), AclEffectError> {
        let key = self.writable_key(path)?;
        if kind == AclKind::Default && !key.is_dir() {
            return Err(AclEffectError::Refused {
                path: path.to_path_buf(),
                message: "Only directories can have default ACLs".to_string(),
            });
        }
        let mut state = self.state();
        state.acls.insert((key.clone(), kind), spec.entries());
        state.journal.push(MockOp::WriteAcl { path: key, kind });
        Ok(())
    }

    fn remove_default_acl(&self, path: &Path) -> Result<(), AclEffectError> {
        let key = self.writable_key(path)?;
        let mut state = self.state();
        state.acls.remove(&(key.clone(), AclKind::Default));
        state.journal.push(MockOp::RemoveDefaultAcl { path: key });
        Ok(())
    }
}

impl IdentityEffects for MockEffects {
    fn resolve(&self, principal: &Principal) -> Result<Option<Identity>, AclEffectError> {
        Ok(self.state().principals.get(principal).copied())
    }

    fn current_principal(&self) -> Result<Principal, AclEffectError> {
        self.state()
            .current
            .clone()
            .ok_or_else(|| AclEffectError::Lookup {
                message: "no current user configured".to_string(),
            })
    }
}

impl OwnershipEffects for MockEffects {
    fn set_owner(&self, path: &Path, identity: Identity) -> Result<(), AclEffectError> {
        let key = self.writable_key(path)?;
        let mut state = self.state();
        state.owners.insert(key.clone(), identity);
        state.journal.push(MockOp::SetOwner {
            path: key,
            identity,
        });
        Ok(())
    }
}

fn canonical_or_given(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Access ACL equivalent to plain mode bits
fn minimal_acl(mode: u32) -> Vec<AclEntry> {
    let triple = |shift: u32| Perms::from_bits(((mode >> shift) & 0o7) as u8).unwrap_or(Perms::NONE);
    vec![
        AclEntry::new(AclTag::UserObj, triple(6)),
        AclEntry::new(AclTag::GroupObj, triple(3)),
        AclEntry::new(AclTag::Other, triple(0)),
    ]
}
