//! Command handlers
//!
//! Each handler loads what it needs from the record store, checks the
//! caller's role, changes the assignment if asked to and hands the result to
//! the synchronizer. Nothing here prints; `main` renders the outcomes.

pub mod check;
pub mod project;
pub mod users;

use crate::store::RecordStore;
use crate::CliError;
use trellis_core::{
    ExecPolicy, Principal, ProjectEffects, ProjectId, Role, RoleAssignment, SyncSummary,
};
use trellis_sync::Synchronizer;

/// Everything a handler needs for one invocation
pub struct ProjectContext<'a, E: ProjectEffects + ?Sized> {
    effects: &'a E,
    store: RecordStore,
    policy: ExecPolicy,
    caller: Principal,
}

impl<'a, E: ProjectEffects + ?Sized> ProjectContext<'a, E> {
    pub fn new(effects: &'a E, store: RecordStore, policy: ExecPolicy, caller: Principal) -> Self {
        Self {
            effects,
            store,
            policy,
            caller,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn caller(&self) -> &Principal {
        &self.caller
    }

    fn synchronizer(&self) -> Synchronizer<'a, E> {
        Synchronizer::new(self.effects).with_policy(self.policy)
    }

    /// Reapply ownership and ACLs for `assignment`
    fn synchronize(&self, assignment: &RoleAssignment) -> Result<SyncSummary, CliError> {
        let layout = self.store.layout();
        let project = assignment.project();
        let summary = self.synchronizer().synchronize(
            &layout.project_dir(project),
            &layout.record_path(project),
            assignment,
        )?;
        Ok(summary)
    }

    /// Fail unless the caller holds one of `allowed`
    fn require(
        &self,
        assignment: &RoleAssignment,
        allowed: &[Role],
        who: &'static str,
        action: &'static str,
    ) -> Result<(), CliError> {
        match assignment.role_of(&self.caller) {
            Some(role) if allowed.contains(&role) => Ok(()),
            _ => Err(CliError::NotPermitted {
                allowed: who,
                action,
            }),
        }
    }

    fn load(&self, project: &ProjectId) -> Result<RoleAssignment, CliError> {
        self.store.load(project)
    }
}
