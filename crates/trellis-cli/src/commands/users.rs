//! Role changes: adduser / moduser and deluser

use super::ProjectContext;
use crate::CliError;
use tracing::info;
use trellis_core::{Principal, ProjectEffects, ProjectId, Role, SyncSummary};

const MANAGERS: [Role; 2] = [Role::Owner, Role::Member];

impl<E: ProjectEffects + ?Sized> ProjectContext<'_, E> {
    /// Give `user` `role` in `project`, moving it out of any other role.
    ///
    /// The user must exist. Granting [`Role::Owner`] hands the project over;
    /// the previous owner keeps no role.
    pub fn set_role(
        &self,
        project: &ProjectId,
        user: &Principal,
        role: Role,
    ) -> Result<SyncSummary, CliError> {
        let mut assignment = self.load(project)?;
        if self.effects.resolve(user)?.is_none() {
            return Err(CliError::UnknownUser {
                principal: user.clone(),
            });
        }
        self.require(
            &assignment,
            &MANAGERS,
            "a project owner/member",
            "add/modify users",
        )?;
        assignment.grant(user.clone(), role)?;
        self.store().save(&assignment)?;
        info!(project = %project, user = %user, %role, "Changed role");
        self.synchronize(&assignment)
    }

    /// Take every role from `user`. The owner cannot be removed.
    pub fn remove_user(
        &self,
        project: &ProjectId,
        user: &Principal,
    ) -> Result<SyncSummary, CliError> {
        let mut assignment = self.load(project)?;
        self.require(
            &assignment,
            &MANAGERS,
            "a project owner/member",
            "delete users",
        )?;
        let previous = assignment.revoke(user)?;
        self.store().save(&assignment)?;
        info!(project = %project, user = %user, role = %previous, "Removed user");
        self.synchronize(&assignment)
    }
}
