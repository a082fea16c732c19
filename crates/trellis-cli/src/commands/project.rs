//! Project lifecycle: list, create, delete, info, update

use super::ProjectContext;
use crate::CliError;
use std::fs;
use tracing::info;
use trellis_core::{ProjectEffects, ProjectId, Role, RoleAssignment, SyncSummary};

impl<E: ProjectEffects + ?Sized> ProjectContext<'_, E> {
    /// Every project under the root
    pub fn list(&self) -> Result<Vec<ProjectId>, CliError> {
        self.store().list()
    }

    /// Create `project` owned by the caller and synchronize it
    pub fn create(&self, project: &ProjectId, public: bool) -> Result<SyncSummary, CliError> {
        let layout = self.store().layout();
        let dir = layout.project_dir(project);
        if dir.exists() {
            return Err(CliError::ProjectExists { path: dir });
        }
        let record = layout.record_path(project);
        if record.exists() {
            return Err(CliError::RecordExists { path: record });
        }

        fs::create_dir(&dir).map_err(|e| CliError::io(&dir, e))?;
        let assignment = RoleAssignment::new(project.clone(), self.caller().clone(), public);
        self.store().save(&assignment)?;
        info!(project = %project, owner = %self.caller(), public, "Created project");
        self.synchronize(&assignment)
    }

    /// Remove the project tree and record; owner only
    pub fn delete(&self, project: &ProjectId) -> Result<(), CliError> {
        let assignment = self.load(project)?;
        self.require(
            &assignment,
            &[Role::Owner],
            "the project owner",
            "delete a project",
        )?;
        self.store().remove(project)?;
        info!(project = %project, "Deleted project");
        Ok(())
    }

    /// Current assignment of `project`
    pub fn info(&self, project: &ProjectId) -> Result<RoleAssignment, CliError> {
        self.load(project)
    }

    /// Reapply the stored assignment; any role holder may
    pub fn update(&self, project: &ProjectId) -> Result<SyncSummary, CliError> {
        let assignment = self.load(project)?;
        self.require(
            &assignment,
            &Role::ALL,
            "a project member",
            "update the project's permissions",
        )?;
        self.synchronize(&assignment)
    }
}
