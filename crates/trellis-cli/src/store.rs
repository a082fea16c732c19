//! Role records on disk
//!
//! Each project `<root>/<id>` has a hidden TOML record `<root>/.<id>.toml`
//! naming its owner, members, collaborators and public flag. The project id
//! comes from the file name, not the contents.
//!
//! Records are rewritten in place rather than replaced, so the owner-only
//! ACL and ownership set on the file survive a save.

use crate::CliError;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;
use trellis_core::{Principal, ProjectId, ProjectLayout, RoleAssignment};

/// Serialized form of a [`RoleAssignment`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleRecord {
    pub owner: Principal,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub members: Vec<Principal>,
    #[serde(default)]
    pub collaborators: Vec<Principal>,
}

impl From<&RoleAssignment> for RoleRecord {
    fn from(assignment: &RoleAssignment) -> Self {
        Self {
            owner: assignment.owner().clone(),
            public: assignment.is_public(),
            members: assignment.members().cloned().collect(),
            collaborators: assignment.collaborators().cloned().collect(),
        }
    }
}

/// Loads and saves role records under a project root
#[derive(Debug, Clone)]
pub struct RecordStore {
    layout: ProjectLayout,
}

impl RecordStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Fail unless both the project directory and its record exist
    pub fn ensure_exists(&self, project: &ProjectId) -> Result<(), CliError> {
        let dir = self.layout.project_dir(project);
        if !dir.is_dir() {
            return Err(CliError::MissingProject { path: dir });
        }
        let record = self.layout.record_path(project);
        if !record.is_file() {
            return Err(CliError::MissingRecord { path: record });
        }
        Ok(())
    }

    pub fn load(&self, project: &ProjectId) -> Result<RoleAssignment, CliError> {
        self.ensure_exists(project)?;
        let path = self.layout.record_path(project);
        let content = fs::read_to_string(&path).map_err(|e| CliError::io(&path, e))?;
        let record: RoleRecord = toml::from_str(&content).map_err(|source| CliError::RecordParse {
            path: path.clone(),
            source,
        })?;
        RoleAssignment::from_parts(
            project.clone(),
            record.owner,
            record.members,
            record.collaborators,
            record.public,
        )
        .map_err(|source| CliError::RecordInvalid { path, source })
    }

    pub fn save(&self, assignment: &RoleAssignment) -> Result<(), CliError> {
        let path = self.layout.record_path(assignment.project());
        let content = toml::to_string(&RoleRecord::from(assignment))?;
        fs::write(&path, content).map_err(|e| CliError::io(&path, e))?;
        debug!(path = %path.display(), "Saved project config");
        Ok(())
    }

    /// Projects that have both a directory and a record, sorted by name
    pub fn list(&self) -> Result<Vec<ProjectId>, CliError> {
        let root = self.layout.root();
        let entries = fs::read_dir(root).map_err(|e| CliError::io(root, e))?;
        let mut projects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CliError::io(root, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Ok(project) = ProjectId::new(name) else {
                continue;
            };
            if self.layout.project_dir(&project).is_dir()
                && self.layout.record_path(&project).is_file()
            {
                projects.push(project);
            }
        }
        projects.sort();
        Ok(projects)
    }

    /// Delete the project tree and its record
    pub fn remove(&self, project: &ProjectId) -> Result<(), CliError> {
        let dir = self.layout.project_dir(project);
        fs::remove_dir_all(&dir).map_err(|e| CliError::io(&dir, e))?;
        let record = self.layout.record_path(project);
        fs::remove_file(&record).map_err(|e| CliError::io(&record, e))?;
        Ok(())
    }
}
