//! Drift checks over one or every project

use super::ProjectContext;
use crate::CliError;
use trellis_core::{DriftReport, ProjectEffects, ProjectId};

/// Audit result for one project
#[derive(Debug)]
pub struct CheckOutcome {
    pub project: ProjectId,
    pub result: Result<DriftReport, CliError>,
}

impl CheckOutcome {
    /// In sync and audited without error
    pub fn is_clean(&self) -> bool {
        matches!(&self.result, Ok(report) if report.is_in_sync())
    }
}

impl<E: ProjectEffects + ?Sized> ProjectContext<'_, E> {
    /// Audit `project`, or every project when `None`.
    ///
    /// Read-only and open to any caller. Projects are audited independently;
    /// one that cannot be read does not stop the rest.
    pub fn check(&self, project: Option<&ProjectId>) -> Result<Vec<CheckOutcome>, CliError> {
        let projects = match project {
            Some(project) => vec![project.clone()],
            None => self.store().list()?,
        };
        Ok(projects
            .into_iter()
            .map(|project| {
                let result = self.audit_one(&project);
                CheckOutcome { project, result }
            })
            .collect())
    }

    fn audit_one(&self, project: &ProjectId) -> Result<DriftReport, CliError> {
        let assignment = self.load(project)?;
        let layout = self.store().layout();
        let report = self.synchronizer().audit(
            &layout.project_dir(project),
            &layout.record_path(project),
            &assignment,
        )?;
        Ok(report)
    }
}
