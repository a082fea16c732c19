//! One synchronize run for one project
//!
//! Order matters: everything that can fail fatally (symlink checks, principal
//! resolution, rule construction, resolving the boundary) happens before the
//! first change on disk. Ownership is set next, then the tree walk, then the
//! role record's own ACL. A path whose chown is refused is recorded as failed
//! and keeps its current ACL.

use crate::applier::apply_tree;
use crate::audit::audit;
use crate::builder::ProjectSpecs;
use crate::containment::ContainmentBoundary;
use crate::ownership::chown_to_owner;
use crate::walker::ensure_not_symlink;
use std::path::Path;
use tracing::{info, warn};
use trellis_core::{
    AclKind, ApplyOp, DriftReport, ExecPolicy, ProjectEffects, RoleAssignment, SyncError,
    SyncResult, SyncSummary,
};

/// Brings a project's ownership and ACLs in line with its role assignment
pub struct Synchronizer<'a, E: ProjectEffects + ?Sized> {
    effects: &'a E,
    policy: ExecPolicy,
}

impl<'a, E: ProjectEffects + ?Sized> Synchronizer<'a, E> {
    /// Synchronizer using the default [`ExecPolicy`]
    pub fn new(effects: &'a E) -> Self {
        Self {
            effects,
            policy: ExecPolicy::default(),
        }
    }

    /// Select how plain files are granted execute
    pub fn with_policy(mut self, policy: ExecPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reapply ownership and ACLs to `root` and `record_path`.
    ///
    /// Idempotent: a second run with the same assignment writes the same
    /// rules. Returns [`SyncError::Incomplete`] if any entry was refused;
    /// entries skipped for escaping the root do not fail the run.
    pub fn synchronize(
        &self,
        root: &Path,
        record_path: &Path,
        assignment: &RoleAssignment,
    ) -> SyncResult<SyncSummary> {
        ensure_not_symlink(root)?;
        ensure_not_symlink(record_path)?;
        let specs = ProjectSpecs::derive(self.effects, assignment)?;
        let boundary = ContainmentBoundary::new(root)
            .map_err(|e| SyncError::apply(root, ApplyOp::Inspect, e))?;

        let refused = match chown_to_owner(self.effects, root, record_path, assignment.owner()) {
            Ok(()) => Vec::new(),
            Err(SyncError::Incomplete { summary }) => summary.failures,
            Err(err) => return Err(err),
        };
        let chown_refused = |path: &Path| {
            refused
                .iter()
                .any(|err| matches!(err, SyncError::Apply { path: p, .. } if p == path))
        };
        let hold = chown_refused(root).then(|| boundary.root());

        let mut summary = apply_tree(
            self.effects,
            root,
            &specs.tree,
            &boundary,
            self.policy,
            hold,
        )?;

        summary.visited += 1;
        if !chown_refused(record_path) {
            match self
                .effects
                .write_acl(record_path, AclKind::Access, &specs.record)
            {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    let err = SyncError::apply(record_path, ApplyOp::SetAcl(AclKind::Access), e);
                    warn!("{err}");
                    summary.failures.push(err);
                }
            }
        }
        summary.failures.splice(0..0, refused);

        info!(
            project = %assignment.project(),
            owner = %assignment.owner(),
            public = assignment.is_public(),
            updated = summary.updated,
            failed = summary.failures.len(),
            "Synchronized project"
        );
        summary.into_result()
    }

    /// Read-only drift check of `root` and `record_path`
    pub fn audit(
        &self,
        root: &Path,
        record_path: &Path,
        assignment: &RoleAssignment,
    ) -> SyncResult<DriftReport> {
        audit(self.effects, root, record_path, assignment)
    }
}
