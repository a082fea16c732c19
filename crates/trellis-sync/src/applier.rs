//! Writing the tree spec to every contained entry

use crate::containment::ContainmentBoundary;
use crate::walker::{EntryKind, EntryVisitor, FsEntry, TreeWalker, Visit};
use std::path::{Path, PathBuf};
use tracing::info;
use trellis_core::{
    AclEffects, AclKind, AclSpec, ApplyOp, ExecPolicy, SyncError, SyncResult, SyncSummary,
};

/// Applies one spec to each entry a [`TreeWalker`] hands it.
///
/// Directories have their default ACL cleared, then get the ACL spec as both
/// default and access ACL. Everything else gets the access ACL only.
pub struct AclApplier<'a, E: AclEffects + ?Sized> {
    effects: &'a E,
    spec: &'a AclSpec,
    plain_file_spec: Option<AclSpec>,
    held: Option<PathBuf>,
}

impl<'a, E: AclEffects + ?Sized> AclApplier<'a, E> {
    /// Applier writing `spec` under `policy`
    pub fn new(effects: &'a E, spec: &'a AclSpec, policy: ExecPolicy) -> Self {
        let plain_file_spec = match policy {
            ExecPolicy::AlwaysTraverse => None,
            ExecPolicy::PreserveFileMode => Some(spec.without_execute()),
        };
        Self {
            effects,
            spec,
            plain_file_spec,
            held: None,
        }
    }

    /// Leave the entry resolving to `path` untouched
    pub fn holding(mut self, path: Option<&Path>) -> Self {
        self.held = path.map(Path::to_path_buf);
        self
    }

    /// Spec written to `entry`
    pub fn spec_for(&self, entry: &FsEntry) -> &AclSpec {
        match (&self.plain_file_spec, entry.kind) {
            (Some(stripped), EntryKind::Leaf) if !entry.is_executable() => stripped,
            _ => self.spec,
        }
    }

    /// Update one entry; stops at the first refused operation
    pub fn apply_entry(&self, entry: &FsEntry) -> SyncResult<()> {
        let target = entry.resolved.as_path();
        let spec = self.spec_for(entry);
        if entry.kind == EntryKind::Directory {
            self.effects
                .remove_default_acl(target)
                .map_err(|e| SyncError::apply(&entry.path, ApplyOp::RemoveDefaultAcl, e))?;
            self.write(entry, AclKind::Default, spec)?;
        }
        self.write(entry, AclKind::Access, spec)
    }

    fn write(&self, entry: &FsEntry, kind: AclKind, spec: &AclSpec) -> SyncResult<()> {
        self.effects
            .write_acl(&entry.resolved, kind, spec)
            .map_err(|e| SyncError::apply(&entry.path, ApplyOp::SetAcl(kind), e))
    }
}

impl<E: AclEffects + ?Sized> EntryVisitor for AclApplier<'_, E> {
    fn visit(&mut self, entry: &FsEntry) -> SyncResult<Visit> {
        if self.held.as_deref() == Some(entry.resolved.as_path()) {
            return Ok(Visit::Left);
        }
        self.apply_entry(entry)?;
        Ok(Visit::Updated)
    }
}

/// Walk `root` and write `spec` to every contained entry.
///
/// Returns the summary when every entry was updated (escaping links are
/// skipped, not failed), [`SyncError::Incomplete`] carrying the same summary
/// when any entry was refused.
pub fn apply_recursively<E>(
    effects: &E,
    root: &Path,
    spec: &AclSpec,
    boundary: &ContainmentBoundary,
    policy: ExecPolicy,
) -> SyncResult<SyncSummary>
where
    E: AclEffects + ?Sized,
{
    apply_tree(effects, root, spec, boundary, policy, None)?.into_result()
}

/// Walk and apply, leaving failures inside the summary. The entry resolving
/// to `hold` is visited but not written.
pub(crate) fn apply_tree<E>(
    effects: &E,
    root: &Path,
    spec: &AclSpec,
    boundary: &ContainmentBoundary,
    policy: ExecPolicy,
    hold: Option<&Path>,
) -> SyncResult<SyncSummary>
where
    E: AclEffects + ?Sized,
{
    let mut applier = AclApplier::new(effects, spec, policy).holding(hold);
    let summary = TreeWalker::new(root, boundary).walk(&mut applier)?;
    info!(
        root = %root.display(),
        visited = summary.visited,
        updated = summary.updated,
        skipped = summary.skipped.len(),
        failed = summary.failures.len(),
        "Applied project ACL"
    );
    Ok(summary)
}
