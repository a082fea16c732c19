//! Depth-first traversal of a project tree
//!
//! The walk never follows symbolic links into subtrees. A link that resolves
//! inside the boundary is handed to the visitor classified by its target;
//! one that resolves outside is recorded as skipped and left alone.
//! Entries that cannot be listed or resolved are recorded as failures and
//! the walk moves on.

use crate::containment::{Containment, ContainmentBoundary};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trellis_core::{ApplyOp, SyncError, SyncResult, SyncSummary};
use walkdir::WalkDir;

/// Directory or anything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Gets both access and default ACLs
    Directory,
    /// Gets an access ACL only
    Leaf,
}

/// One contained entry reached by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    /// Path as walked
    pub path: PathBuf,
    /// Canonical path, inside the boundary
    pub resolved: PathBuf,
    /// Classification of the resolved entry
    pub kind: EntryKind,
    /// Permission bits of the resolved entry
    pub mode: u32,
    /// Entry is a symbolic link
    pub via_link: bool,
}

impl FsEntry {
    /// Owner-execute bit is set
    pub fn is_executable(&self) -> bool {
        self.mode & 0o100 != 0
    }
}

/// What a visitor did with an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Entry was brought up to date
    Updated,
    /// Entry was deliberately left as it is
    Left,
}

/// Receives every contained entry
pub trait EntryVisitor {
    /// Handle one entry; an error is recorded against it and the walk continues
    fn visit(&mut self, entry: &FsEntry) -> SyncResult<Visit>;
}

/// Fail with [`SyncError::SymlinkRoot`] if `path` is itself a symbolic link
pub fn ensure_not_symlink(path: &Path) -> SyncResult<()> {
    let metadata =
        fs::symlink_metadata(path).map_err(|e| SyncError::apply(path, ApplyOp::Inspect, e))?;
    if metadata.file_type().is_symlink() {
        return Err(SyncError::SymlinkRoot {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Walks `root` checking every entry against a fixed boundary
#[derive(Debug)]
pub struct TreeWalker<'a> {
    root: &'a Path,
    boundary: &'a ContainmentBoundary,
}

impl<'a> TreeWalker<'a> {
    /// Walker for `root`, usually the boundary's own root
    pub fn new(root: &'a Path, boundary: &'a ContainmentBoundary) -> Self {
        Self { root, boundary }
    }

    /// Visit the root and every descendant, parents before children.
    ///
    /// Only a symbolic-link root is fatal; everything else ends up in the
    /// returned summary.
    pub fn walk<V: EntryVisitor + ?Sized>(&self, visitor: &mut V) -> SyncResult<SyncSummary> {
        ensure_not_symlink(self.root)?;

        let mut summary = SyncSummary::new(self.root);
        let mut entries = WalkDir::new(self.root).follow_links(false).into_iter();
        // A directory that cannot be listed is yielded first, then its error
        let mut last_dir: Option<PathBuf> = None;

        while let Some(next) = entries.next() {
            let dir_entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.to_path_buf());
                    warn!(path = %path.display(), error = %err, "Cannot read directory");
                    if last_dir.as_deref() != Some(path.as_path()) {
                        summary.visited += 1;
                    }
                    summary
                        .failures
                        .push(SyncError::apply(path, ApplyOp::ReadDir, err));
                    continue;
                }
            };
            summary.visited += 1;
            let path = dir_entry.path();
            let is_real_dir = dir_entry.file_type().is_dir();
            last_dir = is_real_dir.then(|| path.to_path_buf());

            let resolved = match self.boundary.resolve(path) {
                Ok(Containment::Inside(resolved)) => resolved,
                Ok(Containment::Outside(resolved)) => {
                    let err = SyncError::Containment {
                        path: path.to_path_buf(),
                        resolved,
                        boundary: self.boundary.root().to_path_buf(),
                    };
                    warn!("{err}");
                    summary.skipped.push(err);
                    if is_real_dir {
                        entries.skip_current_dir();
                    }
                    continue;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Cannot resolve entry");
                    summary
                        .failures
                        .push(SyncError::apply(path, ApplyOp::Inspect, err));
                    if is_real_dir {
                        entries.skip_current_dir();
                    }
                    continue;
                }
            };

            let entry = match classify(path, resolved, dir_entry.path_is_symlink()) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("{err}");
                    summary.failures.push(err);
                    continue;
                }
            };

            match visitor.visit(&entry) {
                Ok(Visit::Updated) => {
                    debug!(path = %entry.path.display(), kind = ?entry.kind, "Updated entry");
                    summary.updated += 1;
                }
                Ok(Visit::Left) => {
                    debug!(path = %entry.path.display(), "Left entry unchanged");
                }
                Err(err) => {
                    warn!("{err}");
                    summary.failures.push(err);
                }
            }
        }

        Ok(summary)
    }
}

/// Classify by the resolved entry so in-boundary links behave like their targets
fn classify(path: &Path, resolved: PathBuf, via_link: bool) -> SyncResult<FsEntry> {
    let metadata =
        fs::metadata(&resolved).map_err(|e| SyncError::apply(path, ApplyOp::Inspect, e))?;
    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Leaf
    };
    Ok(FsEntry {
        path: path.to_path_buf(),
        resolved,
        kind,
        mode: metadata.permissions().mode() & 0o7777,
        via_link,
    })
}
