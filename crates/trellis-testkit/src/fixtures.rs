//! Project trees on disk for tests
//!
//! A fixture is a temporary project root holding one project directory and
//! its (empty) role record, laid out by [`ProjectLayout`], plus a sibling
//! directory outside the root for links that should escape.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trellis_core::{Principal, ProjectId, ProjectLayout, Role, RoleAssignment, RoleError};

/// A throwaway project root with one project
#[derive(Debug)]
pub struct ProjectFixture {
    _root: TempDir,
    _outside: TempDir,
    layout: ProjectLayout,
    project: ProjectId,
    outside: PathBuf,
}

impl ProjectFixture {
    /// Create the project directory and an empty role record for `name`
    pub fn new(name: &str) -> io::Result<Self> {
        let project =
            ProjectId::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let root = tempfile::tempdir()?;
        let outside = tempfile::tempdir()?;
        let layout = ProjectLayout::new(root.path().canonicalize()?);
        fs::create_dir(layout.project_dir(&project))?;
        fs::write(layout.record_path(&project), b"")?;
        let outside_path = outside.path().canonicalize()?;
        Ok(Self {
            _root: root,
            _outside: outside,
            layout,
            project,
            outside: outside_path,
        })
    }

    /// Layout of the temporary project root
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Project directory
    pub fn dir(&self) -> PathBuf {
        self.layout.project_dir(&self.project)
    }

    /// Role record
    pub fn record(&self) -> PathBuf {
        self.layout.record_path(&self.project)
    }

    /// Directory outside the project root
    pub fn outside(&self) -> &Path {
        &self.outside
    }

    /// `dir()/rel`
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir().join(rel)
    }

    /// Create directory `rel` (and parents) inside the project
    pub fn mkdir(&self, rel: &str) -> io::Result<PathBuf> {
        let path = self.path(rel);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Create file `rel` with `contents`, creating parents
    pub fn write(&self, rel: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Create file `rel` under the outside directory
    pub fn write_outside(&self, rel: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.outside.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Create symbolic link `rel` inside the project pointing at `target`
    pub fn symlink(&self, rel: &str, target: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.path(rel);
        symlink(target, &path)?;
        Ok(path)
    }

    /// Assignment for this project from plain names.
    ///
    /// Grants are applied in order, members first, so a name listed twice or
    /// the owner listed again fails with the grant's [`RoleError`].
    pub fn assignment(
        &self,
        owner: &str,
        members: &[&str],
        collaborators: &[&str],
        public: bool,
    ) -> Result<RoleAssignment, RoleError> {
        let mut assignment =
            RoleAssignment::new(self.project.clone(), Principal::from(owner), public);
        let grants = members
            .iter()
            .map(|m| (*m, Role::Member))
            .chain(collaborators.iter().map(|c| (*c, Role::Collaborator)));
        for (name, role) in grants {
            assignment.grant(Principal::from(name), role)?;
        }
        Ok(assignment)
    }
}
