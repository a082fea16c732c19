//! Path-safe project identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum identifier length in bytes (a single path component)
pub const MAX_PROJECT_ID_LEN: usize = 255;

/// Reasons a string cannot name a project
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectIdError {
    /// Empty identifier
    #[error("project name cannot be empty")]
    Empty,
    /// Longer than one path component may be
    #[error("project name too long ({len} bytes, max {MAX_PROJECT_ID_LEN})")]
    TooLong {
        /// Actual length
        len: usize,
    },
    /// Contains a character that would change the path it maps to
    #[error("project name '{name}' contains invalid characters")]
    InvalidCharacters {
        /// Rejected name
        name: String,
    },
    /// Starts with a dot (reserved for role records)
    #[error("project name '{name}' cannot start with '.'")]
    Hidden {
        /// Rejected name
        name: String,
    },
}

/// Identifier of a project: one path component under the project root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Validate and wrap a project name
    pub fn new(name: impl Into<String>) -> Result<Self, ProjectIdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProjectIdError::Empty);
        }
        if name.len() > MAX_PROJECT_ID_LEN {
            return Err(ProjectIdError::TooLong { len: name.len() });
        }
        if name.contains('/') || name.contains('\0') {
            return Err(ProjectIdError::InvalidCharacters { name });
        }
        if name.starts_with('.') {
            return Err(ProjectIdError::Hidden { name });
        }
        Ok(Self(name))
    }

    /// The project name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = ProjectIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ProjectId {
    type Err = ProjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
