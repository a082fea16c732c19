//! Error taxonomy for Trellis
//!
//! Fatal errors (`Construction`, `PrincipalResolution`, `SymlinkRoot`) are
//! raised before anything on disk changes. Per-entry errors (`Containment`,
//! `Apply`) are collected into a [`SyncSummary`] while a walk continues; a
//! run that collected apply failures ends in [`SyncError::Incomplete`].

use crate::acl::AclKind;
use crate::principal::Principal;
use crate::reports::SyncSummary;
use crate::roles::Role;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem operation that failed on one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOp {
    /// Reading metadata or resolving the entry
    Inspect,
    /// Listing a directory
    ReadDir,
    /// Changing ownership
    SetOwner,
    /// Removing a directory's default ACL
    RemoveDefaultAcl,
    /// Writing an ACL
    SetAcl(AclKind),
}

impl fmt::Display for ApplyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOp::Inspect => f.write_str("inspect entry"),
            ApplyOp::ReadDir => f.write_str("read directory"),
            ApplyOp::SetOwner => f.write_str("set owner"),
            ApplyOp::RemoveDefaultAcl => f.write_str("reset default ACL"),
            ApplyOp::SetAcl(kind) => write!(f, "set {kind} ACL"),
        }
    }
}

/// Synchronization and audit errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Rule set is invalid or inconsistent
    #[error("Error generating ACL: {reason}")]
    Construction {
        /// What is inconsistent
        reason: String,
    },

    /// A principal has no system identity
    #[error("User {principal} is not a valid user")]
    PrincipalResolution {
        /// Unresolvable principal
        principal: Principal,
    },

    /// The root to synchronize is itself a symbolic link
    #[error("{} is a symbolic link; cannot update ACL", .path.display())]
    SymlinkRoot {
        /// Offending path
        path: PathBuf,
    },

    /// Entry resolves outside the containment boundary
    #[error(
        "{} is actually {}, which is outside {}",
        .path.display(),
        .resolved.display(),
        .boundary.display()
    )]
    Containment {
        /// Entry as walked
        path: PathBuf,
        /// Where it resolves to
        resolved: PathBuf,
        /// Boundary it escapes
        boundary: PathBuf,
    },

    /// The operating system refused a change on one entry
    #[error("Cannot {operation} on {}: {reason}", .path.display())]
    Apply {
        /// Entry
        path: PathBuf,
        /// What was attempted
        operation: ApplyOp,
        /// Reason reported by the OS
        reason: String,
    },

    /// A run finished but some entries could not be updated
    #[error(
        "Updated {} of {} entries under {}; {} failed",
        .summary.updated,
        .summary.visited,
        .summary.root.display(),
        .summary.failures.len()
    )]
    Incomplete {
        /// Everything the run recorded
        summary: Box<SyncSummary>,
    },

    /// A read-only ACL query failed during an audit
    #[error("Cannot inspect ACL of {}: {reason}", .path.display())]
    Inspect {
        /// Entry
        path: PathBuf,
        /// Reason reported by the OS
        reason: String,
    },
}

impl SyncError {
    /// Create a construction error
    pub fn construction(reason: impl Into<String>) -> Self {
        Self::Construction {
            reason: reason.into(),
        }
    }

    /// Create a per-entry apply error
    pub fn apply(path: impl AsRef<Path>, operation: ApplyOp, reason: impl fmt::Display) -> Self {
        Self::Apply {
            path: path.as_ref().to_path_buf(),
            operation,
            reason: reason.to_string(),
        }
    }

    /// Whether the error was raised before any mutation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Construction { .. }
                | SyncError::PrincipalResolution { .. }
                | SyncError::SymlinkRoot { .. }
        )
    }
}

/// Standard result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors reported by ACL, identity and ownership handlers
#[derive(Debug, thiserror::Error)]
pub enum AclEffectError {
    /// Path does not exist
    #[error("{} does not exist", .path.display())]
    NotFound {
        /// Missing path
        path: PathBuf,
    },

    /// The OS refused the operation (permissions, read-only filesystem, no ACL support)
    #[error("{}: {message}", .path.display())]
    Refused {
        /// Target path
        path: PathBuf,
        /// OS message
        message: String,
    },

    /// ACL exists but cannot be parsed
    #[error("corrupt ACL on {}: {reason}", .path.display())]
    Corrupt {
        /// Target path
        path: PathBuf,
        /// Parse failure
        reason: String,
    },

    /// The ACL facility is not available at all
    #[error("ACL facility unavailable: {message}")]
    Unsupported {
        /// What is missing
        message: String,
    },

    /// User database lookup failed
    #[error("identity lookup failed: {message}")]
    Lookup {
        /// Lookup failure
        message: String,
    },

    /// Any other I/O failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl AclEffectError {
    /// Classify an I/O error for `path`
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::Refused {
                path,
                message: err.to_string(),
            },
            _ => Self::Io { path, source: err },
        }
    }
}

/// Refusals of a role assignment change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    /// Principal is already the owner
    #[error("{principal} is already the project owner")]
    AlreadyOwner {
        /// Principal
        principal: Principal,
    },

    /// Owner would lose ownership without a successor
    #[error("Can't remove permissions from owner {principal}. Set a new owner first")]
    OwnerDemotion {
        /// Owner
        principal: Principal,
    },

    /// Owner cannot be removed
    #[error("Can't delete owner {principal}. Set a new owner first")]
    OwnerRemoval {
        /// Owner
        principal: Principal,
    },

    /// Principal already holds the requested role
    #[error("{principal} is already a {role}")]
    AlreadyHasRole {
        /// Principal
        principal: Principal,
        /// Role it holds
        role: Role,
    },

    /// Principal holds no role to revoke
    #[error("{principal} has no role in this project")]
    NoRole {
        /// Principal
        principal: Principal,
    },

    /// Stored assignment lists a principal under two roles
    #[error("{principal} is listed as both {existing} and {requested}")]
    Overlap {
        /// Principal
        principal: Principal,
        /// Role seen first
        existing: Role,
        /// Conflicting role
        requested: Role,
    },

    /// Role name not recognized
    #[error("unknown role '{name}' (expected owner, member or collaborator)")]
    UnknownRole {
        /// Given name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn io_errors_are_classified() {
        let err = AclEffectError::from_io("/x", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_matches!(err, AclEffectError::NotFound { .. });
        let err = AclEffectError::from_io(
            "/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert_matches!(err, AclEffectError::Refused { .. });
    }

    #[test]
    fn fatal_errors_name_the_offender() {
        let err = SyncError::PrincipalResolution {
            principal: "mallory".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "User mallory is not a valid user");

        let err = SyncError::apply("/p/x", ApplyOp::SetAcl(AclKind::Default), "EPERM");
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Cannot set default ACL on /p/x: EPERM");
    }
}
