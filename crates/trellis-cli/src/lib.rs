//! Trellis CLI Library
//!
//! Everything behind the `project` binary except argument parsing and
//! logging setup: the on-disk role record store and one handler per
//! command. Handlers are generic over the effect traits so tests drive them
//! with in-memory handlers.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

pub mod commands;
pub mod store;

pub use commands::ProjectContext;
pub use store::{RecordStore, RoleRecord};

use std::io;
use std::path::PathBuf;
use trellis_core::{AclEffectError, Principal, RoleError, SyncError};

/// CLI error types
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Project directory '{}' already exists", .path.display())]
    ProjectExists { path: PathBuf },

    #[error("Project config '{}' already exists", .path.display())]
    RecordExists { path: PathBuf },

    #[error("Project directory '{}' does not exist", .path.display())]
    MissingProject { path: PathBuf },

    #[error("Project config '{}' does not exist", .path.display())]
    MissingRecord { path: PathBuf },

    #[error("Only {allowed} can {action}")]
    NotPermitted {
        allowed: &'static str,
        action: &'static str,
    },

    #[error("User {principal} is not a valid user")]
    UnknownUser { principal: Principal },

    #[error("Invalid project config {}: {source}", .path.display())]
    RecordParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid project config {}: {source}", .path.display())]
    RecordInvalid { path: PathBuf, source: RoleError },

    #[error("Cannot encode project config: {0}")]
    RecordEncode(#[from] toml::ser::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Effects(#[from] AclEffectError),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
