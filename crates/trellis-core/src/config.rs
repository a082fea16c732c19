//! Configuration for Trellis
//!
//! Precedence, lowest first: built-in defaults, the TOML file, the
//! `PROJECT_ROOT` environment variable, then whatever the caller (the CLI)
//! overrides explicitly. The result is a plain value passed into each call.

use crate::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the project root
pub const ENV_PROJECT_ROOT: &str = "PROJECT_ROOT";

/// Default configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/trellis/config.toml";

/// Default project root
pub const DEFAULT_PROJECT_ROOT: &str = "/srv/projects";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File exists but cannot be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// File is not valid TOML for [`TrellisConfig`]
    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        /// Config file
        path: PathBuf,
        /// Parse failure
        source: toml::de::Error,
    },

    /// A value is unusable
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What is wrong
        message: String,
    },
}

/// How the execute bit is granted on plain files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecPolicy {
    /// Apply the tree spec as built: every rule keeps traverse/execute
    #[default]
    AlwaysTraverse,
    /// Strip execute from files whose mode has no owner-execute bit.
    /// Directories always keep traverse.
    PreserveFileMode,
}

/// Trellis configuration file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrellisConfig {
    /// Directory holding every project directory and role record
    pub project_root: PathBuf,
    /// Select [`ExecPolicy::PreserveFileMode`]
    pub preserve_exec_bits: bool,
    /// Explicit `setfacl` binary instead of a `PATH` lookup
    pub setfacl: Option<PathBuf>,
    /// Explicit `getfacl` binary instead of a `PATH` lookup
    pub getfacl: Option<PathBuf>,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from(DEFAULT_PROJECT_ROOT),
            preserve_exec_bits: false,
            setfacl: None,
            getfacl: None,
        }
    }
}

impl TrellisConfig {
    /// Parse a configuration file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (if present) merged with the environment, validated
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.merge_with_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `PROJECT_ROOT` from the process environment
    pub fn merge_with_env(&mut self) {
        self.merge_with_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn merge_with_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(ENV_PROJECT_ROOT).filter(|v| !v.is_empty()) {
            self.project_root = PathBuf::from(root);
        }
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "project_root cannot be empty".to_string(),
            });
        }
        if self.project_root.is_relative() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "project_root must be absolute (got {})",
                    self.project_root.display()
                ),
            });
        }
        Ok(())
    }

    /// Execute-bit policy selected by `preserve_exec_bits`
    pub fn exec_policy(&self) -> ExecPolicy {
        if self.preserve_exec_bits {
            ExecPolicy::PreserveFileMode
        } else {
            ExecPolicy::AlwaysTraverse
        }
    }

    /// Path layout for the configured root
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.project_root.clone())
    }
}

/// Where a project's directory and role record live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding all projects
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<project>`
    pub fn project_dir(&self, project: &ProjectId) -> PathBuf {
        self.root.join(project.as_str())
    }

    /// `<root>/.<project>.toml`
    pub fn record_path(&self, project: &ProjectId) -> PathBuf {
        self.root.join(format!(".{project}.toml"))
    }
}
