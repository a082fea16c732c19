//! Principals and the system identities they resolve to

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named system actor that can be granted ACL rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a principal from a user name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The user name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name can appear in ACL text without escaping.
    ///
    /// The text form uses `:` and `,` as separators and one entry per line.
    pub fn is_acl_safe(&self) -> bool {
        !self.0.is_empty()
            && !self
                .0
                .chars()
                .any(|c| c == ':' || c == ',' || c == '#' || c.is_whitespace() || c.is_control())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Principal {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Numeric user/group identity a principal resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    /// User id
    pub uid: u32,
    /// Primary group id
    pub gid: u32,
}

impl Identity {
    /// Create an identity
    pub const fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}
