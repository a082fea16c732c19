//! Values handed back by synchronize and audit runs

use crate::acl::{AclKind, Perms};
use crate::errors::SyncError;
use crate::principal::Principal;
use crate::roles::Role;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one recursive application
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Root the walk started from
    pub root: PathBuf,
    /// Entries the walk reached
    pub visited: usize,
    /// Entries whose ACLs were written without error
    pub updated: usize,
    /// Entries left untouched because they resolve outside the boundary
    pub skipped: Vec<SyncError>,
    /// Entries the OS refused to update
    pub failures: Vec<SyncError>,
}

impl SyncSummary {
    /// Empty summary for a walk of `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// No entry failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(self)` unless an entry failed
    pub fn into_result(self) -> Result<SyncSummary, SyncError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SyncError::Incomplete {
                summary: Box::new(self),
            })
        }
    }
}

/// First rule found to disagree with the role assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftViolation {
    /// A role holder has no named rule
    MissingRule {
        /// Audited path
        path: PathBuf,
        /// ACL examined
        kind: AclKind,
        /// Principal lacking the rule
        principal: Principal,
        /// Role the principal holds
        role: Role,
        /// Permissions the rule should grant
        expected: Perms,
    },
    /// A role holder's rule grants the wrong permissions
    WrongRule {
        /// Audited path
        path: PathBuf,
        /// ACL examined
        kind: AclKind,
        /// Principal
        principal: Principal,
        /// Role the principal holds
        role: Role,
        /// Permissions the rule should grant
        expected: Perms,
        /// Permissions it grants
        found: Perms,
    },
    /// `other::` does not match the public flag
    PublicMismatch {
        /// Audited path
        path: PathBuf,
        /// ACL examined
        kind: AclKind,
        /// Permissions implied by the public flag
        expected: Perms,
        /// Permissions found, if the entry exists
        found: Option<Perms>,
    },
    /// The ACL could not be parsed
    CorruptAcl {
        /// Audited path
        path: PathBuf,
        /// ACL examined
        kind: AclKind,
        /// Parse failure
        reason: String,
    },
}

impl fmt::Display for DriftViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftViolation::MissingRule {
                path,
                kind,
                principal,
                role,
                expected,
            } => write!(
                f,
                "{role} {principal} has no {kind} rule on {} (expected {expected})",
                path.display()
            ),
            DriftViolation::WrongRule {
                path,
                kind,
                principal,
                role,
                expected,
                found,
            } => write!(
                f,
                "{role} {principal} has {found} instead of {expected} in the {kind} ACL of {}",
                path.display()
            ),
            DriftViolation::PublicMismatch {
                path,
                kind,
                expected,
                found,
            } => {
                let found = found.map_or_else(|| "no entry".to_string(), |p| p.to_string());
                let verb = if expected.is_empty() {
                    "world access not blocked"
                } else {
                    "world doesn't have access"
                };
                write!(
                    f,
                    "{verb}: other is {found}, expected {expected} in the {kind} ACL of {}",
                    path.display()
                )
            }
            DriftViolation::CorruptAcl { path, kind, reason } => {
                write!(f, "{kind} ACL of {} is corrupt: {reason}", path.display())
            }
        }
    }
}

/// Result of auditing one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftReport {
    /// Live ACLs agree with the role assignment
    InSync,
    /// The first disagreement found
    OutOfSync(DriftViolation),
}

impl DriftReport {
    /// Live state agrees with the assignment
    pub fn is_in_sync(&self) -> bool {
        matches!(self, DriftReport::InSync)
    }

    /// The violation, if any
    pub fn violation(&self) -> Option<&DriftViolation> {
        match self {
            DriftReport::InSync => None,
            DriftReport::OutOfSync(violation) => Some(violation),
        }
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftReport::InSync => f.write_str("in sync"),
            DriftReport::OutOfSync(violation) => write!(f, "needs fixed, {violation}"),
        }
    }
}
