//! Read-only drift audit
//!
//! Compares the live ACLs of a project root and its role record against the
//! rules the builder would produce, stopping at the first disagreement.
//! Checks run in a fixed order so the reported violation is stable:
//! 1. owner rule on the record (access)
//! 2. owner, then each member, then each collaborator on the root, access
//!    before default
//! 3. `other::` on the root, access before default
//!
//! Only the root and the record are examined; entries deeper in the tree are
//! not.

use crate::builder::ProjectSpecs;
use std::path::Path;
use tracing::{debug, info};
use trellis_core::acl::{check_required_entries, other_rule, user_rule};
use trellis_core::{
    AclEffectError, AclEffects, AclEntry, AclKind, AclSpec, DriftReport, DriftViolation,
    IdentityEffects, Perms, Principal, Role, RoleAssignment, SyncError, SyncResult,
};

/// Audit `root` and `record_path` against `assignment`.
///
/// Never mutates anything. Fails only when a principal cannot be resolved or
/// an ACL cannot be read at all; an unparsable ACL is reported as drift.
pub fn audit<E>(
    effects: &E,
    root: &Path,
    record_path: &Path,
    assignment: &RoleAssignment,
) -> SyncResult<DriftReport>
where
    E: AclEffects + IdentityEffects + ?Sized,
{
    let specs = ProjectSpecs::derive(effects, assignment)?;
    let auditor = DriftAuditor {
        effects,
        assignment,
        specs: &specs,
    };
    match auditor.first_violation(root, record_path)? {
        Some(violation) => {
            info!(project = %assignment.project(), %violation, "Project ACL drifted");
            Ok(DriftReport::OutOfSync(violation))
        }
        None => {
            debug!(project = %assignment.project(), "Project ACL in sync");
            Ok(DriftReport::InSync)
        }
    }
}

struct DriftAuditor<'a, E: ?Sized> {
    effects: &'a E,
    assignment: &'a RoleAssignment,
    specs: &'a ProjectSpecs,
}

/// Entries of one ACL, or the drift that reading it revealed
type Listing = Result<Vec<AclEntry>, DriftViolation>;

impl<E: AclEffects + ?Sized> DriftAuditor<'_, E> {
    fn first_violation(
        &self,
        root: &Path,
        record_path: &Path,
    ) -> SyncResult<Option<DriftViolation>> {
        let owner = self.assignment.owner();

        let record = match self.read(record_path, AclKind::Access)? {
            Ok(entries) => entries,
            Err(violation) => return Ok(Some(violation)),
        };
        let expected = expected_rule(&self.specs.record, owner);
        if let Some(v) = check_user(
            record_path,
            AclKind::Access,
            &record,
            owner,
            Role::Owner,
            expected,
        ) {
            return Ok(Some(v));
        }

        let mut listings = Vec::with_capacity(2);
        for kind in [AclKind::Access, AclKind::Default] {
            match self.read(root, kind)? {
                Ok(entries) => listings.push((kind, entries)),
                Err(violation) => return Ok(Some(violation)),
            }
        }

        // the tree spec lists owner, members, collaborators in that order
        for (principal, expected) in self.specs.tree.users() {
            let Some(role) = self.assignment.role_of(principal) else {
                continue;
            };
            for (kind, entries) in &listings {
                if let Some(v) = check_user(root, *kind, entries, principal, role, expected) {
                    return Ok(Some(v));
                }
            }
        }

        let expected_other = self.specs.tree.other();
        for (kind, entries) in &listings {
            let found = other_rule(entries);
            if found != Some(expected_other) {
                return Ok(Some(DriftViolation::PublicMismatch {
                    path: root.to_path_buf(),
                    kind: *kind,
                    expected: expected_other,
                    found,
                }));
            }
        }
        Ok(None)
    }

    fn read(&self, path: &Path, kind: AclKind) -> SyncResult<Listing> {
        let corrupt = |reason: String| DriftViolation::CorruptAcl {
            path: path.to_path_buf(),
            kind,
            reason,
        };
        match self.effects.read_acl(path, kind) {
            Ok(entries) => {
                // an empty default ACL is simply absent
                if kind == AclKind::Default && entries.is_empty() {
                    return Ok(Ok(entries));
                }
                Ok(check_required_entries(&entries).map(|()| entries).map_err(corrupt))
            }
            Err(AclEffectError::Corrupt { reason, .. }) => Ok(Err(corrupt(reason))),
            Err(err) => Err(SyncError::Inspect {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }),
        }
    }
}

fn expected_rule(spec: &AclSpec, principal: &Principal) -> Perms {
    spec.user_perms(principal).unwrap_or(Perms::NONE)
}

fn check_user(
    path: &Path,
    kind: AclKind,
    entries: &[AclEntry],
    principal: &Principal,
    role: Role,
    expected: Perms,
) -> Option<DriftViolation> {
    match user_rule(entries, principal) {
        None => Some(DriftViolation::MissingRule {
            path: path.to_path_buf(),
            kind,
            principal: principal.clone(),
            role,
            expected,
        }),
        Some(found) if found != expected => Some(DriftViolation::WrongRule {
            path: path.to_path_buf(),
            kind,
            principal: principal.clone(),
            role,
            expected,
            found,
        }),
        Some(_) => None,
    }
}
