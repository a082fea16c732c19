//! Role assignment to ACL rule sets
//!
//! Two specs come out of one assignment: the tree spec written to every
//! directory and file under the project root, and the narrower record spec
//! that keeps the role record readable and writable by the owner alone.

use std::iter;
use tracing::{debug, warn};
use trellis_core::{
    AclSpec, IdentityEffects, Identity, Perms, Principal, RoleAssignment, SyncError, SyncResult,
};

/// Tree and record specs derived from one assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpecs {
    /// Rules for the project root and everything below it
    pub tree: AclSpec,
    /// Rules for the role record
    pub record: AclSpec,
}

impl ProjectSpecs {
    /// Derive both specs, resolving every principal first
    pub fn derive<I>(identities: &I, assignment: &RoleAssignment) -> SyncResult<Self>
    where
        I: IdentityEffects + ?Sized,
    {
        let members: Vec<&Principal> = assignment.members().collect();
        let collaborators: Vec<&Principal> = assignment.collaborators().collect();
        let tree = build_tree_spec(
            identities,
            assignment.owner(),
            &members,
            &collaborators,
            assignment.is_public(),
        )?;
        let record = build_record_spec(identities, assignment.owner(), assignment.is_public())?;
        Ok(Self { tree, record })
    }
}

/// Rules for the project tree.
///
/// Owner object and owning group get full access, other gets read and
/// traverse only when the project is public. The owner and every member get
/// a full named rule, collaborators read and traverse. The mask is the
/// narrowest one covering the group class.
pub fn build_tree_spec<I>(
    identities: &I,
    owner: &Principal,
    members: &[&Principal],
    collaborators: &[&Principal],
    public: bool,
) -> SyncResult<AclSpec>
where
    I: IdentityEffects + ?Sized,
{
    let named = iter::once(owner)
        .chain(members.iter().copied())
        .chain(collaborators.iter().copied());
    for principal in named {
        resolve_principal(identities, principal)?;
    }

    let mut builder = AclSpec::builder()
        .user_obj(Perms::ALL)
        .group_obj(Perms::ALL)
        .other(if public {
            Perms::READ_EXECUTE
        } else {
            Perms::NONE
        })
        .user(owner.clone(), Perms::ALL);
    for &member in members {
        builder = builder.user(member.clone(), Perms::ALL);
    }
    for &collaborator in collaborators {
        builder = builder.user(collaborator.clone(), Perms::READ_EXECUTE);
    }
    let spec = builder.build()?;
    debug!(owner = %owner, public, acl = %spec.to_text(), "Built tree ACL");
    Ok(spec)
}

/// Rules for the role record.
///
/// Only the owner can read or change it. The public flag is accepted so
/// callers can pass an assignment through unchanged, but it never widens
/// access to the record.
pub fn build_record_spec<I>(identities: &I, owner: &Principal, _public: bool) -> SyncResult<AclSpec>
where
    I: IdentityEffects + ?Sized,
{
    resolve_principal(identities, owner)?;
    AclSpec::builder()
        .user_obj(Perms::ALL)
        .group_obj(Perms::NONE)
        .other(Perms::NONE)
        .user(owner.clone(), Perms::ALL)
        .build()
}

/// Look up `principal`, failing if it names no user
pub(crate) fn resolve_principal<I>(identities: &I, principal: &Principal) -> SyncResult<Identity>
where
    I: IdentityEffects + ?Sized,
{
    match identities.resolve(principal) {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => Err(SyncError::PrincipalResolution {
            principal: principal.clone(),
        }),
        Err(err) => {
            warn!(principal = %principal, error = %err, "Identity lookup failed");
            Err(SyncError::PrincipalResolution {
                principal: principal.clone(),
            })
        }
    }
}
