//! Role assignment: owner, members, collaborators and the public flag
//!
//! The assignment is the declarative source of truth for a project. Every
//! mutation here must be followed by a re-synchronization of the project's
//! ACLs; this module only guards the invariants:
//! - the owner holds no other role
//! - members and collaborators are disjoint

use crate::errors::RoleError;
use crate::principal::Principal;
use crate::project::ProjectId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Project roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control
    Owner,
    /// Read-write
    Member,
    /// Read-only
    Collaborator,
}

impl Role {
    /// All roles, strongest first
    pub const ALL: [Role; 3] = [Role::Owner, Role::Member, Role::Collaborator];

    /// Lowercase role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Member => "member",
            Role::Collaborator => "collaborator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "member" => Ok(Role::Member),
            "collaborator" => Ok(Role::Collaborator),
            other => Err(RoleError::UnknownRole {
                name: other.to_string(),
            }),
        }
    }
}

/// Who may access a project, and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    project: ProjectId,
    owner: Principal,
    members: IndexSet<Principal>,
    collaborators: IndexSet<Principal>,
    public: bool,
}

impl RoleAssignment {
    /// Assignment for a freshly created project: an owner and nobody else
    pub fn new(project: ProjectId, owner: Principal, public: bool) -> Self {
        Self {
            project,
            owner,
            members: IndexSet::new(),
            collaborators: IndexSet::new(),
            public,
        }
    }

    /// Rebuild an assignment from stored parts, re-checking the invariants
    pub fn from_parts(
        project: ProjectId,
        owner: Principal,
        members: impl IntoIterator<Item = Principal>,
        collaborators: impl IntoIterator<Item = Principal>,
        public: bool,
    ) -> Result<Self, RoleError> {
        let mut assignment = Self::new(project, owner, public);
        for member in members {
            assignment.ensure_unassigned(&member, Role::Member)?;
            assignment.members.insert(member);
        }
        for collaborator in collaborators {
            assignment.ensure_unassigned(&collaborator, Role::Collaborator)?;
            assignment.collaborators.insert(collaborator);
        }
        Ok(assignment)
    }

    fn ensure_unassigned(&self, principal: &Principal, requested: Role) -> Result<(), RoleError> {
        match self.role_of(principal) {
            Some(existing) => Err(RoleError::Overlap {
                principal: principal.clone(),
                existing,
                requested,
            }),
            None => Ok(()),
        }
    }

    /// Project this assignment belongs to
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Owner principal
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Members in grant order
    pub fn members(&self) -> impl ExactSizeIterator<Item = &Principal> {
        self.members.iter()
    }

    /// Collaborators in grant order
    pub fn collaborators(&self) -> impl ExactSizeIterator<Item = &Principal> {
        self.collaborators.iter()
    }

    /// Whether "other" gets read access
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Toggle public read access
    pub fn set_public(&mut self, public: bool) {
        self.public = public;
    }

    /// Role held by `principal`, if any
    pub fn role_of(&self, principal: &Principal) -> Option<Role> {
        if &self.owner == principal {
            Some(Role::Owner)
        } else if self.members.contains(principal) {
            Some(Role::Member)
        } else if self.collaborators.contains(principal) {
            Some(Role::Collaborator)
        } else {
            None
        }
    }

    /// Give `principal` the `role`, moving it out of any role it held.
    ///
    /// Granting [`Role::Owner`] hands ownership over; the previous owner keeps
    /// no role. The owner itself cannot be moved to a lesser role.
    pub fn grant(&mut self, principal: Principal, role: Role) -> Result<(), RoleError> {
        match (self.role_of(&principal), role) {
            (Some(Role::Owner), Role::Owner) => return Err(RoleError::AlreadyOwner { principal }),
            (Some(Role::Owner), _) => return Err(RoleError::OwnerDemotion { principal }),
            (Some(current), requested) if current == requested => {
                return Err(RoleError::AlreadyHasRole { principal, role });
            }
            _ => {}
        }

        self.members.shift_remove(&principal);
        self.collaborators.shift_remove(&principal);

        match role {
            Role::Owner => self.owner = principal,
            Role::Member => {
                self.members.insert(principal);
            }
            Role::Collaborator => {
                self.collaborators.insert(principal);
            }
        }
        Ok(())
    }

    /// Remove every role `principal` holds. The owner cannot be removed.
    pub fn revoke(&mut self, principal: &Principal) -> Result<Role, RoleError> {
        match self.role_of(principal) {
            Some(Role::Owner) => Err(RoleError::OwnerRemoval {
                principal: principal.clone(),
            }),
            Some(role) => {
                self.members.shift_remove(principal);
                self.collaborators.shift_remove(principal);
                Ok(role)
            }
            None => Err(RoleError::NoRole {
                principal: principal.clone(),
            }),
        }
    }
}

impl fmt::Display for RoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Owner: {}", self.owner)?;
        writeln!(f, "Members:")?;
        for member in &self.members {
            writeln!(f, "\t{member}")?;
        }
        writeln!(f, "Collaborators:")?;
        for collaborator in &self.collaborators {
            writeln!(f, "\t{collaborator}")?;
        }
        write!(f, "Public: {}", self.public)
    }
}
