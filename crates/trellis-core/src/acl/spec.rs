//! Canonical ACL rule sets
//!
//! An [`AclSpec`] is the complete rule set applied to one entry: owner-obj,
//! named users in a fixed order, group-obj, the derived mask, and other.
//! Specs are only obtainable through [`AclSpecBuilder::build`], which
//! computes the mask and validates, so an invalid spec never reaches a
//! filesystem call.

use super::{AclEntry, AclTag, Perms};
use crate::errors::SyncError;
use crate::principal::Principal;
use std::collections::HashSet;

/// Validated ACL rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclSpec {
    user_obj: Perms,
    users: Vec<(Principal, Perms)>,
    group_obj: Perms,
    mask: Perms,
    other: Perms,
}

/// Accumulates rules for an [`AclSpec`]
#[derive(Debug, Clone, Default)]
pub struct AclSpecBuilder {
    user_obj: Perms,
    users: Vec<(Principal, Perms)>,
    group_obj: Perms,
    other: Perms,
}

impl AclSpecBuilder {
    /// Empty builder: every triple `---`, no named rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Permissions of the entry's owning user
    pub fn user_obj(mut self, perms: Perms) -> Self {
        self.user_obj = perms;
        self
    }

    /// Permissions of the entry's owning group
    pub fn group_obj(mut self, perms: Perms) -> Self {
        self.group_obj = perms;
        self
    }

    /// Permissions of everyone else
    pub fn other(mut self, perms: Perms) -> Self {
        self.other = perms;
        self
    }

    /// Append a named-user rule. Rules keep insertion order.
    pub fn user(mut self, principal: Principal, perms: Perms) -> Self {
        self.users.push((principal, perms));
        self
    }

    /// Compute the mask and validate
    pub fn build(self) -> Result<AclSpec, SyncError> {
        let mut spec = AclSpec {
            user_obj: self.user_obj,
            users: self.users,
            group_obj: self.group_obj,
            mask: Perms::NONE,
            other: self.other,
        };
        spec.mask = spec.minimal_mask();
        spec.validate()?;
        Ok(spec)
    }
}

impl AclSpec {
    /// Start building a spec
    pub fn builder() -> AclSpecBuilder {
        AclSpecBuilder::new()
    }

    /// Narrowest triple covering group-obj and every named rule
    pub fn minimal_mask(&self) -> Perms {
        self.users
            .iter()
            .fold(self.group_obj, |mask, (_, perms)| mask | *perms)
    }

    /// Check the rule set is internally consistent
    pub fn validate(&self) -> Result<(), SyncError> {
        let mut seen = HashSet::new();
        for (principal, _) in &self.users {
            if !principal.is_acl_safe() {
                return Err(SyncError::construction(format!(
                    "principal name '{principal}' cannot appear in an ACL"
                )));
            }
            if !seen.insert(principal) {
                return Err(SyncError::construction(format!(
                    "principal '{principal}' has more than one rule"
                )));
            }
        }
        if !self.mask.contains(self.minimal_mask()) {
            return Err(SyncError::construction(format!(
                "mask {} does not cover the group class ({})",
                self.mask,
                self.minimal_mask()
            )));
        }
        Ok(())
    }

    /// Derived mask
    pub fn mask(&self) -> Perms {
        self.mask
    }

    /// Permissions of everyone else
    pub fn other(&self) -> Perms {
        self.other
    }

    /// Named-user rules in canonical order
    pub fn users(&self) -> impl Iterator<Item = (&Principal, Perms)> {
        self.users.iter().map(|(p, perms)| (p, *perms))
    }

    /// Permissions granted to `principal` by a named rule
    pub fn user_perms(&self, principal: &Principal) -> Option<Perms> {
        self.users
            .iter()
            .find(|(p, _)| p == principal)
            .map(|(_, perms)| *perms)
    }

    /// Same rules with the execute bit cleared everywhere.
    ///
    /// Used for plain files under [`crate::ExecPolicy::PreserveFileMode`].
    pub fn without_execute(&self) -> AclSpec {
        let mut spec = AclSpec {
            user_obj: self.user_obj.without(Perms::EXECUTE),
            users: self
                .users
                .iter()
                .map(|(p, perms)| (p.clone(), perms.without(Perms::EXECUTE)))
                .collect(),
            group_obj: self.group_obj.without(Perms::EXECUTE),
            mask: Perms::NONE,
            other: self.other.without(Perms::EXECUTE),
        };
        spec.mask = spec.minimal_mask();
        spec
    }

    /// Entries in `getfacl` order: owner, named users, group, mask, other
    pub fn entries(&self) -> Vec<AclEntry> {
        let mut entries = Vec::with_capacity(self.users.len() + 4);
        entries.push(AclEntry::new(AclTag::UserObj, self.user_obj));
        entries.extend(
            self.users
                .iter()
                .map(|(p, perms)| AclEntry::new(AclTag::User(p.clone()), *perms)),
        );
        entries.push(AclEntry::new(AclTag::GroupObj, self.group_obj));
        entries.push(AclEntry::new(AclTag::Mask, self.mask));
        entries.push(AclEntry::new(AclTag::Other, self.other));
        entries
    }

    /// Comma-separated text accepted by `setfacl --set`
    pub fn to_text(&self) -> String {
        self.entries()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
