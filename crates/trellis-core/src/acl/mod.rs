//! POSIX ACL rule algebra
//!
//! Permission triples, tagged entries and their text form. The text form
//! follows `getfacl`/`setfacl`: one `tag:qualifier:perms` entry per line or
//! comma-separated, `default:` prefix for default ACL entries, `#` comments.

mod spec;

pub use spec::{AclSpec, AclSpecBuilder};

use crate::principal::Principal;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// A read/write/execute permission triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Perms(u8);

impl Perms {
    /// `---`
    pub const NONE: Perms = Perms(0);
    /// `--x` (traverse on directories)
    pub const EXECUTE: Perms = Perms(0b001);
    /// `-w-`
    pub const WRITE: Perms = Perms(0b010);
    /// `r--`
    pub const READ: Perms = Perms(0b100);
    /// `r-x`
    pub const READ_EXECUTE: Perms = Perms(0b101);
    /// `rw-`
    pub const READ_WRITE: Perms = Perms(0b110);
    /// `rwx`
    pub const ALL: Perms = Perms(0b111);

    /// Build from the low three mode bits (`r=4`, `w=2`, `x=1`)
    pub const fn from_bits(bits: u8) -> Option<Perms> {
        if bits > 0b111 {
            None
        } else {
            Some(Perms(bits))
        }
    }

    /// Whether every permission in `other` is also in `self`
    pub const fn contains(self, other: Perms) -> bool {
        self.0 & other.0 == other.0
    }

    /// Permissions in either triple
    pub const fn union(self, other: Perms) -> Perms {
        Perms(self.0 | other.0)
    }

    /// `self` with the permissions of `other` cleared
    pub const fn without(self, other: Perms) -> Perms {
        Perms(self.0 & !other.0)
    }

    /// No permission at all
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Perms {
    type Output = Perms;

    fn bitor(self, rhs: Perms) -> Perms {
        self.union(rhs)
    }
}

impl fmt::Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |mask: Perms, c: char| if self.contains(mask) { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(Perms::READ, 'r'),
            flag(Perms::WRITE, 'w'),
            flag(Perms::EXECUTE, 'x')
        )
    }
}

impl FromStr for Perms {
    type Err = String;

    /// Strict `rwx` triple; each position is its letter or `-`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 3 {
            return Err(format!("permission triple '{s}' must have three characters"));
        }
        let mut perms = Perms::NONE;
        for (c, (letter, mask)) in chars.iter().zip([
            ('r', Perms::READ),
            ('w', Perms::WRITE),
            ('x', Perms::EXECUTE),
        ]) {
            match *c {
                '-' => {}
                c if c == letter => perms = perms | mask,
                other => return Err(format!("unexpected '{other}' in permission triple '{s}'")),
            }
        }
        Ok(perms)
    }
}

/// Which of a path's two ACLs an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AclKind {
    /// Governs access to the entry itself
    Access,
    /// Inherited by entries later created in a directory
    Default,
}

impl fmt::Display for AclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclKind::Access => f.write_str("access"),
            AclKind::Default => f.write_str("default"),
        }
    }
}

/// Who an ACL entry applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AclTag {
    /// The file owner (`user::`)
    UserObj,
    /// A named user (`user:name:`)
    User(Principal),
    /// The owning group (`group::`)
    GroupObj,
    /// A named group (`group:name:`)
    Group(Principal),
    /// Upper bound for the group class (`mask::`)
    Mask,
    /// Everyone else (`other::`)
    Other,
}

/// One ACL rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclEntry {
    /// Who the rule applies to
    pub tag: AclTag,
    /// What they may do
    pub perms: Perms,
}

impl AclEntry {
    /// Create an entry
    pub fn new(tag: AclTag, perms: Perms) -> Self {
        Self { tag, perms }
    }
}

impl fmt::Display for AclEntry {
    /// Long text form, e.g. `user:bob:rwx`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            AclTag::UserObj => write!(f, "user::{}", self.perms),
            AclTag::User(p) => write!(f, "user:{p}:{}", self.perms),
            AclTag::GroupObj => write!(f, "group::{}", self.perms),
            AclTag::Group(p) => write!(f, "group:{p}:{}", self.perms),
            AclTag::Mask => write!(f, "mask::{}", self.perms),
            AclTag::Other => write!(f, "other::{}", self.perms),
        }
    }
}

impl FromStr for AclEntry {
    type Err = String;

    /// Parse one entry in short (`u:bob:rwx`) or long (`user:bob:rwx`) form.
    /// A `default:` prefix must already be stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.splitn(3, ':');
        let (tag, qualifier, perms) = match (fields.next(), fields.next(), fields.next()) {
            (Some(tag), Some(qualifier), Some(perms)) => (tag, qualifier, perms),
            _ => return Err(format!("malformed ACL entry '{s}'")),
        };
        let perms: Perms = perms.parse()?;
        let named = |qualifier: &str| Principal::new(qualifier);
        let tag = match (tag, qualifier) {
            ("user" | "u", "") => AclTag::UserObj,
            ("user" | "u", q) => AclTag::User(named(q)),
            ("group" | "g", "") => AclTag::GroupObj,
            ("group" | "g", q) => AclTag::Group(named(q)),
            ("mask" | "m", "") => AclTag::Mask,
            ("other" | "o", "") => AclTag::Other,
            _ => return Err(format!("unknown ACL tag in '{s}'")),
        };
        Ok(AclEntry::new(tag, perms))
    }
}

/// Parse `getfacl` output (or any ACL text) into the entries of one kind.
///
/// Comment lines and `#effective:` suffixes are ignored. Entries of the
/// other kind are skipped, so the full two-kind listing of a directory can be
/// passed for either kind.
pub fn parse_acl_text(text: &str, kind: AclKind) -> Result<Vec<AclEntry>, String> {
    let mut entries = Vec::new();
    for raw in text.split(['\n', ',']) {
        let line = match raw.find('#') {
            Some(idx) => &raw[..idx],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let (entry_kind, body) = match line
            .strip_prefix("default:")
            .or_else(|| line.strip_prefix("d:"))
        {
            Some(body) => (AclKind::Default, body),
            None => (AclKind::Access, line),
        };
        if entry_kind != kind {
            continue;
        }
        entries.push(body.parse::<AclEntry>()?);
    }
    Ok(entries)
}

/// Check a parsed access ACL has the entries every valid ACL carries
pub fn check_required_entries(entries: &[AclEntry]) -> Result<(), String> {
    for (required, name) in [
        (AclTag::UserObj, "user::"),
        (AclTag::GroupObj, "group::"),
        (AclTag::Other, "other::"),
    ] {
        if !entries.iter().any(|e| e.tag == required) {
            return Err(format!("missing required entry {name}"));
        }
    }
    let named = entries
        .iter()
        .any(|e| matches!(e.tag, AclTag::User(_) | AclTag::Group(_)));
    if named && !entries.iter().any(|e| e.tag == AclTag::Mask) {
        return Err("named entries present without mask::".to_string());
    }
    Ok(())
}

/// Permissions of the named-user rule for `principal`, if present
pub fn user_rule(entries: &[AclEntry], principal: &Principal) -> Option<Perms> {
    entries.iter().find_map(|e| match &e.tag {
        AclTag::User(p) if p == principal => Some(e.perms),
        _ => None,
    })
}

/// Permissions of the `other::` rule, if present
pub fn other_rule(entries: &[AclEntry]) -> Option<Perms> {
    entries
        .iter()
        .find(|e| e.tag == AclTag::Other)
        .map(|e| e.perms)
}
