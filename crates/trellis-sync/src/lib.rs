//! Trellis Sync
//!
//! Keeps a project tree consistent with its role assignment:
//! - `containment` - does a resolved path lie within the project root
//! - `builder` - role assignment to canonical ACL rule sets
//! - `walker` / `applier` - depth-first traversal re-applying access and
//!   default ACLs to every contained entry
//! - `ownership` - hands the root and role record to the owner first
//! - `audit` - read-only comparison of live ACLs against the same rules
//! - `synchronizer` - sequences the above for one project
//!
//! Fatal errors surface before the first mutation; per-entry failures are
//! collected while the walk carries on and are reported at the end.

#![forbid(unsafe_code)]

pub mod applier;
pub mod audit;
pub mod builder;
pub mod containment;
pub mod ownership;
pub mod synchronizer;
pub mod walker;

pub use applier::{apply_recursively, AclApplier};
pub use audit::audit;
pub use builder::{build_record_spec, build_tree_spec, ProjectSpecs};
pub use containment::{is_contained, Containment, ContainmentBoundary};
pub use ownership::chown_to_owner;
pub use synchronizer::Synchronizer;
pub use walker::{ensure_not_symlink, EntryKind, EntryVisitor, FsEntry, TreeWalker, Visit};
