//! Trellis Testkit
//!
//! Shared test infrastructure: in-memory effect handlers standing in for the
//! ACL tools, user database and `chown(2)`, and temporary project trees laid
//! out the way a real project root is.

#![forbid(unsafe_code)]

pub mod fixtures;
pub mod mock_effects;

pub use fixtures::ProjectFixture;
pub use mock_effects::{AclSnapshot, MockEffects, MockOp, FIRST_MOCK_UID};
