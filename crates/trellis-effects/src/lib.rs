//! Trellis Effects
//!
//! Production handlers for the effect traits in `trellis-core`:
//! - [`CommandAclHandler`] drives `setfacl` / `getfacl`
//! - [`SystemIdentityHandler`] reads the passwd database
//! - [`SystemOwnershipHandler`] calls `chown(2)`
//! - [`SystemEffects`] bundles all three for a synchronize or audit run

#![forbid(unsafe_code)]

pub mod acl_command;
pub mod identity;
pub mod ownership;
pub mod system;

pub use acl_command::CommandAclHandler;
pub use identity::SystemIdentityHandler;
pub use ownership::SystemOwnershipHandler;
pub use system::SystemEffects;
