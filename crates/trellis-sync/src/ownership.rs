//! Hand the project root and role record to the owner

use crate::builder::resolve_principal;
use std::path::Path;
use tracing::{info, warn};
use trellis_core::{
    ApplyOp, Identity, IdentityEffects, OwnershipEffects, Principal, SyncError, SyncResult,
    SyncSummary,
};

/// Set user and group ownership of `root` and `record_path` to `owner`.
///
/// Not recursive. An unknown owner fails before either path is touched; a
/// refused chown is recorded and the other path is still attempted, ending
/// in [`SyncError::Incomplete`].
pub fn chown_to_owner<E>(
    effects: &E,
    root: &Path,
    record_path: &Path,
    owner: &Principal,
) -> SyncResult<()>
where
    E: IdentityEffects + OwnershipEffects + ?Sized,
{
    let identity = resolve_principal(effects, owner)?;
    let mut summary = SyncSummary::new(root);
    for path in [root, record_path] {
        summary.visited += 1;
        match set_owner(effects, path, identity) {
            Ok(()) => summary.updated += 1,
            Err(err) => summary.failures.push(err),
        }
    }
    info!(
        owner = %owner,
        %identity,
        root = %root.display(),
        failed = summary.failures.len(),
        "Set project ownership"
    );
    summary.into_result().map(drop)
}

/// Chown one path, logging a refusal
fn set_owner<E>(effects: &E, path: &Path, identity: Identity) -> SyncResult<()>
where
    E: OwnershipEffects + ?Sized,
{
    effects.set_owner(path, identity).map_err(|e| {
        let err = SyncError::apply(path, ApplyOp::SetOwner, e);
        warn!("{err}");
        err
    })
}
