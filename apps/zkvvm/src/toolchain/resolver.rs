//! Version selection.
//!
//! Picks the binary to use for a constraint from what is cached locally and
//! what the remote index offers. Local binaries always win, so nothing is
//! downloaded when a cached version already satisfies the constraint, even if
//! a newer matching release exists remotely.

use std::collections::BTreeSet;

use super::version::{BinaryVersion, VersionConstraint};

/// Selects the version to use for `constraint`.
///
/// Returns the greatest matching version in `local` if there is one,
/// otherwise the greatest matching version in `remote` (when given),
/// otherwise `None`.
#[must_use]
pub fn resolve(
    constraint: &VersionConstraint,
    local: &BTreeSet<BinaryVersion>,
    remote: Option<&BTreeSet<BinaryVersion>>,
) -> Option<BinaryVersion> {
    constraint
        .select(local)
        .or_else(|| remote.and_then(|remote| constraint.select(remote)))
        .cloned()
}
