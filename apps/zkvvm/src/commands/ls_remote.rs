//! Remote list command for the zkvvm CLI.
//!
//! Fetches the release index for the current platform and displays every
//! published zkVyper version, newest first.
//!
//! ## Usage
//!
//! ```bash
//! zkvvm ls-remote
//! ```

use anyhow::Result;
use zkvvm::VersionManager;

/// Executes the ls-remote command.
///
/// # Errors
///
/// Returns an error if the platform is unsupported or the index cannot be
/// fetched.
pub async fn execute(manager: &VersionManager) -> Result<()> {
    let versions = manager.remote_versions().await?;

    if versions.is_empty() {
        println!("No remote versions found.");
        return Ok(());
    }

    for binary in versions.iter().rev() {
        println!("{}", binary.version);
    }
    Ok(())
}
