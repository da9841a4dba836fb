//! List command for the zkvvm CLI.
//!
//! Displays cached zkVyper versions, newest first.
//!
//! ## Usage
//!
//! ```bash
//! zkvvm ls
//! ```

use anyhow::Result;
use zkvvm::VersionManager;

/// Executes the ls command.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be read.
pub fn execute(manager: &VersionManager) -> Result<()> {
    let versions = manager.local_versions()?;

    if versions.is_empty() {
        println!("No local versions found.");
        return Ok(());
    }

    for binary in versions.iter().rev() {
        println!("{}", binary.version);
    }
    Ok(())
}
