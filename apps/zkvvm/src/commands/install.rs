//! Install command for the zkvvm CLI.
//!
//! Installs the newest published zkVyper version matching a constraint,
//! together with the configured Vyper version.
//!
//! ## Usage
//!
//! ```bash
//! zkvvm install 1.3.9             # Install exactly 1.3.9
//! zkvvm install ">=1.3, <1.4"     # Install the newest 1.3.x
//! zkvvm install 1.3.9 --overwrite # Download again even if cached
//! ```

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use zkvvm::VersionManager;
use zkvvm::toolchain::{InstallOutcome, ProgressCallback, ProgressEvent, VersionConstraint, format_bytes};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version constraint to install (e.g., "1.3.9" or ">=1.3.0").
    pub version: String,

    /// Download and replace the binary even if it is already cached.
    #[clap(long = "overwrite", action = clap::ArgAction::SetTrue)]
    pub overwrite: bool,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Parse the constraint
/// 2. Make sure the Vyper companion is installed
/// 3. Fetch the remote index and select the newest match
/// 4. Download, verify and cache it
///
/// # Errors
///
/// Returns an error if:
/// - The constraint cannot be parsed
/// - The platform is unsupported
/// - The index cannot be fetched
/// - Download or verification fails
pub async fn execute(manager: &VersionManager, args: &InstallArgs) -> Result<()> {
    let constraint = VersionConstraint::parse(&args.version)
        .with_context(|| format!("Invalid version constraint: {}", args.version))?;
    let progress = progress_printer();

    println!("Checking vyper {}...", manager.companion().version());
    manager.ensure_companion(Some(&progress)).await?;

    println!("Fetching remote versions...");
    let remote = manager.remote_versions().await?;
    let Some(target) = constraint.select(remote) else {
        println!("Version not available");
        return Ok(());
    };

    println!("Installing zkvyper v{}...", target.version);
    match manager.install(target, args.overwrite, Some(&progress)).await? {
        InstallOutcome::Installed(path) => {
            println!("Installed zkvyper v{} to {}", target.version, path.display());
        }
        InstallOutcome::AlreadyInstalled => {
            println!("zkvyper v{} is already installed.", target.version);
        }
    }
    Ok(())
}

/// Returns a callback drawing download progress on stderr.
fn progress_printer() -> ProgressCallback {
    Arc::new(|event| {
        let mut stderr = std::io::stderr();
        let _ = match event {
            ProgressEvent::Started { total } => match total {
                Some(total) => writeln!(stderr, "Downloading {}", format_bytes(total)),
                None => writeln!(stderr, "Downloading"),
            },
            ProgressEvent::Progress {
                downloaded,
                total: Some(total),
            } => write!(
                stderr,
                "\r  {} / {}",
                format_bytes(downloaded),
                format_bytes(total)
            ),
            ProgressEvent::Progress { downloaded, total: None } => {
                write!(stderr, "\r  {}", format_bytes(downloaded))
            }
            ProgressEvent::Completed => writeln!(stderr),
        };
        let _ = stderr.flush();
    })
}
