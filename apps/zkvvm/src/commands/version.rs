//! Version command for the zkvvm CLI.
//!
//! Displays version information for zkvvm. In verbose mode, also shows the
//! git commit it was built from and the platform id used for downloads.

use anyhow::Result;
use clap::Args;
use zkvvm::toolchain::PlatformId;

/// Arguments for the version command.
#[derive(Args)]
pub struct VersionArgs {
    /// Show the build commit and platform.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

/// Executes the version command.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(args: &VersionArgs) -> Result<()> {
    println!("zkvvm {}", env!("CARGO_PKG_VERSION"));
    if args.verbose {
        println!();
        println!("  Commit:   {}", git_commit());
        println!("  Platform: {}", platform_string());
    }
    Ok(())
}

/// Returns the git commit hash recorded by the build script.
fn git_commit() -> &'static str {
    option_env!("ZKVVM_GIT_COMMIT").unwrap_or("unknown")
}

/// Returns the remote index platform id, or the raw host pair if the host
/// is not supported.
fn platform_string() -> String {
    PlatformId::detect().map_or_else(
        |_| {
            format!(
                "unsupported ({}-{})",
                std::env::consts::OS,
                std::env::consts::ARCH
            )
        },
        |platform| platform.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_succeeds_in_both_modes() {
        assert!(execute(&VersionArgs { verbose: false }).is_ok());
        assert!(execute(&VersionArgs { verbose: true }).is_ok());
    }

    #[test]
    fn platform_string_is_not_empty() {
        assert!(!platform_string().is_empty());
    }

    #[test]
    fn git_commit_returns_value() {
        assert!(!git_commit().is_empty());
    }
}
