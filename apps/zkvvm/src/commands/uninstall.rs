//! Uninstall command for the zkvvm CLI.
//!
//! Removes a cached zkVyper version.
//!
//! ## Usage
//!
//! ```bash
//! zkvvm uninstall 1.3.9       # Asks for confirmation
//! zkvvm uninstall 1.3.9 -y    # Removes without asking
//! ```

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;
use semver::Version;
use zkvvm::VersionManager;
use zkvvm::toolchain::RemoveOutcome;
use zkvvm::toolchain::version::strip_tag_prefix;

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// Version to uninstall (e.g., "1.3.9").
    pub version: String,

    /// Do not ask for confirmation.
    #[clap(short = 'y', long = "yes", action = clap::ArgAction::SetTrue)]
    pub yes: bool,
}

/// Executes the uninstall command.
///
/// # Errors
///
/// Returns an error if:
/// - The version cannot be parsed
/// - The cache cannot be read
/// - The binary exists but cannot be removed
pub fn execute(manager: &VersionManager, args: &UninstallArgs) -> Result<()> {
    let version = Version::parse(strip_tag_prefix(args.version.trim()))
        .with_context(|| format!("Invalid version: {}", args.version))?;

    let local = manager.local_versions()?;
    let Some(installed) = local.iter().find(|binary| binary.version == version) else {
        println!("Version not found locally");
        return Ok(());
    };

    if !args.yes {
        let stdin = io::stdin();
        if !confirm(&mut stdin.lock(), &mut io::stdout())? {
            println!("Aborted.");
            return Ok(());
        }
    }

    match manager.uninstall(installed)? {
        RemoveOutcome::Removed(path) => println!("Removed {}", path.display()),
        RemoveOutcome::NotFound => println!("Version not found locally"),
    }
    Ok(())
}

/// Prompts on `output` and reads a yes/no answer from `input`.
///
/// Anything other than `y` or `yes` (case-insensitive) is a no.
fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    write!(output, "Confirm [y/N]: ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> (bool, String) {
        let mut input = text.as_bytes();
        let mut output = Vec::new();
        let confirmed = confirm(&mut input, &mut output).unwrap();
        (confirmed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn confirm_accepts_y_and_yes() {
        assert!(answer("y\n").0);
        assert!(answer("YES\n").0);
    }

    #[test]
    fn confirm_defaults_to_no() {
        assert!(!answer("\n").0);
        assert!(!answer("").0);
        assert!(!answer("nope\n").0);
    }

    #[test]
    fn confirm_prints_prompt() {
        assert_eq!(answer("n\n").1, "Confirm [y/N]: ");
    }
}
