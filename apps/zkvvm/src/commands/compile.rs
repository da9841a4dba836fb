//! Compile command for the zkvvm CLI.
//!
//! Runs the configured zkVyper version over one or more Vyper source files
//! and prints the combined JSON output. Missing compilers are installed
//! first.
//!
//! ## Usage
//!
//! ```bash
//! zkvvm compile token.vy
//! zkvvm --zk-version ">=1.3" compile a.vy b.vy
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use zkvvm::VersionManager;

/// Arguments for the compile command.
#[derive(Args)]
pub struct CompileArgs {
    /// Vyper source files to compile.
    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}

/// Executes the compile command.
///
/// # Errors
///
/// Returns an error if the compilers cannot be installed, the compiler
/// exits unsuccessfully, or its output is not JSON.
pub async fn execute(manager: &VersionManager, args: &CompileArgs) -> Result<()> {
    let output = manager.compile(&args.files).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
