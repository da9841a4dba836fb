#![warn(clippy::pedantic)]

//! # zkvvm
//!
//! The `zkvvm` command installs, lists and removes zkVyper compiler binaries
//! and runs them against Vyper sources.
//!
//! ## Subcommands
//!
//! - `ls` - List cached versions
//! - `ls-remote` - List published versions
//! - `install` - Install a version
//! - `uninstall` - Remove a cached version
//! - `compile` - Compile Vyper sources
//! - `version` - Display version information
//!
//! ## Exit Codes
//!
//! | Code | Meaning                                  |
//! |------|------------------------------------------|
//! | 0    | Success                                  |
//! | 1    | Other error                              |
//! | 2    | Unsupported platform                     |
//! | 3    | Network or index parse failure           |
//! | 4    | Cache or file system failure             |
//! | 5    | Installation or verification failure     |
//! | 6    | No version matches the constraint        |
//! | 7    | Invalid configuration                    |
//!
//! When the compiler itself fails, its exit code is passed through.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{compile, install, ls, ls_remote, uninstall, version};
use zkvvm::{Config, ConfigOverrides, VersionManager, ZkvvmError, logging};

/// zkVyper compiler version manager.
#[derive(Parser)]
#[command(
    name = "zkvvm",
    author,
    version,
    about = "zkVyper compiler version manager",
    after_help = "\
ENVIRONMENT VARIABLES:
    ZKVVM_ZK_VERSION        zkVyper version constraint (default: >=1.1.0)
    ZKVVM_VYPER_VERSION     Vyper version (default: 0.3.3)
    ZKVVM_CACHE_DIR         Binary cache directory
    ZKVVM_LOG_FILE          Debug log file
    ZKVVM_VERBOSITY         Console log level (default: warn)
    ZKVVM_REMOTE_URL        zkVyper release index URL
    ZKVVM_COMPANION_URL     Vyper releases URL"
)]
pub struct Cli {
    /// Binary cache directory.
    #[clap(long = "cache-dir", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Debug log file.
    #[clap(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log more to the console. Repeat for more detail.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Vyper version used for compilation.
    #[clap(long = "vyper-version", value_name = "VERSION")]
    pub vyper_version: Option<String>,

    /// zkVyper version constraint used for compilation.
    #[clap(long = "zk-version", value_name = "CONSTRAINT")]
    pub zk_version: Option<String>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the zkvvm CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// List cached zkVyper versions, newest first.
    Ls,

    /// List published zkVyper versions for this platform, newest first.
    #[command(name = "ls-remote")]
    LsRemote,

    /// Install the newest published zkVyper version matching a constraint.
    ///
    /// The configured Vyper version is installed as well.
    Install(install::InstallArgs),

    /// Remove a cached zkVyper version.
    Uninstall(uninstall::UninstallArgs),

    /// Compile Vyper source files and print the combined JSON output.
    Compile(compile::CompileArgs),

    /// Display version information.
    Version(version::VersionArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Handles an error and returns the appropriate exit code.
///
/// For `CompilationFailed` the compiler's stderr is forwarded and its exit
/// code returned. Other zkvvm errors are printed and mapped to their kind's
/// exit code; anything else exits with 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<ZkvvmError>() {
        Some(ZkvvmError::CompilationFailed { code, stderr }) => {
            eprint!("{stderr}");
            *code
        }
        Some(err) => {
            eprintln!("Error: {e:?}");
            err.exit_code()
        }
        None => {
            eprintln!("Error: {e:?}");
            1
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    if let Commands::Version(args) = &command {
        return version::execute(args);
    }

    let mut config = Config::load(ConfigOverrides {
        zk_version: cli.zk_version,
        vyper_version: cli.vyper_version,
        cache_dir: cli.cache_dir,
        log_file: cli.log_file,
        ..ConfigOverrides::default()
    })?;
    config.increase_verbosity(cli.verbose);
    logging::init(config.verbosity, &config.log_file)?;

    let manager = VersionManager::new(config)?;
    match command {
        Commands::Ls => ls::execute(&manager),
        Commands::LsRemote => ls_remote::execute(&manager).await,
        Commands::Install(args) => install::execute(&manager, &args).await,
        Commands::Uninstall(args) => uninstall::execute(&manager, &args),
        Commands::Compile(args) => compile::execute(&manager, &args).await,
        Commands::Version(args) => version::execute(&args),
    }
}
