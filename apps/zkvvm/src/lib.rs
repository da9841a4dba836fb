#![warn(clippy::pedantic)]

//! # zkvvm
//!
//! A version manager for the zkVyper compiler.
//!
//! zkVyper is distributed as one prebuilt binary per platform and release.
//! zkvvm resolves a semantic-version constraint against a local cache of
//! binaries and the published release index, downloads what is missing,
//! verifies it, and runs it together with the Vyper compiler it depends on.
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> zkvvm::errors::Result<()> {
//! use std::path::PathBuf;
//! use zkvvm::config::ConfigOverrides;
//!
//! let overrides = ConfigOverrides {
//!     zk_version: Some(">=1.3.0".to_string()),
//!     ..ConfigOverrides::default()
//! };
//! let output = zkvvm::compile(&[PathBuf::from("token.vy")], overrides).await?;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod logging;
pub mod manager;
pub mod toolchain;

use std::path::PathBuf;

pub use config::{Config, ConfigOverrides};
pub use errors::{Result, ZkvvmError};
pub use manager::VersionManager;

/// Compiles `files` with the zkVyper version selected by the configuration,
/// installing the compilers first if needed.
///
/// # Errors
///
/// Returns any configuration, installation or compilation error.
pub async fn compile(files: &[PathBuf], overrides: ConfigOverrides) -> Result<serde_json::Value> {
    open_manager(overrides)?.compile(files).await
}

/// Compiles Vyper source held in memory.
///
/// # Errors
///
/// Returns any configuration, installation or compilation error.
pub async fn compile_source(
    source: &str,
    overrides: ConfigOverrides,
) -> Result<serde_json::Value> {
    open_manager(overrides)?.compile_source(source).await
}

/// Loads the configuration, attaches logging and builds a manager.
///
/// A subscriber already installed by the caller is left in place.
fn open_manager(overrides: ConfigOverrides) -> Result<VersionManager> {
    let config = Config::load(overrides)?;
    logging::init(config.verbosity, &config.log_file)?;
    VersionManager::new(config)
}
