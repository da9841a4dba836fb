//! Runtime configuration.
//!
//! Every setting is taken from, in order of precedence:
//!
//! 1. An explicit override (CLI flag or library caller)
//! 2. A `ZKVVM_*` environment variable
//! 3. A built-in default
//!
//! Values are converted to their typed form once, when [`Config`] is built.
//! Empty or whitespace-only environment values are treated as unset.
//!
//! ## Environment Variables
//!
//! | Variable               | Default                                         |
//! |------------------------|-------------------------------------------------|
//! | `ZKVVM_ZK_VERSION`     | `>=1.1.0`                                       |
//! | `ZKVVM_VYPER_VERSION`  | `0.3.3`                                         |
//! | `ZKVVM_CACHE_DIR`      | `<user cache dir>/zkvvm`                        |
//! | `ZKVVM_LOG_FILE`       | `<user data dir>/zkvvm/log/zkvvm.log`           |
//! | `ZKVVM_VERBOSITY`      | `warn`                                          |
//! | `ZKVVM_REMOTE_URL`     | zkvyper-bin contents API                        |
//! | `ZKVVM_COMPANION_URL`  | vyper releases API                              |

use std::path::{Path, PathBuf};

use semver::Version;
use tracing::level_filters::LevelFilter;

use crate::errors::{Result, ZkvvmError};
use crate::toolchain::companion::DEFAULT_COMPANION_URL;
use crate::toolchain::remote::DEFAULT_REMOTE_URL;
use crate::toolchain::version::{VersionConstraint, strip_tag_prefix};

/// Environment variable for the zkVyper version constraint.
pub const ZK_VERSION_ENV: &str = "ZKVVM_ZK_VERSION";
/// Environment variable for the Vyper version.
pub const VYPER_VERSION_ENV: &str = "ZKVVM_VYPER_VERSION";
/// Environment variable for the cache directory.
pub const CACHE_DIR_ENV: &str = "ZKVVM_CACHE_DIR";
/// Environment variable for the log file.
pub const LOG_FILE_ENV: &str = "ZKVVM_LOG_FILE";
/// Environment variable for the console log level.
pub const VERBOSITY_ENV: &str = "ZKVVM_VERBOSITY";
/// Environment variable for the remote index URL.
pub const REMOTE_URL_ENV: &str = "ZKVVM_REMOTE_URL";
/// Environment variable for the Vyper releases URL.
pub const COMPANION_URL_ENV: &str = "ZKVVM_COMPANION_URL";

const DEFAULT_ZK_VERSION: &str = ">=1.1.0";
const DEFAULT_VYPER_VERSION: &str = "0.3.3";
const DEFAULT_VERBOSITY: LevelFilter = LevelFilter::WARN;
const APP_DIR: &str = "zkvvm";

/// Explicit values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// zkVyper version constraint, e.g. `>=1.3.0` or `1.2.0`.
    pub zk_version: Option<String>,
    /// Exact Vyper version, with or without a leading `v`.
    pub vyper_version: Option<String>,
    /// Binary cache directory. Relative paths are resolved against the
    /// current directory.
    pub cache_dir: Option<PathBuf>,
    /// Debug log file. Relative paths are resolved against the current
    /// directory.
    pub log_file: Option<PathBuf>,
    /// Console log level: a level name from `trace` to `error`, `off`, or a
    /// numeric level such as `20`.
    pub verbosity: Option<String>,
    /// Base URL of the zkVyper release index.
    pub remote_url: Option<String>,
    /// URL of the Vyper releases API.
    pub companion_url: Option<String>,
}

/// Typed configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Constraint used to pick the zkVyper version for compilation.
    pub zk_version: VersionConstraint,
    /// Vyper version installed alongside zkVyper.
    pub vyper_version: Version,
    /// Absolute path of the binary cache.
    pub cache_dir: PathBuf,
    /// Absolute path of the debug log file.
    pub log_file: PathBuf,
    /// Console log level.
    pub verbosity: LevelFilter,
    /// Base URL of the zkVyper release index.
    pub remote_url: String,
    /// URL of the Vyper releases list.
    pub companion_url: String,
}

impl Config {
    /// Builds the configuration from `overrides` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any value cannot be converted.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        Self::from_sources(overrides, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from `overrides` and an environment lookup.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any value cannot be converted.
    pub fn from_sources(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let zk_version = overrides
            .zk_version
            .or_else(|| lookup(ZK_VERSION_ENV))
            .unwrap_or_else(|| DEFAULT_ZK_VERSION.to_string());
        let zk_version = VersionConstraint::parse(&zk_version)
            .map_err(|e| ZkvvmError::invalid_config("zk_version", &zk_version, e))?;

        let vyper_version = overrides
            .vyper_version
            .or_else(|| lookup(VYPER_VERSION_ENV))
            .unwrap_or_else(|| DEFAULT_VYPER_VERSION.to_string());
        let vyper_version = Version::parse(strip_tag_prefix(vyper_version.trim()))
            .map_err(|e| ZkvvmError::invalid_config("vyper_version", &vyper_version, e))?;

        let cache_dir = match overrides
            .cache_dir
            .or_else(|| lookup(CACHE_DIR_ENV).map(PathBuf::from))
        {
            Some(dir) => dir,
            None => default_dir("cache_dir", dirs::cache_dir())?,
        };
        let cache_dir = make_absolute("cache_dir", &cache_dir)?;

        let log_file = match overrides
            .log_file
            .or_else(|| lookup(LOG_FILE_ENV).map(PathBuf::from))
        {
            Some(file) => file,
            None => default_dir("log_file", dirs::data_local_dir())?
                .join("log")
                .join("zkvvm.log"),
        };
        let log_file = make_absolute("log_file", &log_file)?;

        let verbosity = match overrides.verbosity.or_else(|| lookup(VERBOSITY_ENV)) {
            Some(raw) => parse_verbosity(&raw).ok_or_else(|| {
                ZkvvmError::invalid_config(
                    "verbosity",
                    &raw,
                    "expected trace, debug, info, warn, error, off or 10-50",
                )
            })?,
            None => DEFAULT_VERBOSITY,
        };

        let remote_url = overrides
            .remote_url
            .or_else(|| lookup(REMOTE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string());
        let companion_url = overrides
            .companion_url
            .or_else(|| lookup(COMPANION_URL_ENV))
            .unwrap_or_else(|| DEFAULT_COMPANION_URL.to_string());

        Ok(Self {
            zk_version,
            vyper_version,
            cache_dir,
            log_file,
            verbosity,
            remote_url: remote_url.trim().to_string(),
            companion_url: companion_url.trim().trim_end_matches('/').to_string(),
        })
    }

    /// Raises the console log level by `steps` levels, saturating at TRACE.
    pub fn increase_verbosity(&mut self, steps: u8) {
        for _ in 0..steps {
            self.verbosity = match self.verbosity {
                LevelFilter::OFF => LevelFilter::ERROR,
                LevelFilter::ERROR => LevelFilter::WARN,
                LevelFilter::WARN => LevelFilter::INFO,
                LevelFilter::INFO => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            };
        }
    }
}

/// Parses a level name or a numeric level (10 debug, 20 info, 30 warn,
/// 40 error, 50 critical).
#[must_use]
pub fn parse_verbosity(raw: &str) -> Option<LevelFilter> {
    let level = match raw.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "trace" => LevelFilter::TRACE,
        "debug" | "10" => LevelFilter::DEBUG,
        "info" | "20" => LevelFilter::INFO,
        "warn" | "warning" | "30" => LevelFilter::WARN,
        "error" | "critical" | "40" | "50" => LevelFilter::ERROR,
        _ => return None,
    };
    Some(level)
}

fn default_dir(key: &'static str, base: Option<PathBuf>) -> Result<PathBuf> {
    base.map(|dir| dir.join(APP_DIR)).ok_or_else(|| {
        ZkvvmError::invalid_config(key, "", "cannot determine a default location on this system")
    })
}

fn make_absolute(key: &'static str, path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| ZkvvmError::invalid_config(key, path.display().to_string(), e))
}
