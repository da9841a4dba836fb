//! Error types for zkvvm.
//!
//! `ZkvvmError` separates hard failures by kind so callers can tell a broken
//! network from a corrupt download. Soft outcomes (nothing matched, nothing to
//! uninstall) are not errors; they are returned as `Option` or as the outcome
//! enums in [`crate::toolchain`].

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, ZkvvmError>;

/// Boxed source error carried by wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Consolidated error type for zkvvm operations.
#[derive(Debug, Error)]
pub enum ZkvvmError {
    /// No remote index exists for this OS/architecture pair.
    #[error("unsupported platform: {os} on {arch}")]
    UnsupportedPlatform {
        /// Operating system name as reported by the host.
        os: String,
        /// CPU architecture as reported by the host.
        arch: String,
    },

    /// Transport failure or non-success HTTP status.
    #[error("network error: {message}")]
    Network {
        /// Description of the failed request.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The remote listing was not well-formed.
    #[error("parse error: {message}")]
    Parse {
        /// Description of what could not be parsed.
        message: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The cache directory could not be read or created.
    #[error("cache directory unavailable: {}", path.display())]
    CacheUnavailable {
        /// The cache directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the artifact failed; nothing was left under the final name.
    #[error("installation of v{version} failed")]
    InstallFailed {
        /// The version being installed.
        version: semver::Version,
        /// What went wrong during transfer or write.
        #[source]
        source: BoxError,
    },

    /// The downloaded artifact did not pass the execute/version check.
    #[error("verification of v{version} failed: {reason}")]
    VerificationFailed {
        /// The version being installed.
        version: semver::Version,
        /// Either "binary did not execute" or "version mismatch".
        reason: String,
    },

    /// A constraint matched nothing locally or remotely.
    #[error("no version available matching {constraint}")]
    NoMatchingVersion {
        /// The constraint as written.
        constraint: String,
    },

    /// A configuration value failed conversion.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidConfig {
        /// Configuration key.
        key: &'static str,
        /// The raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The compiler subprocess exited unsuccessfully.
    #[error("compiler exited with code {code}: {stderr}")]
    CompilationFailed {
        /// Exit code of the compiler (1 if killed by a signal).
        code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// Miscellaneous I/O failure outside the cache directory.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ZkvvmError {
    /// Creates a new `Network` error without a source.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Network` error wrapping a transport error.
    #[must_use]
    pub fn network_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `Parse` error.
    #[must_use]
    pub fn parse(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `CacheUnavailable` error.
    #[must_use]
    pub fn cache_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `InstallFailed` error.
    #[must_use]
    pub fn install_failed(version: &semver::Version, source: impl Into<BoxError>) -> Self {
        Self::InstallFailed {
            version: version.clone(),
            source: source.into(),
        }
    }

    /// Creates a new `VerificationFailed` error.
    #[must_use]
    pub fn verification_failed(version: &semver::Version, reason: impl Into<String>) -> Self {
        Self::VerificationFailed {
            version: version.clone(),
            reason: reason.into(),
        }
    }

    /// Creates a new `NoMatchingVersion` error.
    #[must_use]
    pub fn no_matching_version(constraint: impl ToString) -> Self {
        Self::NoMatchingVersion {
            constraint: constraint.to_string(),
        }
    }

    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(
        key: &'static str,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidConfig {
            key,
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new `Io` error.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Process exit code the CLI uses for this error kind.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedPlatform { .. } => 2,
            Self::Network { .. } | Self::Parse { .. } => 3,
            Self::CacheUnavailable { .. } | Self::Io { .. } => 4,
            Self::InstallFailed { .. } | Self::VerificationFailed { .. } => 5,
            Self::NoMatchingVersion { .. } => 6,
            Self::InvalidConfig { .. } => 7,
            Self::CompilationFailed { code, .. } => *code,
        }
    }
}
