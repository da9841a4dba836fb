//! Toolchain management for zkvvm.
//!
//! This module provides functionality for managing zkVyper compiler binaries,
//! including discovering releases, downloading, verifying, caching, and
//! selecting versions.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS and architecture detection
//! - [`version`] - Versions, constraints and cache file names
//! - [`remote`] - Remote release index
//! - [`cache`] - Local binary cache
//! - [`resolver`] - Version selection from local and remote sets
//! - [`download`] - HTTP download with progress tracking
//! - [`verify`] - Post-download `--version` check
//! - [`installer`] - Download, verify and commit into the cache
//! - [`companion`] - The Vyper compiler zkVyper depends on

pub mod cache;
pub mod companion;
pub mod download;
pub mod installer;
pub mod platform;
pub mod remote;
pub mod resolver;
pub mod verify;
pub mod version;

pub use cache::{LocalCache, RemoveOutcome};
pub use companion::Companion;
pub use download::{ProgressCallback, ProgressEvent, format_bytes};
pub use installer::{InstallOutcome, Installer};
pub use platform::PlatformId;
pub use remote::RemoteIndex;
pub use resolver::resolve;
pub use version::{BinaryVersion, Location, VersionConstraint};
