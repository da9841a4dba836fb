//! Platform detection for zkvvm.
//!
//! Maps the host OS and CPU architecture to the directory of the remote index
//! that holds binaries for it.
//!
//! ## Supported Platforms
//!
//! - Linux `x86_64` (`linux-amd64`)
//! - macOS `x86_64` (`macosx-amd64`)
//! - macOS ARM64 (`macosx-arm64`)

use std::fmt;

use crate::errors::{Result, ZkvvmError};

/// Architecture names treated as 64-bit x86.
const AMD64: [&str; 5] = ["amd64", "x86_64", "i386", "i586", "i686"];

/// Architecture names treated as 64-bit ARM.
const ARM64: [&str; 4] = ["aarch64_be", "aarch64", "armv8b", "armv8l"];

/// A platform with pre-built zkVyper binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformId {
    /// Linux on `x86_64`
    LinuxAmd64,
    /// macOS on `x86_64`
    MacosxAmd64,
    /// macOS on ARM64 (Apple Silicon)
    MacosxArm64,
}

impl PlatformId {
    /// Maps an OS name and architecture to a platform.
    ///
    /// OS names are matched case-insensitively and accept both the kernel
    /// spelling (`Darwin`) and Rust's (`macos`).
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` for any other combination.
    pub fn identify(os: &str, arch: &str) -> Result<Self> {
        let os_lower = os.to_lowercase();
        let arch_lower = arch.to_lowercase();
        let is_amd64 = AMD64.contains(&arch_lower.as_str());
        let is_arm64 = ARM64.contains(&arch_lower.as_str());

        match os_lower.as_str() {
            "linux" if is_amd64 => Ok(Self::LinuxAmd64),
            "darwin" | "macos" if is_amd64 => Ok(Self::MacosxAmd64),
            "darwin" | "macos" if is_arm64 => Ok(Self::MacosxArm64),
            _ => Err(ZkvvmError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Detects the host platform.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` if the host has no published binaries.
    pub fn detect() -> Result<Self> {
        Self::identify(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Returns the path segment used by the remote index.
    #[must_use = "returns the platform string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinuxAmd64 => "linux-amd64",
            Self::MacosxAmd64 => "macosx-amd64",
            Self::MacosxArm64 => "macosx-arm64",
        }
    }

    /// Returns the OS suffix used by companion (Vyper) release assets.
    #[must_use = "returns the OS string without side effects"]
    pub fn companion_os(self) -> &'static str {
        match self {
            Self::LinuxAmd64 => "linux",
            Self::MacosxAmd64 | Self::MacosxArm64 => "darwin",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
