//! Vyper, the companion compiler zkVyper drives.
//!
//! zkVyper needs a `vyper` executable of a specific version at compile time.
//! Vyper binaries are published as GitHub release assets such as
//! `vyper.0.3.3+commit.48e326f0.linux`. The release is looked up directly by
//! its `v<version>` tag, so old versions stay reachable however many releases
//! follow them. Binaries are cached next to the zkVyper binaries in a `vyper/`
//! subdirectory and installed with the same stage/verify/commit discipline.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::cache::LocalCache;
use super::download::ProgressCallback;
use super::installer::{InstallOutcome, Installer};
use super::platform::PlatformId;
use super::remote::get_text_if_found;
use super::resolver::resolve;
use super::version::{BinaryVersion, VersionConstraint, strip_tag_prefix};
use crate::errors::{Result, ZkvvmError};

/// Default releases endpoint for Vyper.
pub const DEFAULT_COMPANION_URL: &str = "https://api.github.com/repos/vyperlang/vyper/releases";

/// Tool name used for cached companion binaries.
pub const COMPANION_TOOL: &str = "vyper";

/// Subdirectory of the cache directory holding companion binaries.
pub const COMPANION_DIR: &str = "vyper";

#[derive(Debug, Clone, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

/// Manages the companion compiler at one pinned version.
#[derive(Debug, Clone)]
pub struct Companion {
    cache: LocalCache,
    releases_url: String,
    version: Version,
}

impl Companion {
    /// Creates a companion cached under `cache_dir/vyper`.
    #[must_use]
    pub fn new(cache_dir: &Path, releases_url: impl Into<String>, version: Version) -> Self {
        Self {
            cache: LocalCache::new(cache_dir.join(COMPANION_DIR), COMPANION_TOOL),
            releases_url: releases_url.into(),
            version,
        }
    }

    /// The pinned version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The companion's cache.
    #[must_use]
    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Path of the cached executable, if installed.
    ///
    /// # Errors
    ///
    /// Returns `CacheUnavailable` if the cache cannot be listed.
    pub fn executable(&self) -> Result<Option<PathBuf>> {
        if !self.cache.dir().exists() {
            return Ok(None);
        }
        let local = self.cache.list_local_versions()?;
        Ok(resolve(&VersionConstraint::exact(&self.version), &local, None)
            .and_then(|found| found.location.as_path().map(Path::to_path_buf)))
    }

    /// Installs the pinned version unless it is already cached.
    ///
    /// Returns the path of the executable.
    ///
    /// # Errors
    ///
    /// - `Network`/`Parse` if the release cannot be fetched
    /// - `NoMatchingVersion` if the release is missing or has no asset for `platform`
    /// - `InstallFailed`/`VerificationFailed` from the installer
    pub async fn ensure_installed(
        &self,
        client: &reqwest::Client,
        platform: PlatformId,
        progress: Option<&ProgressCallback>,
    ) -> Result<PathBuf> {
        if let Some(path) = self.executable()? {
            debug!(version = %self.version, "vyper already installed");
            return Ok(path);
        }

        info!(version = %self.version, "attempting to install vyper");
        self.cache.ensure_directory()?;
        let constraint = VersionConstraint::exact(&self.version);
        let target = self
            .find_release(client, platform)
            .await?
            .filter(|found| constraint.matches(&found.version))
            .ok_or_else(|| ZkvvmError::no_matching_version(format!("vyper {constraint}")))?;

        let path = match Installer::new(client, &self.cache)
            .install(&target, false, progress)
            .await?
        {
            InstallOutcome::Installed(path) => path,
            InstallOutcome::AlreadyInstalled => self.cache.artifact_path(&self.version),
        };
        info!(version = %self.version, "vyper installed");
        Ok(path)
    }

    /// URL of the release tagged with the pinned version.
    #[must_use]
    pub fn release_url(&self) -> String {
        format!("{}/tags/v{}", self.releases_url, self.version)
    }

    /// Fetches the pinned release and picks its asset for `platform`.
    ///
    /// Returns `None` if the tag does not exist or has no asset for the
    /// platform.
    async fn find_release(
        &self,
        client: &reqwest::Client,
        platform: PlatformId,
    ) -> Result<Option<BinaryVersion>> {
        let url = self.release_url();
        let Some(body) = get_text_if_found(client, &url).await? else {
            debug!(url = %url, "vyper release not found");
            return Ok(None);
        };
        parse_release(&body, &url, platform)
    }
}

/// Parses a GitHub release into its version and the download URL of the
/// asset for `platform`.
fn parse_release(body: &str, url: &str, platform: PlatformId) -> Result<Option<BinaryVersion>> {
    let release: Release = serde_json::from_str(body)
        .map_err(|e| ZkvvmError::parse(format!("Failed to parse release from {url}"), e))?;

    let Ok(version) = Version::parse(strip_tag_prefix(&release.tag_name)) else {
        warn!(tag = %release.tag_name, "skipping release with unparseable tag");
        return Ok(None);
    };
    let os = platform.companion_os();
    Ok(release
        .assets
        .iter()
        .find(|asset| asset.name.ends_with(os))
        .map(|asset| BinaryVersion::remote(version, asset.browser_download_url.clone())))
}
