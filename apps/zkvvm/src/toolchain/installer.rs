//! Installation of binaries into a [`LocalCache`].
//!
//! ## Process
//!
//! 1. Return early if the version is already cached (unless overwriting)
//! 2. Take the per-version lock and check again
//! 3. Download into a staging file
//! 4. Close the file and mark it executable
//! 5. Run it with `--version` and check the output
//! 6. Rename it into the cache
//!
//! A failure at any step leaves nothing under the final name.

use std::path::PathBuf;

use tracing::{debug, error, info};

use super::cache::{LocalCache, RemoveOutcome};
use super::download::{ProgressCallback, download_to};
use super::verify::verify_binary;
use super::version::BinaryVersion;
use crate::errors::{Result, ZkvvmError};

/// Outcome of [`Installer::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The binary was downloaded, verified and placed at this path.
    Installed(PathBuf),
    /// The version was already cached; nothing was transferred.
    AlreadyInstalled,
}

/// Downloads, verifies and caches binaries.
#[derive(Debug, Clone, Copy)]
pub struct Installer<'a> {
    client: &'a reqwest::Client,
    cache: &'a LocalCache,
}

impl<'a> Installer<'a> {
    /// Creates an installer writing into `cache`.
    #[must_use]
    pub fn new(client: &'a reqwest::Client, cache: &'a LocalCache) -> Self {
        Self { client, cache }
    }

    /// Installs `version` from its remote location.
    ///
    /// With `overwrite == false` an already cached version is left alone and
    /// no request is made.
    ///
    /// # Errors
    ///
    /// - `CacheUnavailable` if the cache cannot be listed or locked
    /// - `InstallFailed` if the download or write fails, or the version has no
    ///   remote location
    /// - `VerificationFailed` if the downloaded binary does not run or reports
    ///   another version
    pub async fn install(
        &self,
        version: &BinaryVersion,
        overwrite: bool,
        progress: Option<&ProgressCallback>,
    ) -> Result<InstallOutcome> {
        let tool = self.cache.tool();
        if !overwrite && self.cache.contains(&version.version)? {
            debug!(tool, version = %version, "already installed");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let Some(url) = version.location.as_url() else {
            return Err(ZkvvmError::install_failed(
                &version.version,
                format!("no download location for v{version}"),
            ));
        };

        let _lock = self.cache.lock(&version.version)?;
        if !overwrite && self.cache.contains(&version.version)? {
            debug!(tool, version = %version, "installed by another process");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        debug!(tool, version = %version, url, "installing");
        let mut staged = self.cache.stage(&version.version)?;
        if let Err(e) = download_to(self.client, url, staged.writer(), progress).await {
            error!(tool, version = %version, error = %e, "installation failed");
            return Err(ZkvvmError::install_failed(&version.version, e.into_boxed()));
        }

        let sealed = staged.seal()?;
        verify_binary(sealed.path(), &version.version)?;
        let path = sealed.commit()?;

        info!(tool, version = %version, path = %path.display(), "installation finished");
        Ok(InstallOutcome::Installed(path))
    }

    /// Removes `version` from the cache.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be deleted.
    pub fn uninstall(&self, version: &BinaryVersion) -> Result<RemoveOutcome> {
        self.cache.remove(version)
    }
}
