//! The version manager.
//!
//! [`VersionManager`] ties the toolchain pieces together for one
//! configuration: it detects the platform, reads the local cache, fetches the
//! remote index when the cache cannot satisfy a constraint, installs what is
//! missing and finally runs the compiler.
//!
//! The platform id and the remote listing are fetched at most once per
//! manager; [`VersionManager::invalidate_remote`] forgets the listing.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{Result, ZkvvmError};
use crate::toolchain::{
    BinaryVersion, Companion, InstallOutcome, Installer, LocalCache, PlatformId, ProgressCallback,
    RemoteIndex, RemoveOutcome, VersionConstraint, resolve,
};

/// User-Agent header for HTTP requests. GitHub rejects requests without one.
const USER_AGENT: &str = concat!("zkvvm/", env!("CARGO_PKG_VERSION"));

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Tool name of cached zkVyper binaries.
pub const ZKVYPER_TOOL: &str = "zkvyper";

/// Manages zkVyper and Vyper binaries for one configuration.
#[derive(Debug)]
pub struct VersionManager {
    config: Config,
    client: reqwest::Client,
    platform: OnceLock<PlatformId>,
    remote: OnceCell<BTreeSet<BinaryVersion>>,
    index: RemoteIndex,
    cache: LocalCache,
    companion: Companion,
}

impl VersionManager {
    /// Creates a manager and makes sure the cache directory exists.
    ///
    /// # Errors
    ///
    /// - `Network` if the HTTP client cannot be built
    /// - `CacheUnavailable` if the cache directory cannot be created
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ZkvvmError::network_with_source("Failed to create HTTP client", e))?;

        let cache = LocalCache::new(&config.cache_dir, ZKVYPER_TOOL);
        cache.ensure_directory()?;
        let companion = Companion::new(
            &config.cache_dir,
            config.companion_url.clone(),
            config.vyper_version.clone(),
        );
        let index = RemoteIndex::new(client.clone(), config.remote_url.clone());
        debug!(cache = %config.cache_dir.display(), "version manager ready");

        Ok(Self {
            config,
            client,
            platform: OnceLock::new(),
            remote: OnceCell::new(),
            index,
            cache,
            companion,
        })
    }

    /// Uses `platform` instead of detecting the host.
    #[must_use]
    pub fn with_platform(self, platform: PlatformId) -> Self {
        let _ = self.platform.set(platform);
        self
    }

    /// The configuration this manager was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The zkVyper cache.
    #[must_use]
    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// The Vyper companion.
    #[must_use]
    pub fn companion(&self) -> &Companion {
        &self.companion
    }

    /// The host platform, detected on first use.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` if the host has no published binaries.
    pub fn platform(&self) -> Result<PlatformId> {
        if let Some(platform) = self.platform.get() {
            return Ok(*platform);
        }
        let platform = PlatformId::detect()?;
        Ok(*self.platform.get_or_init(|| platform))
    }

    /// Versions currently in the cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheUnavailable` if the cache directory cannot be read.
    pub fn local_versions(&self) -> Result<BTreeSet<BinaryVersion>> {
        self.cache.list_local_versions()
    }

    /// Versions published for this platform, fetched on first use.
    ///
    /// # Errors
    ///
    /// - `UnsupportedPlatform` if the host is not supported
    /// - `Network`/`Parse` if the listing cannot be fetched
    pub async fn remote_versions(&self) -> Result<&BTreeSet<BinaryVersion>> {
        self.remote
            .get_or_try_init(|| async {
                let platform = self.platform()?;
                self.index.list_remote_versions(platform).await
            })
            .await
    }

    /// Forgets the fetched remote listing so the next call fetches again.
    pub fn invalidate_remote(&mut self) {
        self.remote.take();
    }

    /// Selects a version for `constraint`.
    ///
    /// The remote index is only consulted when no cached version matches.
    ///
    /// # Errors
    ///
    /// Propagates errors from listing the cache or fetching the index.
    pub async fn resolve(&self, constraint: &VersionConstraint) -> Result<Option<BinaryVersion>> {
        let local = self.local_versions()?;
        if let Some(found) = resolve(constraint, &local, None) {
            debug!(constraint = %constraint, version = %found, "resolved from cache");
            return Ok(Some(found));
        }
        let remote = self.remote_versions().await?;
        Ok(resolve(constraint, &local, Some(remote)))
    }

    /// Installs `version` into the cache.
    ///
    /// # Errors
    ///
    /// See [`Installer::install`].
    pub async fn install(
        &self,
        version: &BinaryVersion,
        overwrite: bool,
        progress: Option<&ProgressCallback>,
    ) -> Result<InstallOutcome> {
        Installer::new(&self.client, &self.cache)
            .install(version, overwrite, progress)
            .await
    }

    /// Removes `version` from the cache.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be deleted.
    pub fn uninstall(&self, version: &BinaryVersion) -> Result<RemoveOutcome> {
        Installer::new(&self.client, &self.cache).uninstall(version)
    }

    /// Installs the configured Vyper version if missing and returns its path.
    ///
    /// # Errors
    ///
    /// See [`Companion::ensure_installed`].
    pub async fn ensure_companion(&self, progress: Option<&ProgressCallback>) -> Result<PathBuf> {
        let platform = self.platform()?;
        self.companion
            .ensure_installed(&self.client, platform, progress)
            .await
    }

    /// Returns the zkVyper binary for the configured constraint, installing
    /// it first if only a remote release matches.
    ///
    /// # Errors
    ///
    /// Returns `NoMatchingVersion` if nothing matches, or any install error.
    pub async fn zkvyper(&self) -> Result<PathBuf> {
        let constraint = &self.config.zk_version;
        let selected = self
            .resolve(constraint)
            .await?
            .ok_or_else(|| ZkvvmError::no_matching_version(constraint))?;

        if let Some(path) = selected.location.as_path() {
            return Ok(path.to_path_buf());
        }
        info!(version = %selected, "installing zkVyper for compilation");
        match self.install(&selected, false, None).await? {
            InstallOutcome::Installed(path) => Ok(path),
            InstallOutcome::AlreadyInstalled => Ok(self.cache.artifact_path(&selected.version)),
        }
    }

    /// Compiles `files` and returns the compiler's combined JSON output.
    ///
    /// # Errors
    ///
    /// - any error from [`Self::ensure_companion`] or [`Self::zkvyper`]
    /// - `Io` if the compiler cannot be started
    /// - `CompilationFailed` if it exits unsuccessfully
    /// - `Parse` if its output is not JSON
    pub async fn compile(&self, files: &[PathBuf]) -> Result<serde_json::Value> {
        let vyper = self.ensure_companion(None).await?;
        let zkvyper = self.zkvyper().await?;

        let mut command = compile_command(&zkvyper, &vyper, files);
        debug!(command = ?command, "running compiler");
        let output = command.output().map_err(|e| {
            ZkvvmError::io(format!("Failed to run {}", zkvyper.display()), e)
        })?;

        if !output.status.success() {
            return Err(ZkvvmError::CompilationFailed {
                code: output.status.code().unwrap_or(1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ZkvvmError::parse("Failed to parse compiler output", e))
    }

    /// Compiles Vyper source held in memory.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the temporary source file cannot be written, otherwise
    /// the same errors as [`Self::compile`].
    pub async fn compile_source(&self, source: &str) -> Result<serde_json::Value> {
        let mut file = tempfile::Builder::new()
            .suffix(".vy")
            .tempfile()
            .map_err(|e| ZkvvmError::io("Failed to create temporary source file", e))?;
        file.write_all(source.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| ZkvvmError::io("Failed to write temporary source file", e))?;

        self.compile(&[file.path().to_path_buf()]).await
    }
}

/// Builds the compiler invocation for `files`.
#[must_use]
pub fn compile_command(zkvyper: &Path, vyper: &Path, files: &[PathBuf]) -> Command {
    let mut command = Command::new(zkvyper);
    command
        .arg("--vyper")
        .arg(vyper)
        .args(["-f", "combined_json"])
        .args(files);
    command
}
