//! Local binary cache.
//!
//! The cache is a flat directory of executables named `<tool>-v<version>`.
//! Only direct regular files count as installed versions; the bookkeeping
//! directories below are ignored when listing.
//!
//! ## Directory Structure
//!
//! ```text
//! <cache_dir>/
//!   zkvyper-v1.3.9          # installed binary
//!   zkvyper-v1.3.10
//!   .staging/               # partially written downloads
//!   .locks/                 # per-version install locks
//!     zkvyper-v1.3.10.lock
//! ```
//!
//! Writes happen in `.staging/` and are renamed into place once complete, so a
//! reader never sees a partial binary under its final name. Renames stay on
//! one filesystem because staging lives inside the cache directory.
//!
//! Lock files are empty and are never deleted, not even by
//! [`LocalCache::remove`]. Unlinking one while another process waits on it
//! would let a third process lock a fresh file at the same path, so two
//! installs of one version could run at once.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use semver::Version;
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, info, warn};

use super::version::{BinaryVersion, decode_file_name, encode_file_name};
use crate::errors::{Result, ZkvvmError};

const STAGING_DIR: &str = ".staging";
const LOCKS_DIR: &str = ".locks";

/// Outcome of [`LocalCache::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The file was deleted.
    Removed(PathBuf),
    /// Nothing was at the version's location.
    NotFound,
}

/// A cache directory holding binaries of a single tool.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
    tool: &'static str,
}

impl LocalCache {
    /// Creates a cache rooted at `dir` for binaries of `tool`.
    ///
    /// Nothing is created on disk; see [`LocalCache::ensure_directory`].
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, tool: &'static str) -> Self {
        Self {
            dir: dir.into(),
            tool,
        }
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the tool whose binaries live here.
    #[must_use]
    pub fn tool(&self) -> &'static str {
        self.tool
    }

    /// Creates the cache directory and its parents if absent.
    ///
    /// # Errors
    ///
    /// Returns `CacheUnavailable` if the directory cannot be created.
    pub fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| ZkvvmError::cache_unavailable(&self.dir, e))
    }

    /// Returns the path an installed `version` is stored at.
    #[must_use]
    pub fn artifact_path(&self, version: &Version) -> PathBuf {
        self.dir.join(encode_file_name(self.tool, version))
    }

    /// Lists the installed versions.
    ///
    /// Files whose names do not decode to a version are skipped with a
    /// warning. Does not create the directory.
    ///
    /// # Errors
    ///
    /// Returns `CacheUnavailable` if the directory cannot be read.
    pub fn list_local_versions(&self) -> Result<BTreeSet<BinaryVersion>> {
        let unavailable = |e| ZkvvmError::cache_unavailable(&self.dir, e);
        let mut versions = BTreeSet::new();

        for entry in fs::read_dir(&self.dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 file name in cache");
                continue;
            };
            match decode_file_name(name) {
                Some(version) => {
                    versions.insert(BinaryVersion::local(version, entry.path()));
                }
                None => warn!(file = name, "skipping cache entry without a version"),
            }
        }

        Ok(versions)
    }

    /// Whether `version` is installed, under any file name.
    ///
    /// # Errors
    ///
    /// Returns `CacheUnavailable` if the directory cannot be read.
    pub fn contains(&self, version: &Version) -> Result<bool> {
        Ok(self
            .list_local_versions()?
            .iter()
            .any(|installed| &installed.version == version))
    }

    /// Takes the exclusive install lock for `version`.
    ///
    /// Blocks until other processes installing the same version release it.
    /// The lock is held until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `CacheUnavailable` if the lock file cannot be opened or locked.
    pub fn lock(&self, version: &Version) -> Result<InstallLock> {
        let locks = self.dir.join(LOCKS_DIR);
        fs::create_dir_all(&locks).map_err(|e| ZkvvmError::cache_unavailable(&locks, e))?;

        let path = locks.join(format!("{}.lock", encode_file_name(self.tool, version)));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ZkvvmError::cache_unavailable(&path, e))?;
        file.lock_exclusive()
            .map_err(|e| ZkvvmError::cache_unavailable(&path, e))?;
        debug!(path = %path.display(), "acquired install lock");
        Ok(InstallLock { _file: file })
    }

    /// Opens a staging file for `version`.
    ///
    /// The file is deleted when the returned value is dropped without being
    /// committed.
    ///
    /// # Errors
    ///
    /// Returns `InstallFailed` if the staging file cannot be created.
    pub fn stage(&self, version: &Version) -> Result<StagedArtifact> {
        let staging = self.dir.join(STAGING_DIR);
        fs::create_dir_all(&staging).map_err(|e| ZkvvmError::install_failed(version, e))?;

        let file = tempfile::Builder::new()
            .prefix(&format!("{}.", encode_file_name(self.tool, version)))
            .suffix(".partial")
            .tempfile_in(&staging)
            .map_err(|e| ZkvvmError::install_failed(version, e))?;

        Ok(StagedArtifact {
            file,
            version: version.clone(),
            destination: self.artifact_path(version),
        })
    }

    /// Writes `reader` into the cache as `version` and marks it executable.
    ///
    /// Nothing appears under the final name unless the whole stream was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns `InstallFailed` if reading, writing or renaming fails. The
    /// staging file is removed in that case.
    pub fn store<R: Read>(&self, version: &Version, mut reader: R) -> Result<PathBuf> {
        let mut staged = self.stage(version)?;
        io::copy(&mut reader, staged.writer()).map_err(|e| ZkvvmError::install_failed(version, e))?;
        staged.seal()?.commit()
    }

    /// Deletes the file backing `version`.
    ///
    /// A missing file is reported as [`RemoveOutcome::NotFound`] and logged,
    /// not raised.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be deleted.
    pub fn remove(&self, version: &BinaryVersion) -> Result<RemoveOutcome> {
        let path = match version.location.as_path() {
            Some(path) => path.to_path_buf(),
            None => self.artifact_path(&version.version),
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                info!(version = %version, path = %path.display(), "removed cached binary");
                Ok(RemoveOutcome::Removed(path))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(version = %version, path = %path.display(), "binary not found");
                Ok(RemoveOutcome::NotFound)
            }
            Err(e) => Err(ZkvvmError::io(
                format!("Failed to remove {}", path.display()),
                e,
            )),
        }
    }
}

/// Exclusive per-version install lock; released on drop.
#[derive(Debug)]
pub struct InstallLock {
    _file: File,
}

/// An artifact being written into the staging directory.
#[derive(Debug)]
pub struct StagedArtifact {
    file: NamedTempFile,
    version: Version,
    destination: PathBuf,
}

impl StagedArtifact {
    /// The open staging file.
    pub fn writer(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Flushes, closes and marks the staged file executable.
    ///
    /// The file handle must be closed before the binary can be executed.
    ///
    /// # Errors
    ///
    /// Returns `InstallFailed` if flushing or changing permissions fails.
    pub fn seal(mut self) -> Result<SealedArtifact> {
        let version = self.version;
        let file = self.file.as_file_mut();
        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|e| ZkvvmError::install_failed(&version, e))?;

        let path = self.file.into_temp_path();
        set_executable(&path).map_err(|e| ZkvvmError::install_failed(&version, e))?;

        Ok(SealedArtifact {
            path,
            version,
            destination: self.destination,
        })
    }
}

/// A fully written, executable artifact not yet visible in the cache.
#[derive(Debug)]
pub struct SealedArtifact {
    path: TempPath,
    version: Version,
    destination: PathBuf,
}

impl SealedArtifact {
    /// Where the staged binary currently lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically moves the artifact to its final name.
    ///
    /// # Errors
    ///
    /// Returns `InstallFailed` if the rename fails; the staging file is
    /// removed in that case.
    pub fn commit(self) -> Result<PathBuf> {
        self.path
            .persist(&self.destination)
            .map_err(|e| ZkvvmError::install_failed(&self.version, e.error))?;
        debug!(path = %self.destination.display(), "committed artifact");
        Ok(self.destination)
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
