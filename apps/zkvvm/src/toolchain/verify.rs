//! Post-download verification.
//!
//! A freshly downloaded binary is run with `--version` before it is moved into
//! the cache. It must exit successfully and print the version it was
//! installed as.

use std::path::Path;
use std::process::Command;

use semver::Version;
use tracing::{debug, error};

use crate::errors::{Result, ZkvvmError};

/// Reason given when the binary cannot be run or exits unsuccessfully.
pub const DID_NOT_EXECUTE: &str = "binary did not execute";

/// Reason given when the binary reports a different version.
pub const VERSION_MISMATCH: &str = "version mismatch";

/// Runs `binary --version` and checks that it reports `expected`.
///
/// # Errors
///
/// Returns `VerificationFailed` if the binary cannot be spawned, exits with a
/// non-zero status, or its standard output does not contain `expected`.
pub fn verify_binary(binary: &Path, expected: &Version) -> Result<()> {
    let output = Command::new(binary).arg("--version").output().map_err(|e| {
        error!(path = %binary.display(), error = %e, "downloaded binary would not execute");
        ZkvvmError::verification_failed(expected, DID_NOT_EXECUTE)
    })?;

    if !output.status.success() {
        error!(
            path = %binary.display(),
            status = %output.status,
            "downloaded binary exited unsuccessfully"
        );
        return Err(ZkvvmError::verification_failed(expected, DID_NOT_EXECUTE));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains(&expected.to_string()) {
        error!(
            expected = %expected,
            reported = %stdout.trim(),
            "downloaded binary reports a different version"
        );
        return Err(ZkvvmError::verification_failed(expected, VERSION_MISMATCH));
    }

    debug!(path = %binary.display(), version = %expected, "binary verified");
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    #[serial_test::serial]
    fn matching_version_passes() {
        let temp = tempfile::tempdir().unwrap();
        let bin = script(temp.path(), "ok", "echo 'Vyper to EraVM compiler v1.3.9'");
        assert!(verify_binary(&bin, &v("1.3.9")).is_ok());
    }

    #[test]
    #[serial_test::serial]
    fn nonzero_exit_fails_as_did_not_execute() {
        let temp = tempfile::tempdir().unwrap();
        let bin = script(temp.path(), "bad", "echo 1.3.9; exit 3");
        let err = verify_binary(&bin, &v("1.3.9")).unwrap_err();
        assert!(err.to_string().ends_with(DID_NOT_EXECUTE));
    }

    #[test]
    #[serial_test::serial]
    fn other_version_fails_as_mismatch() {
        let temp = tempfile::tempdir().unwrap();
        let bin = script(temp.path(), "other", "echo 'v1.3.8'");
        let err = verify_binary(&bin, &v("1.3.9")).unwrap_err();
        assert!(err.to_string().ends_with(VERSION_MISMATCH));
    }

    #[test]
    #[serial_test::serial]
    fn missing_binary_fails_as_did_not_execute() {
        let err = verify_binary(Path::new("/nonexistent/zkvyper"), &v("1.0.0")).unwrap_err();
        assert!(matches!(err, ZkvvmError::VerificationFailed { .. }));
    }
}
