#![warn(clippy::pedantic)]

//! Integration tests for the zkvvm CLI.
//!
//! These tests spawn the compiled `zkvvm` binary and validate its behavior
//! through stdout, stderr, exit codes and the contents of the cache
//! directory.
//!
//! ## Test Strategy
//!
//! 1. **Help and version**: CLI metadata display
//! 2. **ls**: Empty and populated caches, ordering
//! 3. **uninstall**: Confirmation prompt, `-y`, missing versions
//! 4. **install / ls-remote**: Against a local mock of the release index
//! 5. **Exit codes**: Configuration and network failures
//!
//! ## Test Infrastructure
//!
//! - Uses `assert_cmd` for spawning and asserting on command execution
//! - Uses `assert_fs` for temporary cache directories
//! - Uses `predicates` for flexible output matching
//! - Uses `mockito` to serve the release index and binaries
//!
//! Every test points `ZKVVM_CACHE_DIR` and `ZKVVM_LOG_FILE` into its own
//! temporary directory, so tests run in parallel without interference.

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// Environment variables that would leak host configuration into a test.
const ZKVVM_ENV: [&str; 7] = [
    "ZKVVM_ZK_VERSION",
    "ZKVVM_VYPER_VERSION",
    "ZKVVM_CACHE_DIR",
    "ZKVVM_LOG_FILE",
    "ZKVVM_VERBOSITY",
    "ZKVVM_REMOTE_URL",
    "ZKVVM_COMPANION_URL",
];

/// Builds a `zkvvm` command isolated to `temp`.
///
/// The cache lives in `temp/cache` and the log in `temp/zkvvm.log`. The
/// remote URLs point at a closed port unless a test overrides them.
fn zkvvm(temp: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zkvvm"));
    for key in ZKVVM_ENV {
        cmd.env_remove(key);
    }
    cmd.env("ZKVVM_CACHE_DIR", temp.path().join("cache"))
        .env("ZKVVM_LOG_FILE", temp.path().join("zkvvm.log"))
        .env("ZKVVM_REMOTE_URL", "http://127.0.0.1:9/contents/")
        .env("ZKVVM_COMPANION_URL", "http://127.0.0.1:9/releases")
        .env_remove("RUST_LOG");
    cmd
}

/// Places a file named like a cached binary into the cache.
fn seed_cache(temp: &assert_fs::TempDir, name: &str) {
    temp.child("cache").child(name).write_str("#!/bin/sh\n").unwrap();
}

// -----------------------------------------------------------------------------
// Help and Version
// -----------------------------------------------------------------------------

/// Verifies that `zkvvm --help` lists every subcommand.
#[test]
fn help_shows_available_commands() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zkvvm"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ls-remote"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("ZKVVM_CACHE_DIR"));
}

/// Verifies that running without a subcommand prints help and succeeds.
#[test]
fn no_subcommand_prints_help() {
    let temp = assert_fs::TempDir::new().unwrap();

    zkvvm(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

/// Verifies that `zkvvm --version` prints the package version.
#[test]
fn version_flag_shows_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zkvvm"));
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Verifies that `zkvvm version -v` shows build details.
#[test]
fn version_command_verbose_shows_commit() {
    let temp = assert_fs::TempDir::new().unwrap();

    zkvvm(&temp)
        .args(["version", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Commit:"))
        .stdout(predicate::str::contains("Platform:"));
}

// -----------------------------------------------------------------------------
// ls
// -----------------------------------------------------------------------------

/// Verifies that `zkvvm ls` on a fresh cache reports nothing installed.
#[test]
fn ls_on_empty_cache_reports_none() {
    let temp = assert_fs::TempDir::new().unwrap();

    zkvvm(&temp)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No local versions found."));

    temp.child("cache").assert(predicate::path::is_dir());
}

/// Verifies that `zkvvm ls` prints cached versions newest first and skips
/// unrelated files.
#[test]
fn ls_lists_newest_first() {
    let temp = assert_fs::TempDir::new().unwrap();
    seed_cache(&temp, "zkvyper-v1.0.0");
    seed_cache(&temp, "zkvyper-v1.10.0");
    seed_cache(&temp, "zkvyper-v1.2.0");
    seed_cache(&temp, "notes.txt");

    zkvvm(&temp)
        .arg("ls")
        .assert()
        .success()
        .stdout("1.10.0\n1.2.0\n1.0.0\n");
}

// -----------------------------------------------------------------------------
// uninstall
// -----------------------------------------------------------------------------

/// Verifies that uninstalling an absent version is reported, not an error.
#[test]
fn uninstall_missing_version_reports_not_found() {
    let temp = assert_fs::TempDir::new().unwrap();

    zkvvm(&temp)
        .args(["uninstall", "1.2.0", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version not found locally"));
}

/// Verifies that `-y` removes the binary without prompting.
#[test]
fn uninstall_with_yes_removes_binary() {
    let temp = assert_fs::TempDir::new().unwrap();
    seed_cache(&temp, "zkvyper-v1.2.0");

    zkvvm(&temp)
        .args(["uninstall", "1.2.0", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    temp.child("cache/zkvyper-v1.2.0")
        .assert(predicate::path::missing());
}

/// Verifies that declining the prompt keeps the binary.
#[test]
fn uninstall_declined_keeps_binary() {
    let temp = assert_fs::TempDir::new().unwrap();
    seed_cache(&temp, "zkvyper-v1.2.0");

    assert_cmd::Command::from_std(zkvvm(&temp))
        .args(["uninstall", "1.2.0"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Confirm [y/N]: "))
        .stdout(predicate::str::contains("Aborted."));

    temp.child("cache/zkvyper-v1.2.0")
        .assert(predicate::path::exists());
}

/// Verifies that answering `y` at the prompt removes the binary.
#[test]
fn uninstall_confirmed_removes_binary() {
    let temp = assert_fs::TempDir::new().unwrap();
    seed_cache(&temp, "zkvyper-v1.2.0");

    assert_cmd::Command::from_std(zkvvm(&temp))
        .args(["uninstall", "v1.2.0"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    temp.child("cache/zkvyper-v1.2.0")
        .assert(predicate::path::missing());
}

// -----------------------------------------------------------------------------
// Exit codes
// -----------------------------------------------------------------------------

/// Verifies that an invalid configuration value exits with code 7.
#[test]
fn invalid_config_exits_with_code_7() {
    let temp = assert_fs::TempDir::new().unwrap();

    zkvvm(&temp)
        .env("ZKVVM_VERBOSITY", "loud")
        .arg("ls")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("verbosity"));
}

/// Verifies that a log file that cannot be opened exits with code 4.
#[test]
fn unwritable_log_file_exits_with_code_4() {
    let temp = assert_fs::TempDir::new().unwrap();

    zkvvm(&temp)
        .arg("--log-file")
        .arg(temp.path())
        .arg("ls")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("log file"));
}

/// Verifies that an invalid uninstall argument is a generic failure.
#[test]
fn uninstall_rejects_non_version() {
    let temp = assert_fs::TempDir::new().unwrap();

    zkvvm(&temp)
        .args(["uninstall", "latest", "-y"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid version"));
}

// -----------------------------------------------------------------------------
// Remote commands
//
// These need a platform with published binaries and a shell to run the fake
// ones the mock server hands out.
// -----------------------------------------------------------------------------

#[cfg(any(all(target_os = "linux", target_arch = "x86_64"), target_os = "macos"))]
mod remote {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn listing(base: &str) -> String {
        format!(
            r#"[
                {{"name": "zkvyper-v1.0.0", "type": "file", "download_url": "{base}/dl/v1.0.0"}},
                {{"name": "zkvyper-v1.2.0", "type": "file", "download_url": "{base}/dl/v1.2.0"}},
                {{"name": "zkvyper-v2.0.0-beta.1", "type": "file", "download_url": "{base}/dl/v2.0.0-beta.1"}},
                {{"name": "archive", "type": "dir", "download_url": null}}
            ]"#
        )
    }

    fn serve_listing(server: &mut ServerGuard) -> mockito::Mock {
        let base = server.url();
        server
            .mock("GET", Matcher::Regex(r"^/contents/[a-z0-9-]+$".to_string()))
            .with_status(200)
            .with_body(listing(&base))
            .create()
    }

    fn remote_zkvvm(temp: &assert_fs::TempDir, server: &ServerGuard) -> Command {
        let mut cmd = zkvvm(temp);
        cmd.env("ZKVVM_REMOTE_URL", format!("{}/contents/", server.url()))
            .env("ZKVVM_COMPANION_URL", format!("{}/releases", server.url()));
        cmd
    }

    /// Verifies that `ls-remote` prints every published version, newest first.
    #[test]
    fn ls_remote_lists_published_versions() {
        let mut server = Server::new();
        let _listing = serve_listing(&mut server);
        let temp = assert_fs::TempDir::new().unwrap();

        remote_zkvvm(&temp, &server)
            .arg("ls-remote")
            .assert()
            .success()
            .stdout("2.0.0-beta.1\n1.2.0\n1.0.0\n");
    }

    /// Verifies that an unreachable index exits with the network code.
    #[test]
    fn ls_remote_unreachable_exits_with_code_3() {
        let temp = assert_fs::TempDir::new().unwrap();

        zkvvm(&temp).arg("ls-remote").assert().code(3);
    }

    /// Verifies that a constraint nothing satisfies is reported.
    #[test]
    fn install_unmatched_constraint_reports_unavailable() {
        let mut server = Server::new();
        let _listing = serve_listing(&mut server);
        let temp = assert_fs::TempDir::new().unwrap();
        seed_cache(&temp, "vyper/vyper-v0.3.3");

        remote_zkvvm(&temp, &server)
            .args(["install", ">=3.0.0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Version not available"));
    }

    /// Verifies the full install path: select the newest stable match,
    /// download it, verify it and place it in the cache.
    #[test]
    fn install_downloads_newest_stable_match() {
        let mut server = Server::new();
        let _listing = serve_listing(&mut server);
        let download = server
            .mock("GET", "/dl/v1.2.0")
            .with_status(200)
            .with_body("#!/bin/sh\necho 'zkvyper v1.2.0'\n")
            .expect(1)
            .create();
        let temp = assert_fs::TempDir::new().unwrap();
        seed_cache(&temp, "vyper/vyper-v0.3.3");

        remote_zkvvm(&temp, &server)
            .args(["install", ">=1.1.0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Installed zkvyper v1.2.0"));

        download.assert();
        temp.child("cache/zkvyper-v1.2.0")
            .assert(predicate::path::is_file());
        temp.child("cache/.staging")
            .assert(predicate::path::is_dir());

        remote_zkvvm(&temp, &server)
            .args(["install", "1.2.0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already installed"));
    }

    /// Verifies that the companion compiler is installed before zkVyper.
    #[test]
    fn install_fetches_companion_first() {
        let mut server = Server::new();
        let base = server.url();
        let _releases = server
            .mock("GET", "/releases/tags/v0.3.3")
            .with_status(200)
            .with_body(format!(
                r#"{{"tag_name": "v0.3.3", "assets": [
                    {{"name": "vyper.0.3.3+commit.48e326f0.darwin", "browser_download_url": "{base}/vyper"}},
                    {{"name": "vyper.0.3.3+commit.48e326f0.linux", "browser_download_url": "{base}/vyper"}}
                ]}}"#
            ))
            .create();
        let vyper = server
            .mock("GET", "/vyper")
            .with_status(200)
            .with_body("#!/bin/sh\necho '0.3.3+commit.48e326f0'\n")
            .expect(1)
            .create();
        let _listing = serve_listing(&mut server);
        let temp = assert_fs::TempDir::new().unwrap();

        remote_zkvvm(&temp, &server)
            .args(["install", ">=3.0.0"])
            .assert()
            .success();

        vyper.assert();
        temp.child("cache/vyper/vyper-v0.3.3")
            .assert(predicate::path::is_file());
    }

    /// Verifies that a binary failing verification exits with code 5 and
    /// leaves nothing in the cache.
    #[test]
    fn install_of_broken_binary_exits_with_code_5() {
        let mut server = Server::new();
        let _listing = serve_listing(&mut server);
        let _download = server
            .mock("GET", "/dl/v1.2.0")
            .with_status(200)
            .with_body("#!/bin/sh\nexit 1\n")
            .create();
        let temp = assert_fs::TempDir::new().unwrap();
        seed_cache(&temp, "vyper/vyper-v0.3.3");

        remote_zkvvm(&temp, &server)
            .args(["install", "1.2.0"])
            .assert()
            .code(5)
            .stderr(predicate::str::contains("binary did not execute"));

        temp.child("cache/zkvyper-v1.2.0")
            .assert(predicate::path::missing());
    }
}
