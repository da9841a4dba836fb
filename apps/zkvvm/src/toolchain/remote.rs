//! Remote binary index.
//!
//! Binaries are published in a GitHub repository with one directory per
//! platform. The contents API returns a directory listing:
//!
//! ```json
//! [
//!   {
//!     "name": "zkvyper-linux-amd64-musl-v1.3.9",
//!     "type": "file",
//!     "download_url": "https://raw.githubusercontent.com/.../zkvyper-linux-amd64-musl-v1.3.9"
//!   }
//! ]
//! ```
//!
//! Only `type == "file"` entries are kept. The base URL can be overridden via
//! `ZKVVM_REMOTE_URL` for testing or using a mirror.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::platform::PlatformId;
use super::version::{BinaryVersion, decode_file_name};
use crate::errors::{Result, ZkvvmError};

/// Default location of the zkVyper binary directories.
pub const DEFAULT_REMOTE_URL: &str = "https://api.github.com/repos/matter-labs/zkvyper-bin/contents/";

/// Request timeout for index queries.
pub(crate) const INDEX_TIMEOUT_SECS: u64 = 30;

/// One entry of the directory listing.
#[derive(Debug, Clone, Deserialize)]
struct ListingEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// Read-only view of the remote binary directories.
#[derive(Debug, Clone)]
pub struct RemoteIndex {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteIndex {
    /// Creates an index rooted at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// URL of the listing for `platform`.
    #[must_use]
    pub fn listing_url(&self, platform: PlatformId) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/{platform}")
    }

    /// Fetches the versions published for `platform`.
    ///
    /// # Errors
    ///
    /// Returns `Network` on transport failure or a non-success status and
    /// `Parse` if the body is not a listing.
    pub async fn list_remote_versions(
        &self,
        platform: PlatformId,
    ) -> Result<BTreeSet<BinaryVersion>> {
        let url = self.listing_url(platform);
        debug!(url = %url, "fetching remote zkVyper versions");
        let body = get_text(&self.client, &url).await?;
        let versions = parse_listing(&body, &url)?;
        debug!(count = versions.len(), "found remote zkVyper versions");
        Ok(versions)
    }
}

/// Parses a directory listing into versions.
///
/// When two entries decode to the same version the first one in listing
/// order is kept.
pub(crate) fn parse_listing(body: &str, url: &str) -> Result<BTreeSet<BinaryVersion>> {
    let entries: Vec<ListingEntry> = serde_json::from_str(body)
        .map_err(|e| ZkvvmError::parse(format!("Failed to parse listing from {url}"), e))?;

    let mut versions = BTreeSet::new();
    for entry in entries {
        if entry.kind != "file" {
            continue;
        }
        let Some(version) = decode_file_name(&entry.name) else {
            warn!(name = %entry.name, "skipping remote entry without a version");
            continue;
        };
        let Some(download_url) = entry.download_url else {
            warn!(name = %entry.name, "skipping remote entry without a download URL");
            continue;
        };
        if !versions.insert(BinaryVersion::remote(version, download_url)) {
            debug!(name = %entry.name, "ignoring duplicate remote version");
        }
    }
    Ok(versions)
}

/// Performs a GET and returns the body, mapping failures to `Network`.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String> {
    get_text_if_found(client, url)
        .await?
        .ok_or_else(|| handle_http_error(reqwest::StatusCode::NOT_FOUND, url))
}

/// Like [`get_text`], but a 404 is `Ok(None)` instead of an error.
pub(crate) async fn get_text_if_found(client: &reqwest::Client, url: &str) -> Result<Option<String>> {
    let response = client
        .get(url)
        .timeout(Duration::from_secs(INDEX_TIMEOUT_SECS))
        .send()
        .await
        .map_err(|e| ZkvvmError::network_with_source(format!("Failed to fetch {url}"), e))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(handle_http_error(status, url));
    }

    response
        .text()
        .await
        .map(Some)
        .map_err(|e| ZkvvmError::network_with_source(format!("Failed to read response from {url}"), e))
}

/// Maps a non-success status to a `Network` error with a readable message.
pub(crate) fn handle_http_error(status: reqwest::StatusCode, url: &str) -> ZkvvmError {
    match status.as_u16() {
        404 => ZkvvmError::network(format!("Not found: {url}")),
        403 | 429 => ZkvvmError::network(format!("Rate limited ({status}): {url}")),
        code if code >= 500 => ZkvvmError::network(format!("Server error ({code}): {url}")),
        code => ZkvvmError::network(format!("HTTP error {code}: {url}")),
    }
}
