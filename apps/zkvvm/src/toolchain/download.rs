//! HTTP artifact transfer.
//!
//! Streams a download into an open writer. When a progress callback is given
//! and the server declares a `Content-Length`, chunks are written as they
//! arrive and reported; otherwise the whole body is buffered and written in
//! one step. Retrying is left to the caller.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;

use crate::errors::{BoxError, ZkvvmError};

/// Progress event emitted during downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Transfer has started.
    Started {
        /// Total size in bytes, if the server declared one.
        total: Option<u64>,
    },
    /// Transfer progress update.
    Progress {
        /// Bytes received so far.
        downloaded: u64,
        /// Total size in bytes, if known.
        total: Option<u64>,
    },
    /// Transfer finished.
    Completed,
}

/// Callback receiving [`ProgressEvent`]s. Purely observational.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Request timeout for artifact downloads in seconds.
pub(crate) const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress callback invocations in milliseconds.
const PROGRESS_CALLBACK_INTERVAL_MS: u128 = 100;

/// Error raised while transferring an artifact.
///
/// Kept separate from [`ZkvvmError`] so the installer can wrap it as the
/// source of an `InstallFailed`.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Request or body read failed.
    #[error(transparent)]
    Network(#[from] ZkvvmError),
    /// Writing to the destination failed.
    #[error("failed to write artifact: {0}")]
    Write(#[from] std::io::Error),
}

impl TransferError {
    /// Converts into a boxed error suitable as an error source.
    pub fn into_boxed(self) -> BoxError {
        Box::new(self)
    }
}

/// Downloads `url` into `dest`, returning the number of bytes written.
///
/// # Errors
///
/// Returns `TransferError::Network` for transport failures or non-success
/// status codes and `TransferError::Write` if writing fails.
pub async fn download_to<W: Write>(
    client: &reqwest::Client,
    url: &str,
    dest: &mut W,
    progress: Option<&ProgressCallback>,
) -> Result<u64, TransferError> {
    let response = client
        .get(url)
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .send()
        .await
        .map_err(|e| ZkvvmError::network_with_source(format!("Failed to connect to {url}"), e))?;

    if !response.status().is_success() {
        return Err(super::remote::handle_http_error(response.status(), url).into());
    }

    let total = response.content_length();
    let downloaded = match (progress, total) {
        (Some(callback), Some(total)) => stream_with_callback(response, url, dest, callback, total).await?,
        _ => {
            let body = response.bytes().await.map_err(|e| {
                ZkvvmError::network_with_source(format!("Failed to read body from {url}"), e)
            })?;
            dest.write_all(&body)?;
            body.len() as u64
        }
    };

    dest.flush()?;
    if let Some(callback) = progress {
        callback(ProgressEvent::Completed);
    }
    Ok(downloaded)
}

/// Writes the body chunk by chunk, reporting progress at most every
/// [`PROGRESS_CALLBACK_INTERVAL_MS`].
async fn stream_with_callback<W: Write>(
    response: reqwest::Response,
    url: &str,
    dest: &mut W,
    callback: &ProgressCallback,
    total: u64,
) -> Result<u64, TransferError> {
    callback(ProgressEvent::Started { total: Some(total) });

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_callback_time = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            ZkvvmError::network_with_source(format!("Failed to read chunk from {url}"), e)
        })?;
        dest.write_all(&chunk)?;
        downloaded += chunk.len() as u64;

        let now = Instant::now();
        if now.duration_since(last_callback_time).as_millis() >= PROGRESS_CALLBACK_INTERVAL_MS {
            callback(ProgressEvent::Progress {
                downloaded,
                total: Some(total),
            });
            last_callback_time = now;
        }
    }

    callback(ProgressEvent::Progress {
        downloaded,
        total: Some(total),
    });
    Ok(downloaded)
}

/// Formats bytes into a human-readable string (KB, MB, GB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::sync::Mutex;

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        });
        (callback, events)
    }

    #[tokio::test]
    async fn buffered_download_writes_whole_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/bin")
            .with_status(200)
            .with_body("binary-bytes")
            .create_async()
            .await;

        let mut out = Vec::new();
        let url = format!("{}/bin", server.url());
        let n = download_to(&reqwest::Client::new(), &url, &mut out, None)
            .await
            .unwrap();

        assert_eq!(n, 12);
        assert_eq!(out, b"binary-bytes");
    }

    #[tokio::test]
    async fn progress_is_reported_when_length_is_known() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/bin")
            .with_status(200)
            .with_body(vec![7u8; 4096])
            .create_async()
            .await;

        let (callback, events) = recorder();
        let mut out = Vec::new();
        let url = format!("{}/bin", server.url());
        download_to(&reqwest::Client::new(), &url, &mut out, Some(&callback))
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.first(), Some(&ProgressEvent::Started { total: Some(4096) }));
        assert!(events.contains(&ProgressEvent::Progress {
            downloaded: 4096,
            total: Some(4096)
        }));
        assert_eq!(events.last(), Some(&ProgressEvent::Completed));
        assert_eq!(out.len(), 4096);
    }

    #[tokio::test]
    async fn http_error_is_reported_as_network_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let mut out = Vec::new();
        let url = format!("{}/missing", server.url());
        let err = download_to(&reqwest::Client::new(), &url, &mut out, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransferError::Network(ZkvvmError::Network { .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
