// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image load adapter: fetch and decode card images into drawable bitmaps.
//
// Sources are classified by scheme:
//   - `data:`      decoded in place (enhanced images arrive this way)
//   - `file://`    and bare paths, read from disk
//   - `http(s)://` fetched over the network, primary path first and a
//                  plainer fallback request if the primary path fails
//
// Decoding runs on the blocking pool so large scans don't stall the runtime.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_render::image::{ImageProcessor, parse_data_uri};
use image::{DynamicImage, ImageFormat};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, instrument, warn};

/// Anything that can turn an image URL into a decoded bitmap.
pub trait ImageLoader: Send + Sync {
    fn load(&self, url: &str) -> impl Future<Output = Result<DynamicImage>> + Send;
}

/// Where an image URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Inline,
    Local(PathBuf),
    Remote,
}

/// Classify `url` by scheme.
pub fn classify(url: &str) -> SourceKind {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("data:") {
        SourceKind::Inline
    } else if lower.starts_with("http://") || lower.starts_with("https://") {
        SourceKind::Remote
    } else if let Some(path) = url.strip_prefix("file://") {
        SourceKind::Local(PathBuf::from(path))
    } else {
        SourceKind::Local(PathBuf::from(url))
    }
}

/// Shortest request timeout a loader will use.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Image loader backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpImageLoader {
    client: reqwest::Client,
}

impl HttpImageLoader {
    /// Create a loader whose requests time out after `timeout`, at least
    /// [`MIN_TIMEOUT`].
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cardsheet/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout.max(MIN_TIMEOUT))
            .build()
            .map_err(|e| CardsheetError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the raw encoded bytes behind `url` without decoding them.
    #[instrument(skip_all, fields(url = %truncate(url)))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        match classify(url) {
            SourceKind::Inline => parse_data_uri(url)
                .map(|(_, data)| data)
                .ok_or_else(|| CardsheetError::image_load(truncate(url), "malformed data URI")),
            SourceKind::Local(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| CardsheetError::image_load(url, e)),
            SourceKind::Remote => {
                let response = self
                    .client
                    .get(url)
                    .header(ACCEPT, "image/*")
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| CardsheetError::image_load(url, e))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| CardsheetError::image_load(url, e))?;
                debug!(len = bytes.len(), "Fetched image bytes");
                Ok(bytes.to_vec())
            }
        }
    }

    /// Primary path: `Accept: image/*` request, format sniffed from content.
    async fn load_primary(&self, url: &str) -> Result<DynamicImage> {
        let bytes = self.fetch_bytes(url).await?;
        decode_blocking(url, bytes, None).await
    }

    /// Fallback path: plain request, format taken from `Content-Type` or the
    /// URL extension.
    async fn load_fallback(&self, url: &str) -> Result<DynamicImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CardsheetError::image_load(url, e))?;
        let format = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ImageFormat::from_mime_type(ct.split(';').next().unwrap_or(ct).trim()))
            .or_else(|| format_from_url(url));
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CardsheetError::image_load(url, e))?;
        decode_blocking(url, bytes.to_vec(), format).await
    }
}

impl ImageLoader for HttpImageLoader {
    #[instrument(skip_all, fields(url = %truncate(url)))]
    async fn load(&self, url: &str) -> Result<DynamicImage> {
        match classify(url) {
            SourceKind::Remote => match self.load_primary(url).await {
                Ok(img) => Ok(img),
                Err(primary) => {
                    warn!(error = %primary, "primary image load failed, trying fallback");
                    self.load_fallback(url).await.map_err(|fallback| {
                        CardsheetError::image_load(
                            url,
                            format!("primary: {primary}; fallback: {fallback}"),
                        )
                    })
                }
            },
            _ => {
                let bytes = self.fetch_bytes(url).await?;
                decode_blocking(url, bytes, None).await
            }
        }
    }
}

fn format_from_url(url: &str) -> Option<ImageFormat> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    ImageFormat::from_path(path).ok()
}

async fn decode_blocking(
    url: &str,
    bytes: Vec<u8>,
    format: Option<ImageFormat>,
) -> Result<DynamicImage> {
    let decoded = tokio::task::spawn_blocking(move || match format {
        Some(f) => ImageProcessor::from_bytes_with_format(&bytes, f),
        None => ImageProcessor::from_bytes(&bytes),
    })
    .await
    .map_err(|e| CardsheetError::image_load(truncate(url), format!("decoder task failed: {e}")))?;
    decoded
        .map(ImageProcessor::into_dynamic)
        .map_err(|e| CardsheetError::image_load(truncate(url), e))
}

/// Keep data URIs from flooding logs and error messages.
pub(crate) fn truncate(url: &str) -> &str {
    const MAX: usize = 96;
    if url.len() <= MAX {
        return url;
    }
    let mut end = MAX;
    while !url.is_char_boundary(end) {
        end -= 1;
    }
    &url[..end]
}
