// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement client: availability probe and single-image upscale calls
// against the local enhancement service.
//
// The client is stateless. Every call is one request/response exchange and
// nothing is retried; deduplication and failure policy live in the pipeline.

use std::future::Future;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardsheet_core::config::EnhancementConfig;
use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_render::image::{png_data_uri_from_base64, probe_dimensions};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::loader::{HttpImageLoader, truncate};

const UPSCALERS_PATH: &str = "/enhance-api/upscalers";
const EXTRA_SINGLE_IMAGE_PATH: &str = "/enhance-api/extra-single-image";

/// A service that can upscale one image at a time.
pub trait Enhancer: Send + Sync {
    /// Whether the service answers at all. Never fails; any problem is `false`.
    fn probe_availability(&self, cancel: &CancellationToken) -> impl Future<Output = bool> + Send;

    /// Upscale the image behind `url` and return it as a PNG data URI.
    fn enhance(
        &self,
        url: &str,
        params: &EnhanceParams,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String>> + Send;
}

// -- Parameters ---------------------------------------------------------------

/// Per-call enhancement parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceParams {
    pub factor: u32,
    pub max_dimension: u32,
    pub strength: f64,
    pub upscaler_1: String,
    pub upscaler_2: String,
    pub secondary_visibility: f64,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self::from(&EnhancementConfig::default())
    }
}

impl From<&EnhancementConfig> for EnhanceParams {
    fn from(config: &EnhancementConfig) -> Self {
        Self {
            factor: config.factor,
            max_dimension: config.max_dimension,
            strength: config.strength,
            upscaler_1: config.upscaler_1.clone(),
            upscaler_2: config.upscaler_2.clone(),
            secondary_visibility: config.secondary_visibility,
        }
    }
}

impl EnhanceParams {
    /// Output size for a `width` x `height` source: each axis multiplied by
    /// the factor and capped at `max_dimension`.
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let factor = self.factor.max(1);
        let cap = self.max_dimension.max(1);
        (
            width.saturating_mul(factor).min(cap),
            height.saturating_mul(factor).min(cap),
        )
    }
}

// -- Wire format --------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ExtraSingleImageRequest<'a> {
    image: &'a str,
    upscaling_resize: u32,
    upscaling_resize_w: u32,
    upscaling_resize_h: u32,
    upscaler_1: &'a str,
    upscaler_2: &'a str,
    extras_upscaler_2_visibility: f64,
    gfpgan_visibility: f64,
    codeformer_visibility: f64,
    upscale_first: bool,
    resize_mode: u8,
    denoising_strength: f64,
}

#[derive(Debug, Deserialize)]
struct ExtraSingleImageResponse {
    #[serde(default)]
    image: Option<String>,
}

// -- Client -------------------------------------------------------------------

/// HTTP client for the local enhancement service.
pub struct EnhancementClient {
    client: reqwest::Client,
    loader: HttpImageLoader,
    base_url: String,
    probe_timeout: Duration,
}

impl EnhancementClient {
    pub fn new(config: &EnhancementConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cardsheet/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| CardsheetError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self {
            loader: HttpImageLoader::with_client(client.clone()),
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs.max(1)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn probe(&self) -> bool {
        let response = match self
            .client
            .get(self.endpoint(UPSCALERS_PATH))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "Enhancement service unreachable");
                return false;
            }
        };
        if !response.status().is_success() {
            debug!(status = %response.status(), "Enhancement probe rejected");
            return false;
        }
        match response.json::<serde_json::Value>().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Enhancement probe returned non-JSON body");
                false
            }
        }
    }

    async fn enhance_once(&self, url: &str, params: &EnhanceParams) -> Result<String> {
        let source = self
            .loader
            .fetch_bytes(url)
            .await
            .map_err(|e| CardsheetError::enhancement(truncate(url), e))?;
        let (width, height) =
            probe_dimensions(&source).map_err(|e| CardsheetError::enhancement(truncate(url), e))?;
        let (target_w, target_h) = params.target_size(width, height);
        let encoded = STANDARD.encode(&source);

        let body = ExtraSingleImageRequest {
            image: &encoded,
            upscaling_resize: params.factor.max(1),
            upscaling_resize_w: target_w,
            upscaling_resize_h: target_h,
            upscaler_1: &params.upscaler_1,
            upscaler_2: &params.upscaler_2,
            extras_upscaler_2_visibility: params.secondary_visibility,
            gfpgan_visibility: 0.0,
            codeformer_visibility: 0.0,
            upscale_first: true,
            resize_mode: 0,
            denoising_strength: params.strength,
        };
        debug!(width, height, target_w, target_h, "Submitting enhancement job");

        let response = self
            .client
            .post(self.endpoint(EXTRA_SINGLE_IMAGE_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| CardsheetError::enhancement(truncate(url), e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CardsheetError::enhancement(
                truncate(url),
                format!("service returned {status}"),
            ));
        }

        let parsed: ExtraSingleImageResponse = response
            .json()
            .await
            .map_err(|e| CardsheetError::enhancement(truncate(url), e))?;
        let payload = parsed
            .image
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CardsheetError::enhancement(truncate(url), "response has no image"))?;
        // Some builds answer with a full data URI instead of bare base64.
        let payload = match payload.split_once(',') {
            Some((header, rest)) if header.starts_with("data:") => rest.trim().to_string(),
            _ => payload.trim().to_string(),
        };
        if STANDARD.decode(&payload).is_err() {
            return Err(CardsheetError::enhancement(
                truncate(url),
                "response image is not valid base64",
            ));
        }
        Ok(png_data_uri_from_base64(&payload))
    }
}

impl Enhancer for EnhancementClient {
    #[instrument(skip_all, fields(base_url = %self.base_url))]
    async fn probe_availability(&self, cancel: &CancellationToken) -> bool {
        let available = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            ok = self.probe() => ok,
        };
        if available {
            info!("Enhancement service available");
        } else {
            warn!("Enhancement service not available");
        }
        available
    }

    #[instrument(skip_all, fields(url = %truncate(url)))]
    async fn enhance(
        &self,
        url: &str,
        params: &EnhanceParams,
        cancel: &CancellationToken,
    ) -> Result<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CardsheetError::Cancelled),
            result = self.enhance_once(url, params) => result,
        }
    }
}
