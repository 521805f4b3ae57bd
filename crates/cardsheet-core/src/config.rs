// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CardsheetError, Result};
use crate::types::ExportOptions;

const CONFIG_FILE: &str = "config.json";

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default export options; command-line flags override individual fields.
    pub export: ExportOptions,
    pub enhancement: EnhancementConfig,
}

/// Settings for the local image enhancement service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,
    pub probe_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Primary upscaler model name.
    pub upscaler_1: String,
    /// Secondary upscaler blended in at `secondary_visibility`.
    pub upscaler_2: String,
    pub secondary_visibility: f64,
    /// Denoise strength; kept low so card text stays crisp.
    pub strength: f64,
    /// Enlargement factor per axis.
    pub factor: u32,
    /// Upper bound for either output axis in pixels.
    pub max_dimension: u32,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7860".into(),
            probe_timeout_secs: 5,
            request_timeout_secs: 180,
            upscaler_1: "R-ESRGAN 4x+".into(),
            upscaler_2: "ESRGAN_4x".into(),
            secondary_visibility: 0.4,
            strength: 0.12,
            factor: 2,
            max_dimension: 4096,
        }
    }
}

impl AppConfig {
    /// Load the config from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config = serde_json::from_str(&data).map_err(|err| {
            CardsheetError::Config(format!("{}: {err}", path.display()))
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Write the config as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/cardsheet/config.json`, falling back to `~/.config`.
pub fn default_config_path() -> PathBuf {
    config_base().join("cardsheet").join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"export":{"dpi":600,"paper":"letter"},"enhancement":{"base_url":"http://gpu-box:7860"}}"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.export.dpi, 600);
        assert_eq!(config.export.paper, crate::PaperSize::Letter);
        assert!(config.export.draw_cut_margins);
        assert_eq!(config.enhancement.base_url, "http://gpu-box:7860");
        assert_eq!(config.enhancement.strength, 0.12);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(CardsheetError::Config(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.export.bleed_mm = 3.0;
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(Some(&path)).unwrap(), config);
    }
}
