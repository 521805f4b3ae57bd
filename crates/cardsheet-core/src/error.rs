// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Cardsheet.

use thiserror::Error;

/// Top-level error type for all Cardsheet operations.
#[derive(Debug, Error)]
pub enum CardsheetError {
    // -- Layout / configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Slot positions are 1-based and limited to the 3x3 grid.
    #[error("invalid slot position {0} (expected 1..=9)")]
    InvalidPosition(u32),

    // -- Images --
    #[error("failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },

    // -- Enhancement service --
    #[error("enhancement service unavailable: {0}")]
    EnhancementUnavailable(String),

    #[error("enhancement failed for {url}: {reason}")]
    Enhancement { url: String, reason: String },

    // -- Output --
    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("operation cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CardsheetError {
    /// Shorthand for an [`CardsheetError::ImageLoad`] error.
    pub fn image_load(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ImageLoad {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for an [`CardsheetError::Enhancement`] error.
    pub fn enhancement(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Enhancement {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CardsheetError>;
