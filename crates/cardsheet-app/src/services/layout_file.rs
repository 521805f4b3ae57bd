// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout files: the JSON batch of sheet sides handed to `cardsheet render`.
//
//   { "pages": [ { "side": "front", "images": [ { "url": "..." } ] } ] }

use std::path::Path;

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_core::types::LayoutPage;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutFile {
    pub pages: Vec<LayoutPage>,
}

impl LayoutFile {
    /// Parse and validate a layout from JSON text.
    pub fn parse(json: &str) -> Result<Self> {
        let layout: Self = serde_json::from_str(json)?;
        if layout.pages.is_empty() {
            return Err(CardsheetError::Config("layout has no pages".into()));
        }
        for (index, page) in layout.pages.iter().enumerate() {
            page.validate().map_err(|e| {
                CardsheetError::Config(format!("page {}: {e}", index + 1))
            })?;
        }
        Ok(layout)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let layout = Self::parse(&json)?;
        info!(
            path = %path.display(),
            pages = layout.pages.len(),
            "loaded layout"
        );
        Ok(layout)
    }
}
