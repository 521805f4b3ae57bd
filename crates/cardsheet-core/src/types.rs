// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Cardsheet renderer.

use serde::{Deserialize, Serialize};

use crate::error::{CardsheetError, Result};
use crate::units::inches_to_mm;

/// Nominal trimmed card width (poker size).
pub const CARD_WIDTH_MM: f64 = 63.0;
/// Nominal trimmed card height (poker size).
pub const CARD_HEIGHT_MM: f64 = 88.0;

/// Cards per row on a sheet.
pub const GRID_COLUMNS: u32 = 3;
/// Cards per column on a sheet.
pub const GRID_ROWS: u32 = 3;
/// Cards per sheet side.
pub const CARDS_PER_PAGE: usize = (GRID_COLUMNS * GRID_ROWS) as usize;

/// Bounds applied to the printer shrink compensation factor.
pub const MIN_PRINT_SCALE: f64 = 0.95;
pub const MAX_PRINT_SCALE: f64 = 1.10;

/// Resolution used when an export asks for 0 DPI.
pub const DEFAULT_DPI: u32 = 300;

/// Supported paper presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    Letter,
}

impl PaperSize {
    /// Portrait dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (inches_to_mm(8.5), inches_to_mm(11.0)),
        }
    }
}

impl std::str::FromStr for PaperSize {
    type Err = CardsheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" | "us-letter" => Ok(Self::Letter),
            other => Err(CardsheetError::Config(format!("unknown paper size '{other}'"))),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Print options for one render call.
///
/// All lengths are in millimetres. Out-of-range values are clamped by
/// [`ExportOptions::normalized`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub dpi: u32,
    pub paper: PaperSize,
    pub orientation: Orientation,
    /// Extra image beyond the trim line on every card edge.
    pub bleed_mm: f64,
    /// Advisory minimum page margin; the grid is always centred.
    pub margin_mm: f64,
    /// Signed nudge applied to the whole grid to correct printer skew.
    pub alignment_offset_x_mm: f64,
    pub alignment_offset_y_mm: f64,
    /// Printer shrink compensation, clamped to [0.95, 1.10] when applied.
    pub print_scale_compensation: Option<f64>,
    pub draw_cut_margins: bool,
    pub upscale_enabled: bool,
    /// Annotate each slot with its computed physical size.
    pub debug_slot_sizes: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            bleed_mm: 0.0,
            margin_mm: 5.0,
            alignment_offset_x_mm: 0.0,
            alignment_offset_y_mm: 0.0,
            print_scale_compensation: None,
            draw_cut_margins: true,
            upscale_enabled: false,
            debug_slot_sizes: false,
        }
    }
}

impl ExportOptions {
    /// Physical page size in millimetres after applying orientation.
    pub fn page_size_mm(&self) -> (f64, f64) {
        let (w, h) = self.paper.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Clamp every field into its usable range.
    pub fn normalized(&self) -> Self {
        let non_negative = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            dpi: if self.dpi == 0 { DEFAULT_DPI } else { self.dpi },
            bleed_mm: non_negative(self.bleed_mm),
            margin_mm: non_negative(self.margin_mm),
            alignment_offset_x_mm: finite(self.alignment_offset_x_mm),
            alignment_offset_y_mm: finite(self.alignment_offset_y_mm),
            print_scale_compensation: self.print_scale_compensation.filter(|s| s.is_finite()),
            ..self.clone()
        }
    }

    /// The compensation factor actually applied to the grid.
    pub fn effective_scale(&self) -> f64 {
        self.print_scale_compensation
            .filter(|s| s.is_finite())
            .unwrap_or(1.0)
            .clamp(MIN_PRINT_SCALE, MAX_PRINT_SCALE)
    }
}

/// Which side of the physical sheet a layout page prints on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSide {
    #[default]
    Front,
    Back,
}

/// One card image reference on a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Marks the shared default card back; never enhanced on back pages.
    #[serde(default)]
    pub default_back: bool,
}

impl LayoutImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            default_back: false,
        }
    }

    pub fn named(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(url)
        }
    }

    /// A reference to the default card back asset.
    pub fn default_back(url: impl Into<String>) -> Self {
        Self {
            default_back: true,
            ..Self::new(url)
        }
    }

    /// Whether the source is already an inline `data:` URI.
    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }
}

/// One physical sheet side: up to nine images in row-major slot order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutPage {
    #[serde(default)]
    pub side: PageSide,
    pub images: Vec<LayoutImage>,
}

impl LayoutPage {
    pub fn new(side: PageSide, images: Vec<LayoutImage>) -> Result<Self> {
        let page = Self { side, images };
        page.validate()?;
        Ok(page)
    }

    pub fn front(images: Vec<LayoutImage>) -> Result<Self> {
        Self::new(PageSide::Front, images)
    }

    pub fn back(images: Vec<LayoutImage>) -> Result<Self> {
        Self::new(PageSide::Back, images)
    }

    /// Reject pages that hold more images than the grid has slots.
    pub fn validate(&self) -> Result<()> {
        if self.images.len() > CARDS_PER_PAGE {
            return Err(CardsheetError::Config(format!(
                "page holds {} images but a sheet has {CARDS_PER_PAGE} slots",
                self.images.len()
            )));
        }
        Ok(())
    }
}

/// Progress of an enhancement batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpscaleProgress {
    pub current: usize,
    pub total: usize,
    pub done: bool,
}
