// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canvas page: one pixel-accurate raster per physical sheet side.

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_core::types::ExportOptions;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, instrument};

use crate::image::data_uri::encode_data_uri;
use crate::image::processor::encode_to_format;
use crate::layout::{LayoutMetrics, SlotGeometry, SlotRect};

use super::guides::SlotLabel;

/// Upper bound for a single page buffer (RGBA bytes).
const MAX_CANVAS_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Default page background.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A page raster together with the metrics snapshot it was built from.
///
/// Created once per logical page at render time and discarded after
/// encoding.
#[derive(Debug, Clone)]
pub struct CanvasPage {
    pub(crate) image: RgbaImage,
    pub(crate) options: ExportOptions,
    pub(crate) metrics: LayoutMetrics,
    pub(crate) geometry: SlotGeometry,
    pub(crate) labels: Vec<SlotLabel>,
}

impl CanvasPage {
    /// Allocate a page raster sized `round(page_inches * dpi)` and fill it
    /// with `background`.
    #[instrument(skip(options), fields(dpi = options.dpi, paper = ?options.paper))]
    pub fn new(options: &ExportOptions, background: Rgba<u8>) -> Result<Self> {
        let options = options.normalized();
        let metrics = LayoutMetrics::from_options(&options);
        let (width, height) = metrics.page_size_px(options.dpi);

        let bytes = u64::from(width) * u64::from(height) * 4;
        if width == 0 || height == 0 || bytes > MAX_CANVAS_BYTES {
            return Err(CardsheetError::Config(format!(
                "cannot allocate a {width}x{height} page at {} DPI",
                options.dpi
            )));
        }

        let image = RgbaImage::from_pixel(width, height, background);
        let geometry = SlotGeometry::new(&metrics, options.dpi);
        debug!(width, height, ?geometry, "Canvas allocated");

        Ok(Self {
            image,
            options,
            metrics,
            geometry,
            labels: Vec::new(),
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }

    pub fn dpi(&self) -> u32 {
        self.options.dpi
    }

    /// The normalized options this page was built with.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn geometry(&self) -> &SlotGeometry {
        &self.geometry
    }

    /// Rectangle of the 1-based grid `position`.
    pub fn slot(&self, position: u32) -> Result<SlotRect> {
        self.geometry.slot(position)
    }

    /// Physical page size in inches, for encoders.
    pub fn page_size_inches(&self) -> (f64, f64) {
        (
            cardsheet_core::units::mm_to_inches(self.metrics.page_width_mm),
            cardsheet_core::units::mm_to_inches(self.metrics.page_height_mm),
        )
    }

    /// Debug size annotations collected by `annotate_slot_sizes`.
    pub fn labels(&self) -> &[SlotLabel] {
        &self.labels
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the page as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        // The page is opaque; dropping alpha roughly quarters PNG size.
        let rgb = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(self.image.clone()).to_rgb8());
        encode_to_format(&rgb, ImageFormat::Png)
    }

    /// Encode the page as a `data:image/png;base64,...` URI.
    pub fn to_data_uri(&self) -> Result<String> {
        Ok(encode_data_uri("image/png", &self.to_png_bytes()?))
    }
}
