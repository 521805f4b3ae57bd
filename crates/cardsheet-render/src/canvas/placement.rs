// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card placement: cover-fits a decoded card image into its slot, inset by
// the bleed, or paints a placeholder when the image could not be loaded.

use cardsheet_core::error::Result;
use cardsheet_core::units::mm_to_px;
use image::{DynamicImage, Rgba, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use tracing::{debug, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::layout::{LayoutMetrics, SlotRect};

use super::page::CanvasPage;

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([229, 229, 229, 255]);
const PLACEHOLDER_INK: Rgba<u8> = Rgba([153, 153, 153, 255]);

/// What ended up in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The card image was drawn into the inset rectangle.
    Drawn(SlotRect),
    /// The placeholder covers the full slot.
    Placeholder(SlotRect),
}

impl Placement {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// Bleed inset in device pixels: `round(mm_to_px(bleed) * scale)`.
pub fn bleed_inset_px(metrics: &LayoutMetrics, dpi: u32) -> u32 {
    (mm_to_px(metrics.bleed_mm, dpi) * metrics.scale).round() as u32
}

impl CanvasPage {
    /// Place a card in `position`. `None` (load failure) paints the
    /// placeholder instead; neither case fails the page.
    pub fn place_card(&mut self, position: u32, image: Option<DynamicImage>) -> Result<Placement> {
        match image {
            Some(img) => self.draw_card(position, img),
            None => self.draw_placeholder(position),
        }
    }

    /// Cover-fit `image` into the slot shrunk by the bleed inset.
    #[instrument(skip(self, image), fields(position, natural_w = image.width(), natural_h = image.height()))]
    pub fn draw_card(&mut self, position: u32, image: DynamicImage) -> Result<Placement> {
        let slot = self.slot(position)?;
        let inset = bleed_inset_px(&self.metrics, self.options.dpi);

        let Some(inner) = slot.inset(inset) else {
            warn!(position, inset, "bleed inset leaves no room for the card image");
            return Ok(Placement::Drawn(slot));
        };
        if image.width() == 0 || image.height() == 0 {
            warn!(position, "card image is empty, drawing placeholder");
            return self.draw_placeholder(position);
        }

        let fitted = ImageProcessor::from_dynamic(image)
            .cover_fit(inner.w, inner.h)
            .into_dynamic()
            .into_rgba8();
        imageops::overlay(&mut self.image, &fitted, i64::from(inner.x), i64::from(inner.y));

        debug!(?inner, "Card drawn");
        Ok(Placement::Drawn(inner))
    }

    /// Flat fill, border and diagonal cross over the full slot.
    pub fn draw_placeholder(&mut self, position: u32) -> Result<Placement> {
        let slot = self.slot(position)?;
        let Some(rect) = slot.to_rect() else {
            return Ok(Placement::Placeholder(slot));
        };
        draw_filled_rect_mut(&mut self.image, rect, PLACEHOLDER_FILL);

        let stroke = cardsheet_core::units::device_independent_px(self.options.dpi);
        for i in 0..stroke {
            if let Some(ring) = slot.inset(i).and_then(|r| r.to_rect()) {
                draw_hollow_rect_mut(&mut self.image, ring, PLACEHOLDER_INK);
            }
        }

        let (x0, y0) = (slot.x as f32, slot.y as f32);
        let (x1, y1) = ((slot.right() - 1) as f32, (slot.bottom() - 1) as f32);
        for d in 0..stroke as i32 {
            let d = d as f32;
            draw_line_segment_mut(&mut self.image, (x0 + d, y0), (x1, y1 - d), PLACEHOLDER_INK);
            draw_line_segment_mut(&mut self.image, (x1 - d, y0), (x0, y1 - d), PLACEHOLDER_INK);
        }

        debug!(position, ?slot, "Placeholder drawn");
        Ok(Placement::Placeholder(slot))
    }
}
