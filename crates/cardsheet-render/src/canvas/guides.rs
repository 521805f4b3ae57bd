// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cut guides: trim-line overlays on slot boundaries, plus the optional
// debug annotation of each slot's physical size.
//
// Guides sit exactly on slot edges (never on the bleed-inset edge), so the
// guides of two adjacent cards collapse into one line. Size labels are drawn
// into the raster as a tag box just above each slot, with the text set in
// the first system font found.

use std::sync::OnceLock;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use cardsheet_core::types::{CARDS_PER_PAGE, GRID_COLUMNS};
use cardsheet_core::units::{device_independent_px, mm_to_px, px_to_mm};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, warn};

use crate::layout::{SlotGeometry, SlotRect};

use super::page::CanvasPage;

/// Guides overhang the outer grid edge by this share of the grid extent.
pub const GUIDE_OVERHANG_RATIO: f64 = 0.02;

pub const GUIDE_COLOR: Rgba<u8> = Rgba([96, 96, 96, 255]);

pub const LABEL_BACKGROUND: Rgba<u8> = Rgba([255, 246, 196, 255]);
pub const LABEL_COLOR: Rgba<u8> = Rgba([32, 32, 32, 255]);

/// Label text height on paper.
const LABEL_TEXT_MM: f64 = 2.2;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

static LABEL_FONT: OnceLock<Option<FontVec>> = OnceLock::new();

/// Load the label font once; `None` when no candidate is readable.
fn label_font() -> Option<&'static FontVec> {
    LABEL_FONT
        .get_or_init(|| {
            let font = FONT_CANDIDATES.iter().find_map(|path| {
                let data = std::fs::read(path).ok()?;
                FontVec::try_from_vec(data).ok()
            });
            if font.is_none() {
                warn!("no system font found, size labels drawn without text");
            }
            font
        })
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// Constant x, spanning `start..end` in y.
    Vertical,
    /// Constant y, spanning `start..end` in x.
    Horizontal,
}

/// One trim line in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideLine {
    pub axis: GuideAxis,
    /// Boundary coordinate the line is centred on.
    pub position: i32,
    pub start: i32,
    pub end: i32,
    pub thickness: u32,
}

impl GuideLine {
    fn to_rect(self) -> Option<Rect> {
        let len = u32::try_from(self.end - self.start).ok().filter(|l| *l > 0)?;
        let lead = (self.thickness / 2) as i32;
        Some(match self.axis {
            GuideAxis::Vertical => {
                Rect::at(self.position - lead, self.start).of_size(self.thickness, len)
            }
            GuideAxis::Horizontal => {
                Rect::at(self.start, self.position - lead).of_size(len, self.thickness)
            }
        })
    }
}

/// Trim lines around the first `occupied` slots of the grid.
///
/// Lines are drawn across the bounding box of the occupied slots and extend
/// [`GUIDE_OVERHANG_RATIO`] beyond it on every side.
pub fn guide_lines(geometry: &SlotGeometry, dpi: u32, occupied: usize) -> Vec<GuideLine> {
    let occupied = occupied.min(CARDS_PER_PAGE) as u32;
    if occupied == 0 {
        return Vec::new();
    }
    let cols = occupied.min(GRID_COLUMNS);
    let rows = occupied.div_ceil(GRID_COLUMNS);
    let thickness = device_independent_px(dpi);

    let left = geometry.origin_x;
    let top = geometry.origin_y;
    let right = left + (cols * geometry.card_w) as i32;
    let bottom = top + (rows * geometry.card_h) as i32;
    let overhang_x = (f64::from(cols * geometry.card_w) * GUIDE_OVERHANG_RATIO).round() as i32;
    let overhang_y = (f64::from(rows * geometry.card_h) * GUIDE_OVERHANG_RATIO).round() as i32;

    let vertical = (0..=cols).map(|c| GuideLine {
        axis: GuideAxis::Vertical,
        position: left + (c * geometry.card_w) as i32,
        start: top - overhang_y,
        end: bottom + overhang_y,
        thickness,
    });
    let horizontal = (0..=rows).map(|r| GuideLine {
        axis: GuideAxis::Horizontal,
        position: top + (r * geometry.card_h) as i32,
        start: left - overhang_x,
        end: right + overhang_x,
        thickness,
    });
    vertical.chain(horizontal).collect()
}

/// Physical size annotation for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotLabel {
    pub position: u32,
    /// Anchor just above the slot's top-left corner, in page pixels.
    pub x_px: i32,
    pub y_px: i32,
    pub width_mm: f64,
    pub height_mm: f64,
    pub text: String,
}

/// Size labels for every slot.
///
/// The size is converted back from the final pixel slot size. It already
/// contains the print scale and must not be divided by it again.
pub fn slot_size_labels(geometry: &SlotGeometry, dpi: u32) -> Vec<SlotLabel> {
    geometry
        .slots()
        .into_iter()
        .zip(1u32..)
        .map(|(slot, position)| label_for(slot, position, dpi))
        .collect()
}

fn label_for(slot: SlotRect, position: u32, dpi: u32) -> SlotLabel {
    let width_mm = px_to_mm(f64::from(slot.w), dpi);
    let height_mm = px_to_mm(f64::from(slot.h), dpi);
    SlotLabel {
        position,
        x_px: slot.x,
        y_px: slot.y - device_independent_px(dpi) as i32 * 2,
        width_mm,
        height_mm,
        text: format!("{width_mm:.2} x {height_mm:.2} mm"),
    }
}

impl CanvasPage {
    /// Draw trim guides around the first `occupied` slots.
    pub fn draw_cut_guides(&mut self, occupied: usize) {
        let lines = guide_lines(&self.geometry, self.options.dpi, occupied);
        for rect in lines.iter().filter_map(|l| l.to_rect()) {
            draw_filled_rect_mut(&mut self.image, rect, GUIDE_COLOR);
        }
        debug!(count = lines.len(), "Cut guides drawn");
    }

    /// Draw size labels above the first `occupied` slots and keep them on
    /// the page for callers that report them.
    pub fn annotate_slot_sizes(&mut self, occupied: usize) {
        let dpi = self.options.dpi;
        self.labels = slot_size_labels(&self.geometry, dpi)
            .into_iter()
            .take(occupied)
            .collect();
        let font = label_font();
        for label in &self.labels {
            debug!(position = label.position, size = %label.text, "Slot size");
            draw_label(&mut self.image, label, dpi, font);
        }
    }
}

/// Paint one label as a tag box whose bottom edge sits on the label anchor.
fn draw_label(image: &mut RgbaImage, label: &SlotLabel, dpi: u32, font: Option<&FontVec>) {
    let text_px = mm_to_px(LABEL_TEXT_MM, dpi).max(6.0) as f32;
    let scale = PxScale::from(text_px);
    let text_w = match font {
        Some(f) => {
            let scaled = f.as_scaled(scale);
            label
                .text
                .chars()
                .map(|c| scaled.h_advance(scaled.glyph_id(c)))
                .sum::<f32>()
        }
        None => label.text.chars().count() as f32 * text_px * 0.55,
    };

    let pad = (text_px * 0.3).ceil() as i32;
    let box_w = text_w.ceil() as i32 + pad * 2;
    let box_h = text_px.ceil() as i32 + pad * 2;
    let x = label.x_px.max(0);
    let y = (label.y_px - box_h).max(0);
    let (Ok(w), Ok(h)) = (u32::try_from(box_w), u32::try_from(box_h)) else {
        return;
    };
    let rect = Rect::at(x, y).of_size(w.max(1), h.max(1));
    draw_filled_rect_mut(image, rect, LABEL_BACKGROUND);
    draw_hollow_rect_mut(image, rect, LABEL_COLOR);
    if let Some(f) = font {
        draw_text_mut(image, LABEL_COLOR, x + pad, y + pad, scale, f, &label.text);
    }
}
