// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cardsheet-render: Layout-to-pixel rendering for Cardsheet.
//
// Derives physical sheet metrics from export options, maps grid positions to
// pixel slots, rasterises cards with bleed-aware cover-fit and placeholders,
// draws cut guides, and encodes finished pages as PNG or PDF.

pub mod canvas;
pub mod image;
pub mod layout;
pub mod pdf;

// Re-export the primary structs so callers can use `cardsheet_render::CanvasPage` etc.
pub use canvas::{CanvasPage, Placement};
pub use crate::image::processor::ImageProcessor;
pub use layout::{LayoutMetrics, SlotGeometry, SlotRect};
pub use pdf::writer::PdfWriter;
