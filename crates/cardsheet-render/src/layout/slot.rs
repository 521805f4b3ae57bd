// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Slot geometry: maps grid positions 1..=9 to pixel rectangles.
//
// The grid origin and the card size are each rounded to whole pixels exactly
// once; every slot is then an integer multiple of the card size away from
// the origin. Adjacent slots therefore share an edge with no gap or overlap.

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_core::types::{CARDS_PER_PAGE, GRID_COLUMNS, GRID_ROWS};
use cardsheet_core::units::mm_to_px;
use imageproc::rect::Rect;

use super::metrics::LayoutMetrics;

/// A pixel rectangle on the page raster. `x`/`y` may be negative when an
/// alignment offset pushes the grid past the page edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl SlotRect {
    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    /// Shrink by `px` on every side. `None` when nothing is left.
    pub fn inset(&self, px: u32) -> Option<SlotRect> {
        let w = self.w.checked_sub(px.saturating_mul(2))?;
        let h = self.h.checked_sub(px.saturating_mul(2))?;
        if w == 0 || h == 0 {
            return None;
        }
        Some(SlotRect {
            x: self.x + px as i32,
            y: self.y + px as i32,
            w,
            h,
        })
    }

    pub fn intersects(&self, other: &SlotRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// `imageproc` rectangle for drawing. `None` for empty rectangles.
    pub fn to_rect(&self) -> Option<Rect> {
        (self.w > 0 && self.h > 0).then(|| Rect::at(self.x, self.y).of_size(self.w, self.h))
    }
}

/// Pixel origin and card size for one page, rounded once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGeometry {
    pub origin_x: i32,
    pub origin_y: i32,
    pub card_w: u32,
    pub card_h: u32,
}

impl SlotGeometry {
    pub fn new(metrics: &LayoutMetrics, dpi: u32) -> Self {
        Self {
            origin_x: mm_to_px(metrics.margin_x_mm + metrics.offset_x_mm, dpi).round() as i32,
            origin_y: mm_to_px(metrics.margin_y_mm + metrics.offset_y_mm, dpi).round() as i32,
            card_w: (mm_to_px(metrics.card_width_mm, dpi) * metrics.scale).round() as u32,
            card_h: (mm_to_px(metrics.card_height_mm, dpi) * metrics.scale).round() as u32,
        }
    }

    /// Rectangle for the 1-based, row-major `position`.
    pub fn slot(&self, position: u32) -> Result<SlotRect> {
        if !(1..=CARDS_PER_PAGE as u32).contains(&position) {
            return Err(CardsheetError::InvalidPosition(position));
        }
        let index = position - 1;
        let col = index % GRID_COLUMNS;
        let row = index / GRID_COLUMNS;
        Ok(SlotRect {
            x: self.origin_x + (col * self.card_w) as i32,
            y: self.origin_y + (row * self.card_h) as i32,
            w: self.card_w,
            h: self.card_h,
        })
    }

    /// All nine slots in row-major order.
    pub fn slots(&self) -> Vec<SlotRect> {
        (1..=CARDS_PER_PAGE as u32)
            .filter_map(|p| self.slot(p).ok())
            .collect()
    }

    /// Bounding rectangle of the full grid.
    pub fn grid_rect(&self) -> SlotRect {
        SlotRect {
            x: self.origin_x,
            y: self.origin_y,
            w: self.card_w * GRID_COLUMNS,
            h: self.card_h * GRID_ROWS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsheet_core::types::{ExportOptions, Orientation, PaperSize};

    fn geometry(opts: &ExportOptions) -> SlotGeometry {
        SlotGeometry::new(&LayoutMetrics::from_options(opts), opts.dpi)
    }

    #[test]
    fn out_of_range_positions_fail_loudly() {
        let g = geometry(&ExportOptions::default());
        assert!(matches!(g.slot(0), Err(CardsheetError::InvalidPosition(0))));
        assert!(matches!(g.slot(10), Err(CardsheetError::InvalidPosition(10))));
        assert!(g.slot(1).is_ok());
        assert!(g.slot(9).is_ok());
    }

    #[test]
    fn a4_300dpi_reference_positions() {
        let g = geometry(&ExportOptions::default());
        // 10.5 mm and 16.5 mm margins at 300 DPI.
        assert_eq!(g.slot(1).unwrap(), SlotRect { x: 124, y: 195, w: 744, h: 1039 });
        assert_eq!(g.slot(5).unwrap(), SlotRect { x: 868, y: 1234, w: 744, h: 1039 });
        assert_eq!(g.slot(9).unwrap().right(), 124 + 3 * 744);
    }

    #[test]
    fn slots_tile_without_gaps_or_overlaps() {
        for dpi in [72, 150, 300, 301, 600, 1200] {
            for bleed_mm in [0.0, 0.5, 1.0, 2.75, 3.0] {
                for scale in [None, Some(0.95), Some(0.987), Some(1.03), Some(1.10)] {
                    for paper in [PaperSize::A4, PaperSize::Letter] {
                        let opts = ExportOptions {
                            dpi,
                            bleed_mm,
                            paper,
                            print_scale_compensation: scale,
                            alignment_offset_x_mm: 0.37,
                            alignment_offset_y_mm: -1.1,
                            ..Default::default()
                        };
                        let slots = geometry(&opts).slots();
                        assert_eq!(slots.len(), 9);

                        for s in &slots {
                            assert_eq!((s.w, s.h), (slots[0].w, slots[0].h));
                        }
                        for row in 0..3 {
                            for col in 0..2 {
                                let a = slots[row * 3 + col];
                                let b = slots[row * 3 + col + 1];
                                assert_eq!(a.right(), b.x);
                                assert_eq!(a.y, b.y);
                            }
                        }
                        for col in 0..3 {
                            for row in 0..2 {
                                let a = slots[row * 3 + col];
                                let b = slots[(row + 1) * 3 + col];
                                assert_eq!(a.bottom(), b.y);
                                assert_eq!(a.x, b.x);
                            }
                        }
                        for (i, a) in slots.iter().enumerate() {
                            for b in &slots[i + 1..] {
                                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn negative_offset_can_push_origin_off_page() {
        let opts = ExportOptions {
            orientation: Orientation::Landscape,
            alignment_offset_y_mm: -2.0,
            ..Default::default()
        };
        // Landscape A4 has no vertical margin, so the offset goes negative.
        assert!(geometry(&opts).slot(1).unwrap().y < 0);
    }

    #[test]
    fn inset_shrinks_every_side() {
        let r = SlotRect { x: 10, y: 20, w: 100, h: 50 };
        assert_eq!(r.inset(5), Some(SlotRect { x: 15, y: 25, w: 90, h: 40 }));
        assert_eq!(r.inset(25), None);
        assert_eq!(r.inset(0), Some(r));
    }
}
