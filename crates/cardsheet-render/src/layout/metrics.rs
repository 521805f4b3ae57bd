// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout metrics: the single physical description of a sheet derived from
// `ExportOptions`. Every later stage (slots, canvas, guides) reads from this
// record and never recomputes physical sizes on its own.

use cardsheet_core::types::{
    CARD_HEIGHT_MM, CARD_WIDTH_MM, ExportOptions, GRID_COLUMNS, GRID_ROWS,
};
use cardsheet_core::units::mm_to_px;
use tracing::{debug, warn};

/// Physical geometry of one sheet, all lengths in millimetres.
///
/// Built once per render call by [`LayoutMetrics::from_options`] and never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    /// Card width including bleed on both sides.
    pub card_width_mm: f64,
    /// Card height including bleed on both sides.
    pub card_height_mm: f64,
    pub bleed_mm: f64,
    /// Centering margin left of the scaled grid (never negative).
    pub margin_x_mm: f64,
    /// Centering margin above the scaled grid (never negative).
    pub margin_y_mm: f64,
    pub offset_x_mm: f64,
    pub offset_y_mm: f64,
    /// Printer shrink compensation, always within [0.95, 1.10].
    pub scale: f64,
}

impl LayoutMetrics {
    /// Derive the metrics for `options`. Never fails: inputs are clamped.
    pub fn from_options(options: &ExportOptions) -> Self {
        let options = options.normalized();
        let (page_width_mm, page_height_mm) = options.page_size_mm();

        let bleed_mm = options.bleed_mm;
        let card_width_mm = CARD_WIDTH_MM + 2.0 * bleed_mm;
        let card_height_mm = CARD_HEIGHT_MM + 2.0 * bleed_mm;
        let scale = options.effective_scale();

        let grid_w = f64::from(GRID_COLUMNS) * card_width_mm * scale;
        let grid_h = f64::from(GRID_ROWS) * card_height_mm * scale;

        // A grid larger than the page is clipped, not shrunk further.
        let margin_x_mm = ((page_width_mm - grid_w) / 2.0).max(0.0);
        let margin_y_mm = ((page_height_mm - grid_h) / 2.0).max(0.0);

        if grid_w > page_width_mm || grid_h > page_height_mm {
            warn!(
                grid_w,
                grid_h, page_width_mm, page_height_mm, "card grid overflows the page and will be clipped"
            );
        } else if margin_x_mm < options.margin_mm || margin_y_mm < options.margin_mm {
            warn!(
                margin_x_mm,
                margin_y_mm,
                requested = options.margin_mm,
                "card grid intrudes into the requested page margin"
            );
        }

        let metrics = Self {
            page_width_mm,
            page_height_mm,
            card_width_mm,
            card_height_mm,
            bleed_mm,
            margin_x_mm,
            margin_y_mm,
            offset_x_mm: options.alignment_offset_x_mm,
            offset_y_mm: options.alignment_offset_y_mm,
            scale,
        };
        debug!(?metrics, "layout metrics computed");
        metrics
    }

    /// Scaled width of the full 3-column grid.
    pub fn grid_width_mm(&self) -> f64 {
        f64::from(GRID_COLUMNS) * self.card_width_mm * self.scale
    }

    /// Scaled height of the full 3-row grid.
    pub fn grid_height_mm(&self) -> f64 {
        f64::from(GRID_ROWS) * self.card_height_mm * self.scale
    }

    /// Page size in device pixels at `dpi`, rounded once.
    pub fn page_size_px(&self, dpi: u32) -> (u32, u32) {
        (
            mm_to_px(self.page_width_mm, dpi).round() as u32,
            mm_to_px(self.page_height_mm, dpi).round() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsheet_core::types::{Orientation, PaperSize};

    const EPS: f64 = 1e-9;

    fn options(paper: PaperSize, bleed_mm: f64, scale: Option<f64>) -> ExportOptions {
        ExportOptions {
            paper,
            bleed_mm,
            print_scale_compensation: scale,
            ..Default::default()
        }
    }

    #[test]
    fn a4_no_bleed_is_centered() {
        let m = LayoutMetrics::from_options(&options(PaperSize::A4, 0.0, None));
        assert_eq!(m.card_width_mm, 63.0);
        assert_eq!(m.card_height_mm, 88.0);
        assert!((m.margin_x_mm - 10.5).abs() < EPS);
        assert!((m.margin_y_mm - 16.5).abs() < EPS);
        assert_eq!(m.scale, 1.0);
    }

    #[test]
    fn bleed_grows_cards_on_both_sides() {
        let m = LayoutMetrics::from_options(&options(PaperSize::A4, 1.0, None));
        assert_eq!(m.card_width_mm, 65.0);
        assert_eq!(m.card_height_mm, 90.0);
        assert_eq!(m.bleed_mm, 1.0);
    }

    #[test]
    fn scale_clamped_for_out_of_range_inputs() {
        for (input, expected) in [
            (Some(0.0), 0.95),
            (Some(2.0), 1.10),
            (Some(-1.0), 0.95),
            (None, 1.0),
        ] {
            let m = LayoutMetrics::from_options(&options(PaperSize::Letter, 0.0, input));
            assert_eq!(m.scale, expected, "input {input:?}");
        }
    }

    #[test]
    fn grid_never_exceeds_page() {
        for paper in [PaperSize::A4, PaperSize::Letter] {
            for orientation in [Orientation::Portrait, Orientation::Landscape] {
                for bleed in [0.0, 1.0, 3.0, 10.0] {
                    for scale in [None, Some(0.95), Some(1.10)] {
                        let opts = ExportOptions {
                            orientation,
                            ..options(paper, bleed, scale)
                        };
                        let m = LayoutMetrics::from_options(&opts);
                        assert!(m.margin_x_mm >= 0.0);
                        assert!(m.margin_y_mm >= 0.0);
                        if m.margin_x_mm > 0.0 {
                            assert!(
                                m.margin_x_mm * 2.0 + m.grid_width_mm()
                                    <= m.page_width_mm + 1e-6
                            );
                        }
                        if m.margin_y_mm > 0.0 {
                            assert!(
                                m.margin_y_mm * 2.0 + m.grid_height_mm()
                                    <= m.page_height_mm + 1e-6
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn overflowing_grid_collapses_margin() {
        // Landscape A4 is only 210 mm tall; three 88 mm rows do not fit.
        let opts = ExportOptions {
            orientation: Orientation::Landscape,
            ..options(PaperSize::A4, 0.0, None)
        };
        let m = LayoutMetrics::from_options(&opts);
        assert_eq!(m.margin_y_mm, 0.0);
        assert!(m.margin_x_mm > 0.0);
    }

    #[test]
    fn offsets_pass_through() {
        let opts = ExportOptions {
            alignment_offset_x_mm: -0.7,
            alignment_offset_y_mm: 1.25,
            ..Default::default()
        };
        let m = LayoutMetrics::from_options(&opts);
        assert_eq!(m.offset_x_mm, -0.7);
        assert_eq!(m.offset_y_mm, 1.25);
    }

    #[test]
    fn page_size_px_a4_300dpi() {
        let m = LayoutMetrics::from_options(&ExportOptions::default());
        assert_eq!(m.page_size_px(300), (2480, 3508));
    }
}
