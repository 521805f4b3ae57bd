// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: embed rendered page rasters into a PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use cardsheet_core::error::{CardsheetError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::canvas::CanvasPage;

/// Writes rendered sheets into a PDF, one PDF page per canvas.
///
/// Each page is sized to the physical paper and the raster is placed at its
/// render DPI, so one raster pixel maps to exactly `1/dpi` inch on paper.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new("Cardsheet")
    }
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Encode `pages` into a single PDF document.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn create_from_pages(&self, pages: &[CanvasPage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(CardsheetError::Encoding("no pages to encode".into()));
        }
        info!(title = %self.title, "Creating sheet PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages = Vec::with_capacity(pages.len());

        for page in pages {
            let dpi = page.dpi() as f32;
            let page_w = Mm(page.metrics().page_width_mm as f32);
            let page_h = Mm(page.metrics().page_height_mm as f32);

            let rgb = image::DynamicImage::ImageRgba8(page.image().clone()).to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: page.width_px() as usize,
                height: page.height_px() as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(dpi),
                    rotate: None,
                },
            }];

            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);
        debug!(pages = doc.pages.len(), "Sheets placed");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if output.is_empty() {
            return Err(CardsheetError::Encoding("PDF serialisation produced no bytes".into()));
        }
        Ok(output)
    }

    /// Encode `pages` and write the PDF to `path`.
    pub fn write_pages_to_file(&self, pages: &[CanvasPage], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create_from_pages(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote sheet PDF to {}", path.as_ref().display());
        Ok(())
    }
}
