// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output writers: hand rendered canvases to the PDF or PNG encoder.

use std::path::{Path, PathBuf};

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_render::canvas::CanvasPage;
use cardsheet_render::pdf::PdfWriter;
use tracing::{info, instrument};

/// Artifact format for `cardsheet render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One multi-page PDF at physical paper size.
    #[default]
    Pdf,
    /// One PNG per page, named `<stem>-<n>.png`.
    Png,
}

impl OutputFormat {
    /// Guess the format from the output file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Encode `pages` to `out`. Returns the files written.
#[instrument(skip(pages), fields(pages = pages.len()))]
pub fn write_pages(pages: &[CanvasPage], format: OutputFormat, out: &Path) -> Result<Vec<PathBuf>> {
    if pages.is_empty() {
        return Err(CardsheetError::Encoding("nothing was rendered".into()));
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let written = match format {
        OutputFormat::Pdf => {
            PdfWriter::default().write_pages_to_file(pages, out)?;
            vec![out.to_path_buf()]
        }
        OutputFormat::Png => {
            let mut files = Vec::with_capacity(pages.len());
            for (index, page) in pages.iter().enumerate() {
                let path = numbered_png_path(out, index + 1);
                std::fs::write(&path, page.to_png_bytes()?)?;
                files.push(path);
            }
            files
        }
    };
    info!(files = written.len(), "Output written");
    Ok(written)
}

/// `sheet.png` + 2 -> `sheet-2.png`, next to `out`.
pub fn numbered_png_path(out: &Path, number: usize) -> PathBuf {
    let stem = out
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("sheet");
    out.with_file_name(format!("{stem}-{number}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsheet_core::types::ExportOptions;
    use cardsheet_render::canvas::WHITE;

    fn pages(n: usize) -> Vec<CanvasPage> {
        let opts = ExportOptions {
            dpi: 20,
            ..Default::default()
        };
        (0..n).map(|_| CanvasPage::new(&opts, WHITE).unwrap()).collect()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.PDF")), Some(OutputFormat::Pdf));
        assert_eq!(OutputFormat::from_path(Path::new("a.png")), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_path(Path::new("a")), None);
    }

    #[test]
    fn numbered_paths_keep_directory() {
        assert_eq!(
            numbered_png_path(Path::new("/out/sheet.png"), 3),
            PathBuf::from("/out/sheet-3.png")
        );
    }

    #[test]
    fn writes_one_png_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&pages(2), OutputFormat::Png, &dir.path().join("deck.png")).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[1].ends_with("deck-2.png"));
        let bytes = std::fs::read(&files[0]).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn png_output_carries_debug_labels() {
        let opts = ExportOptions {
            dpi: 96,
            debug_slot_sizes: true,
            ..Default::default()
        };
        let mut page = CanvasPage::new(&opts, WHITE).unwrap();
        page.annotate_slot_sizes(9);
        let slot = page.slot(1).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&[page], OutputFormat::Png, &dir.path().join("debug.png")).unwrap();
        let decoded = image::open(&files[0]).unwrap().to_rgba8();
        let marked = (0..slot.y as u32)
            .flat_map(|y| (slot.x as u32..slot.right() as u32).map(move |x| (x, y)))
            .any(|(x, y)| *decoded.get_pixel(x, y) != WHITE);
        assert!(marked);
    }

    #[test]
    fn writes_single_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("deck.pdf");
        let files = write_pages(&pages(2), OutputFormat::Pdf, &out).unwrap();
        assert_eq!(files, vec![out.clone()]);
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn empty_batch_is_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            write_pages(&[], OutputFormat::Pdf, &dir.path().join("x.pdf")),
            Err(CardsheetError::Encoding(_))
        ));
    }
}
