// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, cover-fit and encode card images. Operates on
// in-memory images using the `image` crate.

use std::io::Cursor;

use cardsheet_core::error::CardsheetError;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{debug, instrument};

/// Size and placement of a cover-fitted image relative to its target box.
///
/// The scaled image is at least as large as the target on both axes;
/// `offset_x`/`offset_y` are zero or negative and centre the overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverFit {
    pub draw_w: u32,
    pub draw_h: u32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl CoverFit {
    /// Fit `natural` into `target` so the target is fully covered.
    /// `None` when either size is empty.
    pub fn compute(natural_w: u32, natural_h: u32, target_w: u32, target_h: u32) -> Option<Self> {
        if natural_w == 0 || natural_h == 0 || target_w == 0 || target_h == 0 {
            return None;
        }
        let (nw, nh) = (f64::from(natural_w), f64::from(natural_h));
        let (tw, th) = (f64::from(target_w), f64::from(target_h));
        let cover = (tw / nw).max(th / nh);

        let draw_w = ((nw * cover).round() as u32).max(target_w);
        let draw_h = ((nh * cover).round() as u32).max(target_h);
        Some(Self {
            draw_w,
            draw_h,
            offset_x: ((tw - f64::from(draw_w)) / 2.0).round() as i32,
            offset_y: ((th - f64::from(draw_h)) / 2.0).round() as i32,
        })
    }
}

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, enabling
/// method chaining.
///
/// ```ignore
/// let card = ImageProcessor::from_bytes(&bytes)?
///     .cover_fit(744, 1039)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes, sniffing the format.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, CardsheetError> {
        let img = image::load_from_memory(data).map_err(|err| {
            CardsheetError::Encoding(format!("failed to decode image: {err}"))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Decode bytes with an explicit format instead of sniffing.
    pub fn from_bytes_with_format(
        data: &[u8],
        format: ImageFormat,
    ) -> Result<Self, CardsheetError> {
        let img = image::load_from_memory_with_format(data, format).map_err(|err| {
            CardsheetError::Encoding(format!("failed to decode {format:?} image: {err}"))
        })?;
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations -------------------------------------------------------

    /// Scale to cover `width` x `height` preserving aspect ratio, then crop
    /// the centred excess so the result is exactly `width` x `height`.
    #[instrument(skip(self), fields(width, height))]
    pub fn cover_fit(self, width: u32, height: u32) -> Self {
        let Some(fit) = CoverFit::compute(self.image.width(), self.image.height(), width, height)
        else {
            return self;
        };
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            draw_w = fit.draw_w,
            draw_h = fit.draw_h,
            "Cover-fitting image"
        );
        let resized = if (fit.draw_w, fit.draw_h) == (self.image.width(), self.image.height()) {
            self.image
        } else {
            self.image.resize_exact(
                fit.draw_w,
                fit.draw_h,
                image::imageops::FilterType::Lanczos3,
            )
        };
        let cropped = resized.crop_imm(
            fit.offset_x.unsigned_abs(),
            fit.offset_y.unsigned_abs(),
            width,
            height,
        );
        Self { image: cropped }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, CardsheetError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Read only the header of an encoded image and return its dimensions.
pub fn probe_dimensions(data: &[u8]) -> Result<(u32, u32), CardsheetError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|err| CardsheetError::Encoding(format!("unreadable image header: {err}")))?
        .into_dimensions()
        .map_err(|err| CardsheetError::Encoding(format!("unknown image dimensions: {err}")))
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
pub fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, CardsheetError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        CardsheetError::Encoding(format!("image encoding failed: {err}"))
    })?;
    Ok(buffer)
}
