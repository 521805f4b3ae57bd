// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unit conversion between millimetres, inches and device pixels.
//
// Nothing here rounds. Callers round once, at pixel granularity, after all
// physical arithmetic is done.

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// CSS reference resolution; one device-independent pixel at this DPI.
pub const REFERENCE_DPI: f64 = 96.0;

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

pub fn inches_to_mm(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

/// Convert millimetres to (fractional) pixels at `dpi`.
pub fn mm_to_px(mm: f64, dpi: u32) -> f64 {
    mm_to_inches(mm) * f64::from(dpi)
}

/// Convert (fractional) pixels at `dpi` back to millimetres.
pub fn px_to_mm(px: f64, dpi: u32) -> f64 {
    inches_to_mm(px / f64::from(dpi))
}

/// Width of one device-independent pixel at `dpi`, never less than one
/// device pixel.
pub fn device_independent_px(dpi: u32) -> u32 {
    ((f64::from(dpi) / REFERENCE_DPI).round() as u32).max(1)
}
