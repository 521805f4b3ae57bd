// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decode, cover-fit, encode, and data URI handling.

pub mod data_uri;
pub mod processor;

pub use data_uri::{encode_data_uri, parse_data_uri, png_data_uri_from_base64};
pub use processor::{CoverFit, ImageProcessor, probe_dimensions};
