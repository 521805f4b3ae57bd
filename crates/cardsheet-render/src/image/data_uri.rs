// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `data:` URI helpers. Enhanced images travel through the layout as inline
// PNG data URIs, so both directions live here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Build a `data:<mime>;base64,...` URI from raw bytes.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Wrap an already base64-encoded PNG payload.
pub fn png_data_uri_from_base64(payload: &str) -> String {
    format!("data:image/png;base64,{payload}")
}

/// Split a `data:` URI into its MIME type and decoded payload.
///
/// Returns `None` for anything that is not a well-formed data URI.
pub fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header
        .split(';')
        .next()
        .filter(|v| !v.is_empty())
        .unwrap_or("text/plain")
        .to_string();
    let data = if header.ends_with(";base64") {
        STANDARD.decode(payload.trim()).ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((mime, data))
}
