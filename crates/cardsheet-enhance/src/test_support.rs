// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared helpers for the HTTP tests: a throwaway axum server and tiny PNGs.

use axum::Router;
use cardsheet_render::image::ImageProcessor;
use image::{DynamicImage, Rgba, RgbaImage};

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub(crate) async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A solid `width` x `height` PNG.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255]));
    ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(img))
        .to_png_bytes()
        .unwrap()
}
