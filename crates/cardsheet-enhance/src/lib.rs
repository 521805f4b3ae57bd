// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cardsheet Enhance: card image loading, the local upscaler client, and the
// deduplicating enhancement pipeline that rewrites a batch of layout pages.

pub mod client;
pub mod loader;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{EnhanceParams, EnhancementClient, Enhancer};
pub use loader::{HttpImageLoader, ImageLoader, SourceKind};
pub use pipeline::{EnhancementOutcome, ExclusionPredicate, Replacement, UpscalePipeline};
