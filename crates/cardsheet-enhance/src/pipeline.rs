// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement pipeline: probe, eligibility scan, sequential deduplicated
// upscale calls and progress reporting over a batch of layout pages.
//
// The pipeline never mutates its input. It returns an `EnhancementOutcome`
// holding the rewritten batch and the URL map; `EnhancementOutcome::apply`
// is the explicit step for callers that want to update pages they own.

use std::collections::{HashMap, HashSet};

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_core::types::{LayoutImage, LayoutPage, PageSide, UpscaleProgress};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::client::{EnhanceParams, Enhancer};
use crate::loader::truncate;

/// Predicate marking images that must not be enhanced on back pages.
pub type ExclusionPredicate = Box<dyn Fn(&LayoutImage) -> bool + Send + Sync>;

/// One slot whose URL was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub page: usize,
    pub slot: usize,
    pub original: String,
    pub enhanced: String,
}

/// Result of one pipeline run.
#[derive(Debug, Default)]
pub struct EnhancementOutcome {
    /// The input batch with every successful rewrite applied.
    pub pages: Vec<LayoutPage>,
    /// Original URL to enhanced data URI, one entry per successful call.
    pub rewrites: HashMap<String, String>,
    /// Every rewritten slot occurrence.
    pub replacements: Vec<Replacement>,
    /// Per-item failures; the affected slots keep their original URL.
    pub failures: Vec<CardsheetError>,
    /// Enhancement calls that ran to completion, successful or not.
    pub calls: usize,
    /// Distinct eligible URLs in the batch.
    pub total: usize,
    pub cancelled: bool,
}

impl EnhancementOutcome {
    /// Write the replacements into `pages`, which must be the batch the
    /// pipeline ran over. Slots whose URL changed since are left alone.
    /// Returns the number of slots rewritten.
    pub fn apply(&self, pages: &mut [LayoutPage]) -> usize {
        let mut applied = 0;
        for r in &self.replacements {
            let Some(image) = pages
                .get_mut(r.page)
                .and_then(|p| p.images.get_mut(r.slot))
            else {
                continue;
            };
            if image.url == r.original {
                image.url = r.enhanced.clone();
                applied += 1;
            }
        }
        applied
    }

    /// Distinct URLs that were enhanced.
    pub fn enhanced(&self) -> usize {
        self.rewrites.len()
    }
}

/// Runs enhancement over a batch of pages with at most one call per
/// distinct URL.
pub struct UpscalePipeline<E> {
    enhancer: E,
    params: EnhanceParams,
    exclude: ExclusionPredicate,
}

impl<E: Enhancer> UpscalePipeline<E> {
    /// Pipeline excluding images flagged `default_back`.
    pub fn new(enhancer: E, params: EnhanceParams) -> Self {
        Self {
            enhancer,
            params,
            exclude: Box::new(|img| img.default_back),
        }
    }

    /// Replace the back-page exclusion predicate.
    pub fn with_exclusion(
        mut self,
        predicate: impl Fn(&LayoutImage) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.exclude = Box::new(predicate);
        self
    }

    pub fn enhancer(&self) -> &E {
        &self.enhancer
    }

    fn is_eligible(&self, side: PageSide, image: &LayoutImage) -> bool {
        if image.is_inline() || image.url.is_empty() {
            return false;
        }
        !(side == PageSide::Back && (self.exclude)(image))
    }

    /// Distinct eligible URLs in first-seen, row-major order.
    pub fn eligible_urls(&self, pages: &[LayoutPage]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for page in pages {
            for image in &page.images {
                if self.is_eligible(page.side, image) && seen.insert(image.url.as_str()) {
                    urls.push(image.url.clone());
                }
            }
        }
        urls
    }

    /// Enhance every distinct eligible URL in `pages`.
    ///
    /// Fails with `EnhancementUnavailable` when the probe fails and with
    /// `Cancelled` when `cancel` fires before the probe. Cancellation during
    /// the loop stops issuing calls and returns the partial outcome.
    ///
    /// Progress: `{0, total, false}` first (skipped when `total == 0`), one
    /// event per processed URL, and exactly one final `done: true` event.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn run<P>(
        &self,
        pages: &[LayoutPage],
        mut progress: P,
        cancel: &CancellationToken,
    ) -> Result<EnhancementOutcome>
    where
        P: FnMut(UpscaleProgress) + Send,
    {
        if cancel.is_cancelled() {
            return Err(CardsheetError::Cancelled);
        }
        if !self.enhancer.probe_availability(cancel).await {
            if cancel.is_cancelled() {
                return Err(CardsheetError::Cancelled);
            }
            return Err(CardsheetError::EnhancementUnavailable(
                "upscaler probe failed".into(),
            ));
        }

        let urls = self.eligible_urls(pages);
        let total = urls.len();
        info!(total, "Enhancing distinct card images");

        let mut outcome = EnhancementOutcome {
            total,
            ..Default::default()
        };
        if total > 0 {
            progress(UpscaleProgress {
                current: 0,
                total,
                done: false,
            });
        }

        let mut current = 0;
        for url in &urls {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            match self.enhancer.enhance(url, &self.params, cancel).await {
                Ok(enhanced) => {
                    debug!(url = %truncate(url), "Enhanced");
                    outcome.calls += 1;
                    outcome.rewrites.insert(url.clone(), enhanced);
                }
                // Interrupted calls are not counted.
                Err(CardsheetError::Cancelled) => {
                    outcome.cancelled = true;
                    break;
                }
                Err(e) => {
                    outcome.calls += 1;
                    warn!(url = %truncate(url), error = %e, "enhancement failed, keeping original");
                    outcome.failures.push(e);
                }
            }
            current += 1;
            if current < total {
                progress(UpscaleProgress {
                    current,
                    total,
                    done: false,
                });
            }
        }

        progress(UpscaleProgress {
            current,
            total,
            done: true,
        });

        self.rewrite_pages(pages, &mut outcome);
        info!(
            enhanced = outcome.rewrites.len(),
            failed = outcome.failures.len(),
            calls = outcome.calls,
            cancelled = outcome.cancelled,
            "Enhancement finished"
        );
        Ok(outcome)
    }

    fn rewrite_pages(&self, pages: &[LayoutPage], outcome: &mut EnhancementOutcome) {
        let mut rewritten = pages.to_vec();
        for (page_idx, page) in rewritten.iter_mut().enumerate() {
            let side = page.side;
            for (slot_idx, image) in page.images.iter_mut().enumerate() {
                if !self.is_eligible(side, image) {
                    continue;
                }
                if let Some(enhanced) = outcome.rewrites.get(&image.url) {
                    outcome.replacements.push(Replacement {
                        page: page_idx,
                        slot: slot_idx,
                        original: std::mem::replace(&mut image.url, enhanced.clone()),
                        enhanced: enhanced.clone(),
                    });
                }
            }
        }
        outcome.pages = rewritten;
    }
}
