// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export orchestrator: optional batch enhancement, then one canvas per
// layout page with cards, placeholders, guides and debug labels.
//
// Image loads within a page run concurrently on the runtime; drawing happens
// afterwards in slot order so the raster does not depend on load timing.

use std::sync::Arc;

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_core::types::{ExportOptions, LayoutPage, UpscaleProgress};
use cardsheet_enhance::{Enhancer, ImageLoader, UpscalePipeline};
use cardsheet_render::canvas::{CanvasPage, WHITE};
use image::DynamicImage;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// What happened to the enhancement step of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnhancementSummary {
    #[default]
    Disabled,
    /// The service did not answer; originals were rendered.
    Unavailable { reason: String },
    Completed {
        enhanced: usize,
        failed: usize,
        calls: usize,
        cancelled: bool,
    },
}

/// Summary of one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub pages_rendered: usize,
    pub cards_drawn: usize,
    pub placeholders: usize,
    pub enhancement: EnhancementSummary,
}

/// Rendered canvases ready for an encoder.
#[derive(Debug)]
pub struct RenderedBatch {
    pub pages: Vec<CanvasPage>,
    pub report: ExportReport,
}

/// Renders layout pages into canvases.
pub struct Exporter<L, E> {
    loader: Arc<L>,
    pipeline: UpscalePipeline<E>,
}

impl<L, E> Exporter<L, E>
where
    L: ImageLoader + 'static,
    E: Enhancer,
{
    pub fn new(loader: L, pipeline: UpscalePipeline<E>) -> Self {
        Self {
            loader: Arc::new(loader),
            pipeline,
        }
    }

    /// Render `pages` with `options`.
    ///
    /// When `options.upscale_enabled` is set the enhancement pipeline runs
    /// once over the whole batch first. An unavailable service is not an
    /// error here: the originals are rendered and the report says why.
    #[instrument(skip_all, fields(pages = pages.len(), dpi = options.dpi))]
    pub async fn render<P>(
        &self,
        pages: &[LayoutPage],
        options: &ExportOptions,
        progress: P,
        cancel: &CancellationToken,
    ) -> Result<RenderedBatch>
    where
        P: FnMut(UpscaleProgress) + Send,
    {
        for page in pages {
            page.validate()?;
        }
        let options = options.normalized();
        let mut report = ExportReport::default();

        let mut batch = pages.to_vec();
        if options.upscale_enabled {
            match self.pipeline.run(pages, progress, cancel).await {
                Ok(outcome) => {
                    let rewritten = outcome.apply(&mut batch);
                    debug!(rewritten, "Enhanced URLs applied");
                    report.enhancement = EnhancementSummary::Completed {
                        enhanced: outcome.enhanced(),
                        failed: outcome.failures.len(),
                        calls: outcome.calls,
                        cancelled: outcome.cancelled,
                    };
                }
                Err(CardsheetError::EnhancementUnavailable(reason)) => {
                    warn!(%reason, "enhancement unavailable, rendering originals");
                    report.enhancement = EnhancementSummary::Unavailable { reason };
                }
                Err(e) => return Err(e),
            }
        }

        let mut rendered = Vec::with_capacity(batch.len());
        for (index, page) in batch.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(CardsheetError::Cancelled);
            }
            let (canvas, placeholders) = self.render_page(page, &options).await?;
            debug!(page = index + 1, placeholders, "Page rendered");
            report.cards_drawn += page.images.len() - placeholders;
            report.placeholders += placeholders;
            rendered.push(canvas);
        }
        report.pages_rendered = rendered.len();

        info!(
            pages = report.pages_rendered,
            cards = report.cards_drawn,
            placeholders = report.placeholders,
            "Export rendered"
        );
        Ok(RenderedBatch {
            pages: rendered,
            report,
        })
    }

    /// Draw one page. Returns the canvas and the number of placeholders.
    pub async fn render_page(
        &self,
        page: &LayoutPage,
        options: &ExportOptions,
    ) -> Result<(CanvasPage, usize)> {
        let mut canvas = CanvasPage::new(options, WHITE)?;
        let images = self.load_images(page).await;

        let mut placeholders = 0;
        for (position, image) in (1u32..).zip(images) {
            if canvas.place_card(position, image)?.is_placeholder() {
                placeholders += 1;
            }
        }

        let occupied = page.images.len();
        if canvas.options().draw_cut_margins {
            canvas.draw_cut_guides(occupied);
        }
        if canvas.options().debug_slot_sizes {
            canvas.annotate_slot_sizes(occupied);
        }
        Ok((canvas, placeholders))
    }

    /// Load every image of `page` concurrently; failures become `None`.
    async fn load_images(&self, page: &LayoutPage) -> Vec<Option<DynamicImage>> {
        let mut set = JoinSet::new();
        for (slot, image) in page.images.iter().enumerate() {
            let loader = Arc::clone(&self.loader);
            let url = image.url.clone();
            set.spawn(async move { (slot, loader.load(&url).await) });
        }

        let mut images: Vec<Option<DynamicImage>> = vec![None; page.images.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((slot, Ok(img))) => images[slot] = Some(img),
                Ok((slot, Err(e))) => {
                    warn!(slot = slot + 1, error = %e, "card image failed, drawing placeholder");
                }
                Err(e) => warn!(error = %e, "image load task failed"),
            }
        }
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsheet_core::types::LayoutImage;
    use cardsheet_enhance::EnhanceParams;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves solid-colour images keyed by URL; unknown URLs fail.
    #[derive(Default)]
    struct FakeLoader {
        colours: HashMap<String, Rgba<u8>>,
        loaded: Mutex<Vec<String>>,
    }

    impl FakeLoader {
        fn with(urls: &[(&str, Rgba<u8>)]) -> Self {
            Self {
                colours: urls.iter().map(|(u, c)| (u.to_string(), *c)).collect(),
                ..Default::default()
            }
        }
    }

    impl ImageLoader for FakeLoader {
        async fn load(&self, url: &str) -> Result<DynamicImage> {
            self.loaded.lock().unwrap().push(url.to_string());
            let key = url.strip_prefix("enhanced:").unwrap_or(url);
            match self.colours.get(key) {
                Some(c) => Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(63, 88, *c))),
                None => Err(CardsheetError::image_load(url, "404 Not Found")),
            }
        }
    }

    #[derive(Default)]
    struct FakeEnhancer {
        unavailable: bool,
        calls: Mutex<usize>,
    }

    impl Enhancer for FakeEnhancer {
        async fn probe_availability(&self, _cancel: &CancellationToken) -> bool {
            !self.unavailable
        }

        async fn enhance(
            &self,
            url: &str,
            _params: &EnhanceParams,
            _cancel: &CancellationToken,
        ) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            Ok(format!("enhanced:{url}"))
        }
    }

    const RED: Rgba<u8> = Rgba([220, 20, 20, 255]);
    const BLUE: Rgba<u8> = Rgba([20, 20, 220, 255]);

    fn exporter(loader: FakeLoader, enhancer: FakeEnhancer) -> Exporter<FakeLoader, FakeEnhancer> {
        Exporter::new(loader, UpscalePipeline::new(enhancer, EnhanceParams::default()))
    }

    fn options() -> ExportOptions {
        ExportOptions {
            dpi: 60,
            bleed_mm: 1.0,
            ..Default::default()
        }
    }

    fn pages() -> Vec<LayoutPage> {
        vec![
            LayoutPage::front(vec![
                LayoutImage::new("https://cards.test/red.png"),
                LayoutImage::new("https://cards.test/blue.png"),
                LayoutImage::new("https://cards.test/red.png"),
            ])
            .unwrap(),
        ]
    }

    fn fakes() -> FakeLoader {
        FakeLoader::with(&[
            ("https://cards.test/red.png", RED),
            ("https://cards.test/blue.png", BLUE),
        ])
    }

    fn centre(canvas: &CanvasPage, position: u32) -> Rgba<u8> {
        let s = canvas.slot(position).unwrap();
        *canvas
            .image()
            .get_pixel((s.x + s.w as i32 / 2) as u32, (s.y + s.h as i32 / 2) as u32)
    }

    #[tokio::test]
    async fn renders_cards_in_slot_order() {
        let exp = exporter(fakes(), FakeEnhancer::default());
        let batch = exp
            .render(&pages(), &options(), |_| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(batch.pages.len(), 1);
        let canvas = &batch.pages[0];
        assert_eq!(centre(canvas, 1), RED);
        assert_eq!(centre(canvas, 2), BLUE);
        assert_eq!(centre(canvas, 3), RED);
        assert_eq!(centre(canvas, 4), WHITE);
        assert_eq!(batch.report.cards_drawn, 3);
        assert_eq!(batch.report.enhancement, EnhancementSummary::Disabled);
    }

    #[tokio::test]
    async fn rendering_is_deterministic() {
        let exp = exporter(fakes(), FakeEnhancer::default());
        let cancel = CancellationToken::new();
        let a = exp.render(&pages(), &options(), |_| {}, &cancel).await.unwrap();
        let b = exp.render(&pages(), &options(), |_| {}, &cancel).await.unwrap();
        assert_eq!(a.pages[0].image().as_raw(), b.pages[0].image().as_raw());
    }

    #[tokio::test]
    async fn failed_load_draws_placeholder() {
        let exp = exporter(
            FakeLoader::with(&[("https://cards.test/red.png", RED)]),
            FakeEnhancer::default(),
        );
        let batch = exp
            .render(&pages(), &options(), |_| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(batch.report.placeholders, 1);
        assert_eq!(batch.report.cards_drawn, 2);
        let canvas = &batch.pages[0];
        assert_eq!(centre(canvas, 1), RED);
        assert_ne!(centre(canvas, 2), BLUE);
        assert_ne!(centre(canvas, 2), WHITE);
    }

    #[tokio::test]
    async fn upscale_runs_once_for_batch() {
        let exp = exporter(fakes(), FakeEnhancer::default());
        let opts = ExportOptions {
            upscale_enabled: true,
            ..options()
        };
        let mut events = Vec::new();
        let batch = exp
            .render(&pages(), &opts, |e| events.push(e), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*exp.pipeline.enhancer().calls.lock().unwrap(), 2);
        assert_eq!(
            batch.report.enhancement,
            EnhancementSummary::Completed {
                enhanced: 2,
                failed: 0,
                calls: 2,
                cancelled: false,
            }
        );
        let loaded = exp.loader.loaded.lock().unwrap();
        assert!(loaded.iter().all(|u| u.starts_with("enhanced:")));
        assert_eq!(events.iter().filter(|e| e.done).count(), 1);
    }

    #[tokio::test]
    async fn unavailable_service_renders_originals() {
        let exp = exporter(
            fakes(),
            FakeEnhancer {
                unavailable: true,
                ..Default::default()
            },
        );
        let opts = ExportOptions {
            upscale_enabled: true,
            ..options()
        };
        let batch = exp
            .render(&pages(), &opts, |_| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(
            batch.report.enhancement,
            EnhancementSummary::Unavailable { .. }
        ));
        assert_eq!(batch.report.cards_drawn, 3);
        assert_eq!(centre(&batch.pages[0], 2), BLUE);
    }

    #[tokio::test]
    async fn guides_and_labels_follow_options() {
        let exp = exporter(fakes(), FakeEnhancer::default());
        let opts = ExportOptions {
            draw_cut_margins: false,
            debug_slot_sizes: true,
            ..options()
        };
        let (canvas, _) = exp.render_page(&pages()[0], &opts).await.unwrap();
        assert_eq!(canvas.labels().len(), 3);
        // Slot edge lies in the 1 mm bleed ring, so only a guide could mark it.
        let s = canvas.slot(1).unwrap();
        assert_eq!(*canvas.image().get_pixel(s.x as u32, (s.y + 10) as u32), WHITE);
    }

    #[tokio::test]
    async fn cancelled_export_stops() {
        let exp = exporter(fakes(), FakeEnhancer::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            exp.render(&pages(), &options(), |_| {}, &cancel).await,
            Err(CardsheetError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn oversized_page_is_rejected() {
        let exp = exporter(fakes(), FakeEnhancer::default());
        let page = LayoutPage {
            images: vec![LayoutImage::new("https://cards.test/red.png"); 10],
            ..Default::default()
        };
        assert!(matches!(
            exp.render(&[page], &options(), |_| {}, &CancellationToken::new()).await,
            Err(CardsheetError::Config(_))
        ));
    }
}
