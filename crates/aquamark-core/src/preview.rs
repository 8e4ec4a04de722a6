//! Interactive preview rendering with latest-wins debouncing.
//!
//! Every configuration change requests a fresh preview; only the newest
//! request matters. Requests flow through a watch channel so a burst of
//! slider movements collapses to the latest value, and a render whose
//! request was superseded mid-flight publishes nothing. Cancellation is
//! just discarding the stale result, never interrupting the render.

use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::watch;

use crate::fonts::FontLibrary;
use crate::pipeline::compose;
use crate::types::{ResizeSpec, WatermarkConfig};

/// One preview request. The generation counter identifies stale renders.
#[derive(Clone)]
struct PreviewRequest {
    generation: u64,
    source: Arc<DynamicImage>,
    config: WatermarkConfig,
}

/// A finished preview frame.
#[derive(Clone)]
pub struct PreviewFrame {
    /// Generation of the request this frame answers
    pub generation: u64,
    pub pixels: Arc<image::RgbaImage>,
}

/// Handle for submitting preview requests.
pub struct PreviewEngine {
    tx: watch::Sender<Option<PreviewRequest>>,
    frames: watch::Receiver<Option<PreviewFrame>>,
    generation: std::sync::atomic::AtomicU64,
}

impl PreviewEngine {
    /// Start the preview render task. The source image is downscaled so
    /// its longest edge is at most `max_edge` before any compositing,
    /// keeping interactive latency flat regardless of source size.
    pub fn start(fonts: Arc<FontLibrary>, max_edge: u32) -> Arc<Self> {
        let (tx, rx) = watch::channel(None);
        let (frame_tx, frame_rx) = watch::channel(None);

        tokio::spawn(render_loop(rx, frame_tx, fonts, max_edge));

        Arc::new(Self {
            tx,
            frames: frame_rx,
            generation: std::sync::atomic::AtomicU64::new(0),
        })
    }

    /// Request a preview of `source` under `config`. Supersedes any
    /// pending request. Returns the generation assigned to this request.
    pub fn request(&self, source: Arc<DynamicImage>, config: WatermarkConfig) -> u64 {
        let generation = self
            .generation
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        // send_replace drops any not-yet-rendered request
        self.tx.send_replace(Some(PreviewRequest {
            generation,
            source,
            config,
        }));
        generation
    }

    /// Subscribe to finished frames.
    pub fn frames(&self) -> watch::Receiver<Option<PreviewFrame>> {
        self.frames.clone()
    }

    /// Wait until a frame at or beyond `generation` is published.
    pub async fn wait_for(&self, generation: u64) -> Option<PreviewFrame> {
        let mut rx = self.frames.clone();
        loop {
            if let Some(frame) = rx.borrow().as_ref() {
                if frame.generation >= generation {
                    return Some(frame.clone());
                }
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }
}

async fn render_loop(
    mut rx: watch::Receiver<Option<PreviewRequest>>,
    frame_tx: watch::Sender<Option<PreviewFrame>>,
    fonts: Arc<FontLibrary>,
    max_edge: u32,
) {
    loop {
        if rx.changed().await.is_err() {
            return;
        }
        let request = match rx.borrow_and_update().clone() {
            Some(request) => request,
            None => continue,
        };

        let fonts = fonts.clone();
        let render = tokio::task::spawn_blocking(move || render_one(&request, &fonts, max_edge));
        let frame = match render.await {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("Preview render task failed: {}", e);
                continue;
            }
        };

        // A newer request may have arrived while rendering; its frame
        // is on the way, so the stale one is simply dropped.
        let superseded = rx
            .borrow()
            .as_ref()
            .map(|r| r.generation > frame.generation)
            .unwrap_or(false);
        if !superseded {
            frame_tx.send_replace(Some(frame));
        }
    }
}

fn render_one(request: &PreviewRequest, fonts: &FontLibrary, max_edge: u32) -> Option<PreviewFrame> {
    let source = downscale_for_preview(&request.source, max_edge);
    match compose::composite(
        source,
        &request.config,
        ResizeSpec::Original,
        fonts,
        std::path::Path::new("preview"),
    ) {
        Ok(pixels) => Some(PreviewFrame {
            generation: request.generation,
            pixels: Arc::new(pixels),
        }),
        Err(e) => {
            tracing::warn!("Preview render failed: {}", e);
            None
        }
    }
}

fn downscale_for_preview(source: &DynamicImage, max_edge: u32) -> DynamicImage {
    let (w, h) = (source.width(), source.height());
    if w.max(h) <= max_edge {
        return source.clone();
    }
    source.resize(max_edge, max_edge, image::imageops::FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn source(w: u32, h: u32) -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            Rgba([40, 80, 120, 255]),
        )))
    }

    #[test]
    fn test_downscale_caps_longest_edge() {
        let img = DynamicImage::new_rgba8(2400, 1600);
        let scaled = downscale_for_preview(&img, 1200);
        assert_eq!((scaled.width(), scaled.height()), (1200, 800));
    }

    #[test]
    fn test_downscale_leaves_small_images_alone() {
        let img = DynamicImage::new_rgba8(640, 480);
        let scaled = downscale_for_preview(&img, 1200);
        assert_eq!((scaled.width(), scaled.height()), (640, 480));
    }

    #[tokio::test]
    async fn test_preview_renders_requested_frame() {
        let engine = PreviewEngine::start(Arc::new(FontLibrary::empty()), 1200);
        let generation = engine.request(source(100, 80), WatermarkConfig::default());

        let frame = engine.wait_for(generation).await.unwrap();
        assert!(frame.generation >= generation);
        assert_eq!(frame.pixels.dimensions(), (100, 80));
    }

    #[tokio::test]
    async fn test_latest_request_wins() {
        let engine = PreviewEngine::start(Arc::new(FontLibrary::empty()), 1200);

        // Burst of requests; only the last is guaranteed a frame
        engine.request(source(50, 50), WatermarkConfig::default());
        engine.request(source(60, 60), WatermarkConfig::default());
        let last = engine.request(source(70, 70), WatermarkConfig::default());

        let frame = engine.wait_for(last).await.unwrap();
        assert_eq!(frame.pixels.dimensions(), (70, 70));
    }
}
