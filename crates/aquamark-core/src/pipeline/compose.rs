//! Pipeline orchestration: decode, resize, composite, encode.
//!
//! The compositing order is fixed: the canvas is resized first, then the
//! text layer is alpha-composited, then the image watermark, each with a
//! single "over" pass. The same [`composite`] function backs export and
//! preview so both always agree pixel-for-pixel.

use image::{imageops, DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::ExportError;
use crate::fonts::FontLibrary;
use crate::types::{ExportOptions, ResizeSpec, WatermarkConfig};

use super::decode::ImageDecoder;
use super::{encode, overlay, resize, text};

/// Outcome of a batch export. Per-image failures are collected here
/// rather than aborting the remaining batch.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Output paths written successfully
    pub written: Vec<PathBuf>,
    /// Sources that failed, with the rendered error message
    pub failed: Vec<(PathBuf, String)>,
}

impl ExportSummary {
    pub fn succeeded(&self) -> u64 {
        self.written.len() as u64
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.len() as u64
    }
}

/// The export pipeline: owns the decoder and the shared font table.
/// Cloning is cheap (the font table is shared), so batch tasks each get
/// their own handle.
#[derive(Clone)]
pub struct Exporter {
    decoder: ImageDecoder,
    fonts: Arc<FontLibrary>,
    parallel_workers: usize,
}

impl Exporter {
    /// Create an exporter from configuration and a pre-built font table.
    pub fn new(config: &Config, fonts: Arc<FontLibrary>) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            fonts,
            parallel_workers: config.processing.parallel_workers.max(1),
        }
    }

    /// Composite one decoded image. Pure with respect to the filesystem
    /// except for loading the image watermark file.
    pub fn composite(
        &self,
        image: DynamicImage,
        watermark: &WatermarkConfig,
        resize_spec: ResizeSpec,
        source: &Path,
    ) -> Result<RgbaImage, ExportError> {
        composite(image, watermark, resize_spec, &self.fonts, source)
    }

    /// Export a single image: decode, composite, encode, write.
    ///
    /// Returns the path of the written file. Callers exporting a batch
    /// must run [`check_output_dir`] first.
    pub async fn export_one(
        &self,
        source: &Path,
        watermark: &WatermarkConfig,
        options: &ExportOptions,
        out_dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        let decoded = self.decoder.decode(source).await?;
        let out_path = encode::output_path(source, out_dir, options);

        let fonts = self.fonts.clone();
        let watermark = watermark.clone();
        let options = options.clone();
        let source = source.to_path_buf();
        let source_for_err = source.clone();

        tokio::task::spawn_blocking(move || {
            let canvas = composite(decoded.image, &watermark, options.resize, &fonts, &source)?;
            encode::encode_to_file(&canvas, &out_path, options.format, options.quality)?;
            tracing::debug!("Exported {:?} -> {:?}", source, out_path);
            Ok(out_path)
        })
        .await
        .map_err(|e| ExportError::Encode {
            path: source_for_err,
            message: format!("Task join error: {}", e),
        })?
    }

    /// Export a batch with a bounded worker pool.
    ///
    /// The same-directory pre-flight runs across the whole batch before
    /// any file is written; after that, per-image failures are isolated
    /// and collected into the summary. `on_done` is invoked once per
    /// image as it completes (for progress reporting).
    pub async fn export_batch<F>(
        &self,
        sources: Vec<PathBuf>,
        watermark: &WatermarkConfig,
        options: &ExportOptions,
        out_dir: &Path,
        on_done: F,
    ) -> Result<ExportSummary, ExportError>
    where
        F: Fn(&Path, Option<&ExportError>) + Send + Sync + 'static,
    {
        check_output_dir(&sources, out_dir)?;

        let semaphore = Arc::new(Semaphore::new(self.parallel_workers));
        let on_done = Arc::new(on_done);
        let mut tasks: JoinSet<(PathBuf, Result<PathBuf, ExportError>)> = JoinSet::new();

        for source in sources {
            let exporter = self.clone();
            let semaphore = semaphore.clone();
            let watermark = watermark.clone();
            let options = options.clone();
            let out_dir = out_dir.to_path_buf();
            let on_done = on_done.clone();

            tasks.spawn(async move {
                // Semaphore bounds concurrent decodes and composites;
                // closed-semaphore is unreachable here.
                let _permit = semaphore.acquire_owned().await;
                let result = exporter
                    .export_one(&source, &watermark, &options, &out_dir)
                    .await;
                on_done(&source, result.as_ref().err());
                (source, result)
            });
        }

        let mut summary = ExportSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(out_path))) => summary.written.push(out_path),
                Ok((source, Err(e))) => {
                    tracing::error!("Failed: {:?} - {}", source, e);
                    summary.failed.push((source, e.to_string()));
                }
                Err(e) => {
                    tracing::error!("Export task panicked: {}", e);
                }
            }
        }

        summary.written.sort();
        Ok(summary)
    }
}

/// Resize the canvas and composite the configured watermark layers.
///
/// Text is always composited before the image watermark, regardless of
/// configuration order. A config with no text and no image path returns
/// the (resized) canvas untouched. Image watermark failures are logged
/// and skip only that stage.
pub fn composite(
    image: DynamicImage,
    watermark: &WatermarkConfig,
    resize_spec: ResizeSpec,
    fonts: &FontLibrary,
    source: &Path,
) -> Result<RgbaImage, ExportError> {
    let image = resize::apply(image, resize_spec, source)?;
    let canvas_size = (image.width(), image.height());
    let mut canvas = image.to_rgba8();

    if let Some(layer) = text::render(canvas_size, watermark, fonts) {
        imageops::overlay(&mut canvas, &layer, 0, 0);
    }

    if let Some(wm_path) = &watermark.image_path {
        match overlay::render(
            canvas_size,
            wm_path,
            watermark.image_scale,
            watermark.overlay_opacity(),
            &watermark.placement,
        ) {
            Ok(rendered) => {
                imageops::overlay(
                    &mut canvas,
                    &rendered.pixels,
                    rendered.position.0,
                    rendered.position.1,
                );
            }
            Err(e) => {
                tracing::warn!("Skipping image watermark for {:?}: {}", source, e);
            }
        }
    }

    Ok(canvas)
}

/// Reject exporting into any directory that contains a source image.
///
/// This is a whole-batch gate: it runs before any write, and a single
/// offending source fails the entire batch.
pub fn check_output_dir(sources: &[PathBuf], out_dir: &Path) -> Result<(), ExportError> {
    let out_canonical = out_dir.canonicalize().unwrap_or_else(|_| out_dir.to_path_buf());

    for source in sources {
        let parent = match source.parent() {
            Some(parent) => parent,
            None => continue,
        };
        let parent_canonical = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
        if parent_canonical == out_canonical {
            return Err(ExportError::SameDirectory {
                dir: out_dir.to_path_buf(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Anchor, ExportFormat, PlacementSpec, WatermarkScale};
    use image::{GenericImageView, Rgba};

    fn write_source(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbaImage::from_pixel(w, h, Rgba([80, 120, 160, 255]));
        img.save(&path).unwrap();
        path
    }

    fn exporter() -> Arc<Exporter> {
        Arc::new(Exporter::new(
            &Config::default(),
            Arc::new(FontLibrary::empty()),
        ))
    }

    fn text_config(text: &str) -> WatermarkConfig {
        WatermarkConfig {
            text: text.to_string(),
            opacity: 80,
            placement: PlacementSpec::Anchor(Anchor::RightBottom),
            ..Default::default()
        }
    }

    #[test]
    fn test_noop_config_leaves_canvas_unchanged() {
        let fonts = FontLibrary::empty();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 40, Rgba([1, 2, 3, 255])));
        let canvas = composite(
            img.clone(),
            &WatermarkConfig::default(),
            ResizeSpec::Original,
            &fonts,
            Path::new("x.png"),
        )
        .unwrap();
        assert_eq!(canvas, img.to_rgba8());
    }

    #[test]
    fn test_zero_opacity_text_leaves_canvas_unchanged() {
        let fonts = FontLibrary::empty();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 150, Rgba([9, 9, 9, 255])));
        let mut config = text_config("Watermark");
        config.opacity = 0;

        let canvas = composite(
            img.clone(),
            &config,
            ResizeSpec::Original,
            &fonts,
            Path::new("x.png"),
        )
        .unwrap();
        assert_eq!(canvas, img.to_rgba8());
    }

    #[test]
    fn test_composite_is_deterministic() {
        let fonts = FontLibrary::empty();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 200, Rgba([50, 60, 70, 255])));
        let config = text_config("Add Watermark");

        let a = composite(
            img.clone(),
            &config,
            ResizeSpec::FixedWidth(150),
            &fonts,
            Path::new("x.png"),
        )
        .unwrap();
        let b = composite(
            img,
            &config,
            ResizeSpec::FixedWidth(150),
            &fonts,
            Path::new("x.png"),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_image_watermark_skips_stage() {
        let fonts = FontLibrary::empty();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 40, Rgba([1, 2, 3, 255])));
        let config = WatermarkConfig {
            image_path: Some(PathBuf::from("/nonexistent/wm.png")),
            ..Default::default()
        };

        // Stage is skipped, not fatal; canvas is unchanged
        let canvas = composite(
            img.clone(),
            &config,
            ResizeSpec::Original,
            &fonts,
            Path::new("x.png"),
        )
        .unwrap();
        assert_eq!(canvas, img.to_rgba8());
    }

    #[test]
    fn test_image_watermark_composited() {
        let dir = tempfile::tempdir().unwrap();
        let wm_path = dir.path().join("wm.png");
        RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]))
            .save(&wm_path)
            .unwrap();

        let fonts = FontLibrary::empty();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255])));
        let config = WatermarkConfig {
            image_path: Some(wm_path),
            image_scale: WatermarkScale::Original,
            image_opacity: 100,
            placement: PlacementSpec::Anchor(Anchor::LeftTop),
            ..Default::default()
        };

        let canvas = composite(img, &config, ResizeSpec::Original, &fonts, Path::new("x.png"))
            .unwrap();
        // Watermark lands at the 20px margin
        assert_eq!(*canvas.get_pixel(25, 25), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(50, 50), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_check_output_dir_rejects_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "a.png", 10, 10);

        let result = check_output_dir(&[source], dir.path());
        assert!(matches!(result, Err(ExportError::SameDirectory { .. })));
    }

    #[test]
    fn test_check_output_dir_accepts_distinct_directory() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = write_source(src_dir.path(), "a.png", 10, 10);

        assert!(check_output_dir(&[source], out_dir.path()).is_ok());
    }

    #[tokio::test]
    async fn test_export_one_round_trip_original_size() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = write_source(src_dir.path(), "photo.png", 64, 48);

        let options = ExportOptions {
            format: ExportFormat::Png,
            resize: ResizeSpec::Original,
            ..Default::default()
        };
        let out_path = exporter()
            .export_one(&source, &text_config("hi"), &options, out_dir.path())
            .await
            .unwrap();

        let reloaded = image::open(&out_path).unwrap();
        assert_eq!(reloaded.dimensions(), (64, 48));
    }

    #[tokio::test]
    async fn test_export_batch_same_directory_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "a.png", 10, 10);
        let before: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();

        let result = exporter()
            .export_batch(
                vec![source],
                &WatermarkConfig::default(),
                &ExportOptions::default(),
                dir.path(),
                |_, _| {},
            )
            .await;

        assert!(matches!(result, Err(ExportError::SameDirectory { .. })));
        let after: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(before.len(), after.len());
    }

    #[tokio::test]
    async fn test_export_batch_isolates_failures() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let good = write_source(src_dir.path(), "good.png", 20, 20);
        let bad = src_dir.path().join("bad.png");
        std::fs::write(&bad, b"not an image").unwrap();

        let summary = exporter()
            .export_batch(
                vec![good, bad.clone()],
                &WatermarkConfig::default(),
                &ExportOptions::default(),
                out_dir.path(),
                |_, _| {},
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.failed[0].0, bad);
    }

    #[tokio::test]
    async fn test_export_batch_idempotent_outputs() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_a = tempfile::tempdir().unwrap();
        let out_b = tempfile::tempdir().unwrap();
        let source = write_source(src_dir.path(), "photo.png", 80, 60);
        let config = text_config("Add Watermark");
        let options = ExportOptions {
            format: ExportFormat::Png,
            ..Default::default()
        };

        let exporter = exporter();
        let a = exporter
            .export_batch(
                vec![source.clone()],
                &config,
                &options,
                out_a.path(),
                |_, _| {},
            )
            .await
            .unwrap();
        let b = exporter
            .export_batch(vec![source], &config, &options, out_b.path(), |_, _| {})
            .await
            .unwrap();

        // Same config, same source: byte-identical pixel buffers
        let img_a = image::open(&a.written[0]).unwrap().to_rgba8();
        let img_b = image::open(&b.written[0]).unwrap().to_rgba8();
        assert_eq!(img_a.as_raw(), img_b.as_raw());
    }
}
