//! Image watermark rendering: load, scale, and fade a watermark image.

use image::imageops::FilterType;
use image::RgbaImage;
use std::path::Path;

use crate::error::ExportError;
use crate::pipeline::placement;
use crate::types::{PlacementSpec, WatermarkScale};

/// A rendered image watermark: the scaled, opacity-adjusted pixels plus
/// the top-left position they should be composited at.
pub struct RenderedOverlay {
    pub pixels: RgbaImage,
    pub position: (i64, i64),
}

/// Load and prepare an image watermark for compositing.
///
/// Width for `ScaleByPercent` derives from the *canvas* width; height
/// always derives from the watermark's own aspect ratio. Opacity
/// multiplies the existing per-pixel alpha, so a partially transparent
/// watermark keeps its internal transparency pattern, uniformly faded.
///
/// Errors opening or decoding the file surface as `Decode`; the caller
/// decides whether to skip the stage.
pub fn render(
    canvas: (u32, u32),
    watermark_path: &Path,
    scale: WatermarkScale,
    opacity: u8,
    spec: &PlacementSpec,
) -> Result<RenderedOverlay, ExportError> {
    let decoded = image::open(watermark_path).map_err(|e| ExportError::Decode {
        path: watermark_path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut pixels = decoded.to_rgba8();

    let target = target_size(canvas, (pixels.width(), pixels.height()), scale);
    if target != (pixels.width(), pixels.height()) {
        pixels = image::imageops::resize(&pixels, target.0, target.1, FilterType::Lanczos3);
    }

    let opacity = opacity.min(100);
    if opacity < 100 {
        let factor = opacity as f32 / 100.0;
        for pixel in pixels.pixels_mut() {
            pixel[3] = (pixel[3] as f32 * factor).round() as u8;
        }
    }

    let position = placement::resolve(canvas, target, spec);
    Ok(RenderedOverlay { pixels, position })
}

/// Compute the scaled watermark size for a canvas.
fn target_size(canvas: (u32, u32), watermark: (u32, u32), scale: WatermarkScale) -> (u32, u32) {
    let (wm_w, wm_h) = (watermark.0 as f64, watermark.1 as f64);
    match scale {
        WatermarkScale::Original => watermark,
        WatermarkScale::ScaleByPercent(p) => {
            let new_w = (canvas.0 as f64 * p as f64 / 100.0).round();
            let new_h = (wm_h * new_w / wm_w).round();
            (new_w.max(1.0) as u32, new_h.max(1.0) as u32)
        }
        WatermarkScale::FixedWidth(w) => {
            let new_h = (wm_h * w as f64 / wm_w).round();
            (w.max(1), new_h.max(1.0) as u32)
        }
        WatermarkScale::FixedHeight(h) => {
            let new_w = (wm_w * h as f64 / wm_h).round();
            (new_w.max(1.0) as u32, h.max(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Anchor;
    use image::Rgba;

    fn write_watermark(dir: &tempfile::TempDir, w: u32, h: u32, alpha: u8) -> std::path::PathBuf {
        let path = dir.path().join("wm.png");
        let img = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, alpha]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_percent_width_from_canvas_height_from_watermark() {
        // 400x100 watermark on a 1000-wide canvas at 50%:
        // new width = 500 (from canvas), new height = 100 * 500/400 = 125
        // (from the watermark's own ratio, not the canvas's)
        let size = target_size((1000, 800), (400, 100), WatermarkScale::ScaleByPercent(50));
        assert_eq!(size, (500, 125));
    }

    #[test]
    fn test_fixed_width_and_height() {
        let size = target_size((1000, 800), (400, 100), WatermarkScale::FixedWidth(200));
        assert_eq!(size, (200, 50));

        let size = target_size((1000, 800), (400, 100), WatermarkScale::FixedHeight(50));
        assert_eq!(size, (200, 50));
    }

    #[test]
    fn test_original_unscaled() {
        let size = target_size((1000, 800), (400, 100), WatermarkScale::Original);
        assert_eq!(size, (400, 100));
    }

    #[test]
    fn test_opacity_multiplies_existing_alpha() {
        let dir = tempfile::tempdir().unwrap();
        // Watermark with 50% internal alpha
        let path = write_watermark(&dir, 10, 10, 128);

        let rendered = render(
            (100, 100),
            &path,
            WatermarkScale::Original,
            50,
            &PlacementSpec::Anchor(Anchor::Center),
        )
        .unwrap();

        // 128 * 0.5 = 64: scaled, not overwritten
        assert_eq!(rendered.pixels.get_pixel(5, 5)[3], 64);
    }

    #[test]
    fn test_full_opacity_preserves_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_watermark(&dir, 10, 10, 200);

        let rendered = render(
            (100, 100),
            &path,
            WatermarkScale::Original,
            100,
            &PlacementSpec::Anchor(Anchor::Center),
        )
        .unwrap();
        assert_eq!(rendered.pixels.get_pixel(5, 5)[3], 200);
    }

    #[test]
    fn test_placement_uses_scaled_footprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_watermark(&dir, 100, 100, 255);

        // 20% of a 500-wide canvas -> 100x100 watermark, right_bottom:
        // (500-100-20, 400-100-20) = (380, 280)
        let rendered = render(
            (500, 400),
            &path,
            WatermarkScale::ScaleByPercent(20),
            100,
            &PlacementSpec::Anchor(Anchor::RightBottom),
        )
        .unwrap();
        assert_eq!(rendered.position, (380, 280));
        assert_eq!(rendered.pixels.dimensions(), (100, 100));
    }

    #[test]
    fn test_unreadable_watermark_is_decode_error() {
        let result = render(
            (100, 100),
            Path::new("/nonexistent/wm.png"),
            WatermarkScale::Original,
            100,
            &PlacementSpec::Anchor(Anchor::Center),
        );
        assert!(matches!(result, Err(ExportError::Decode { .. })));
    }
}
