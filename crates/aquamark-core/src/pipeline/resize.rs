//! Canvas resize policy: target size arithmetic plus uniform resampling.

use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;

use crate::error::ExportError;
use crate::types::ResizeSpec;

/// Resampling filter used for all canvas scaling, up and down, so results
/// are deterministic across export and preview.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Compute the target canvas size for a resize spec.
///
/// Aspect ratio is preserved for everything except `Original` (which is a
/// no-op). Degenerate inputs are rejected with `InvalidDimension`; there
/// is no silent clamping.
pub fn compute_target_size(
    original: (u32, u32),
    spec: ResizeSpec,
    path: &Path,
) -> Result<(u32, u32), ExportError> {
    let (w, h) = original;
    if w == 0 || h == 0 {
        return Err(invalid(path, format!("source is {}x{}", w, h)));
    }

    match spec {
        ResizeSpec::Original => Ok((w, h)),
        ResizeSpec::FixedWidth(target_w) => {
            if target_w == 0 {
                return Err(invalid(path, "fixed width must be > 0".to_string()));
            }
            let target_h = (h as f64 * target_w as f64 / w as f64).round() as u32;
            Ok((target_w, target_h.max(1)))
        }
        ResizeSpec::FixedHeight(target_h) => {
            if target_h == 0 {
                return Err(invalid(path, "fixed height must be > 0".to_string()));
            }
            let target_w = (w as f64 * target_h as f64 / h as f64).round() as u32;
            Ok((target_w.max(1), target_h))
        }
        ResizeSpec::Percentage(p) => {
            if p == 0 {
                return Err(invalid(path, "percentage must be > 0".to_string()));
            }
            let target_w = (w as f64 * p as f64 / 100.0).round() as u32;
            let target_h = (h as f64 * p as f64 / 100.0).round() as u32;
            Ok((target_w.max(1), target_h.max(1)))
        }
    }
}

/// Apply a resize spec to a decoded image.
///
/// Returns the image untouched for `Original` or when the target equals
/// the current size.
pub fn apply(
    image: DynamicImage,
    spec: ResizeSpec,
    path: &Path,
) -> Result<DynamicImage, ExportError> {
    let original = (image.width(), image.height());
    let target = compute_target_size(original, spec, path)?;
    if target == original {
        return Ok(image);
    }
    Ok(image.resize_exact(target.0, target.1, RESIZE_FILTER))
}

fn invalid(path: &Path, message: String) -> ExportError {
    ExportError::InvalidDimension {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("test.jpg")
    }

    #[test]
    fn test_original_unchanged() {
        let size = compute_target_size((1000, 800), ResizeSpec::Original, &path()).unwrap();
        assert_eq!(size, (1000, 800));
    }

    #[test]
    fn test_fixed_width_preserves_aspect() {
        // 1000x800 at FixedWidth(500) -> 500x400
        let size = compute_target_size((1000, 800), ResizeSpec::FixedWidth(500), &path()).unwrap();
        assert_eq!(size, (500, 400));
    }

    #[test]
    fn test_fixed_height_preserves_aspect() {
        let size = compute_target_size((1000, 800), ResizeSpec::FixedHeight(400), &path()).unwrap();
        assert_eq!(size, (500, 400));
    }

    #[test]
    fn test_fixed_width_rounds() {
        // 333/1000 * 800 = 266.4 -> 266
        let size = compute_target_size((1000, 800), ResizeSpec::FixedWidth(333), &path()).unwrap();
        assert_eq!(size, (333, 266));
    }

    #[test]
    fn test_percentage() {
        let size = compute_target_size((1000, 800), ResizeSpec::Percentage(50), &path()).unwrap();
        assert_eq!(size, (500, 400));

        let size = compute_target_size((1000, 800), ResizeSpec::Percentage(150), &path()).unwrap();
        assert_eq!(size, (1500, 1200));
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        assert!(compute_target_size((0, 800), ResizeSpec::Original, &path()).is_err());
        assert!(compute_target_size((1000, 0), ResizeSpec::Original, &path()).is_err());
        assert!(compute_target_size((1000, 800), ResizeSpec::FixedWidth(0), &path()).is_err());
        assert!(compute_target_size((1000, 800), ResizeSpec::FixedHeight(0), &path()).is_err());
        assert!(compute_target_size((1000, 800), ResizeSpec::Percentage(0), &path()).is_err());
    }

    #[test]
    fn test_apply_resizes_pixels() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(100, 50));
        let resized = apply(img, ResizeSpec::FixedWidth(40), &path()).unwrap();
        assert_eq!((resized.width(), resized.height()), (40, 20));
    }

    #[test]
    fn test_apply_original_is_noop() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(100, 50));
        let out = apply(img, ResizeSpec::Original, &path()).unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
    }
}
