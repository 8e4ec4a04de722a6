//! Source image decoding with validation and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::ExportError;

/// Image decoder with configurable limits and timeout.
#[derive(Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding a source image.
pub struct DecodedImage {
    /// The decoded pixels
    pub image: DynamicImage,
    /// Detected format of the source file
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageDecoder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode a source image, enforcing size and dimension
    /// limits. Decoding runs on the blocking pool under a timeout.
    pub async fn decode(&self, path: &Path) -> Result<DecodedImage, ExportError> {
        if !path.exists() {
            return Err(ExportError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| ExportError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(ExportError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| ExportError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        })?;

        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);
        let decode_result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || decode_bytes_sync(bytes, &path_owned)),
        )
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                if decoded.width > self.limits.max_image_dimension
                    || decoded.height > self.limits.max_image_dimension
                {
                    return Err(ExportError::ImageTooLarge {
                        path: path.to_path_buf(),
                        width: decoded.width,
                        height: decoded.height,
                        max_dim: self.limits.max_image_dimension,
                    });
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(ExportError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(ExportError::Timeout {
                path: path.to_path_buf(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }
}

/// Synchronous decode from bytes (runs in spawn_blocking). Format is
/// detected from content, falling back to the file extension.
pub fn decode_bytes_sync(bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, ExportError> {
    use std::io::Cursor;

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExportError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let format = match reader.format() {
        Some(f) => f,
        None => ImageFormat::from_path(path).map_err(|_| ExportError::Decode {
            path: path.to_path_buf(),
            message: "Unrecognized image format".to_string(),
        })?,
    };
    let image = reader.decode().map_err(|e| ExportError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let (width, height) = image.dimensions();
    Ok(DecodedImage {
        image,
        format,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_decode_bytes_detects_format_by_content() {
        // PNG data under a .jpg name decodes as PNG
        let decoded = decode_bytes_sync(png_bytes(8, 4), Path::new("misnamed.jpg")).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (8, 4));
    }

    #[test]
    fn test_decode_bytes_rejects_garbage() {
        let result = decode_bytes_sync(b"definitely not an image".to_vec(), Path::new("x.png"));
        assert!(matches!(result, Err(ExportError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_decode_missing_file() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let result = decoder.decode(Path::new("/nonexistent/photo.jpg")).await;
        assert!(matches!(result, Err(ExportError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_decode_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes(16, 9)).unwrap();

        let decoder = ImageDecoder::new(LimitsConfig::default());
        let decoded = decoder.decode(&path).await.unwrap();
        assert_eq!((decoded.width, decoded.height), (16, 9));
    }

    #[tokio::test]
    async fn test_decode_enforces_dimension_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        std::fs::write(&path, png_bytes(64, 2)).unwrap();

        let decoder = ImageDecoder::new(LimitsConfig {
            max_image_dimension: 32,
            ..Default::default()
        });
        let result = decoder.decode(&path).await;
        assert!(matches!(result, Err(ExportError::ImageTooLarge { .. })));
    }
}
