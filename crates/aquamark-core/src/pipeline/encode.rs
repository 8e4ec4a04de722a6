//! Output naming and format-specific encoding.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::types::{ExportFormat, ExportOptions};

/// Build the output file name for a source path:
/// `{prefix}{'_' if prefix}{stem}{suffix}.{ext}`.
pub fn output_file_name(source: &Path, options: &ExportOptions) -> String {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let joiner = if options.prefix.is_empty() { "" } else { "_" };
    format!(
        "{}{}{}{}.{}",
        options.prefix,
        joiner,
        stem,
        options.suffix,
        options.format.extension()
    )
}

/// Full output path for a source file exported into `out_dir`.
pub fn output_path(source: &Path, out_dir: &Path, options: &ExportOptions) -> PathBuf {
    out_dir.join(output_file_name(source, options))
}

/// Encode the composited canvas to disk.
///
/// JPEG is flattened to three channels and written with the explicit
/// quality; PNG keeps the alpha channel. Quality is ignored for PNG.
pub fn encode_to_file(
    canvas: &RgbaImage,
    path: &Path,
    format: ExportFormat,
    quality: u8,
) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|e| encode_err(path, e.to_string()))?;
    let writer = BufWriter::new(file);

    match format {
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel: flatten before encoding
            let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(writer, quality.min(100));
            rgb.write_with_encoder(encoder)
                .map_err(|e| encode_err(path, e.to_string()))?;
        }
        ExportFormat::Png => {
            let encoder = PngEncoder::new(writer);
            canvas
                .write_with_encoder(encoder)
                .map_err(|e| encode_err(path, e.to_string()))?;
        }
    }

    Ok(())
}

fn encode_err(path: &Path, message: String) -> ExportError {
    ExportError::Encode {
        path: path.to_path_buf(),
        message,
    }
}
