//! Domain types shared across the pipeline: colors, placement, resize
//! specs, and the per-export watermark configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An RGB fill color. Serialized as a `[r, g, b]` triple to match the
/// template interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

/// The nine named anchor positions for watermark placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    LeftTop,
    CenterTop,
    RightTop,
    LeftCenter,
    Center,
    RightCenter,
    LeftBottom,
    CenterBottom,
    RightBottom,
}

impl Anchor {
    /// Parse an anchor name. Unknown names fall back to `RightBottom`,
    /// which is also the default placement.
    pub fn parse(name: &str) -> Self {
        match name {
            "left_top" => Anchor::LeftTop,
            "center_top" => Anchor::CenterTop,
            "right_top" => Anchor::RightTop,
            "left_center" => Anchor::LeftCenter,
            "center" => Anchor::Center,
            "right_center" => Anchor::RightCenter,
            "left_bottom" => Anchor::LeftBottom,
            "center_bottom" => Anchor::CenterBottom,
            "right_bottom" => Anchor::RightBottom,
            _ => Anchor::RightBottom,
        }
    }

    /// The canonical string name used in templates.
    pub fn name(&self) -> &'static str {
        match self {
            Anchor::LeftTop => "left_top",
            Anchor::CenterTop => "center_top",
            Anchor::RightTop => "right_top",
            Anchor::LeftCenter => "left_center",
            Anchor::Center => "center",
            Anchor::RightCenter => "right_center",
            Anchor::LeftBottom => "left_bottom",
            Anchor::CenterBottom => "center_bottom",
            Anchor::RightBottom => "right_bottom",
        }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::RightBottom
    }
}

/// Where a watermark goes on the canvas.
///
/// A custom fractional coordinate supersedes the anchor until an anchor
/// is explicitly re-selected; this is a tagged union, not a flag pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlacementSpec {
    /// One of the nine named grid positions
    Anchor(Anchor),
    /// Top-left corner as a fraction of canvas size, each in [0, 1]
    Custom { fx: f64, fy: f64 },
}

impl Default for PlacementSpec {
    fn default() -> Self {
        PlacementSpec::Anchor(Anchor::RightBottom)
    }
}

/// How the source canvas is resized before compositing.
///
/// Everything except `Original` preserves aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeSpec {
    Original,
    FixedWidth(u32),
    FixedHeight(u32),
    Percentage(u32),
}

impl Default for ResizeSpec {
    fn default() -> Self {
        ResizeSpec::Original
    }
}

/// How an image watermark is scaled relative to the canvas.
///
/// For `ScaleByPercent` the new width derives from the *canvas* width;
/// the height always derives from the watermark's own aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkScale {
    Original,
    ScaleByPercent(u32),
    FixedWidth(u32),
    FixedHeight(u32),
}

impl Default for WatermarkScale {
    fn default() -> Self {
        WatermarkScale::ScaleByPercent(20)
    }
}

/// Immutable description of one export/preview pass.
///
/// Constructed from UI state or a loaded template, read-only while the
/// pipeline runs. An empty `text` and `None` `image_path` are both legal
/// and make the corresponding compositing stage a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Watermark text; empty means no text watermark
    pub text: String,
    /// Font family name, matched against the scanned fonts directory
    pub font_family: String,
    /// Point size for the text watermark
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    /// Text fill color
    pub color: Color,
    /// Text opacity, 0-100
    pub opacity: u8,
    /// Drop shadow at +2,+2 in black
    pub shadow: bool,
    /// Dense 5x5 outline in black
    pub outline: bool,
    /// Optional image watermark
    pub image_path: Option<PathBuf>,
    pub image_scale: WatermarkScale,
    /// Image watermark opacity, 0-100, multiplied into existing alpha
    pub image_opacity: u8,
    pub placement: PlacementSpec,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "arial".to_string(),
            font_size: 36.0,
            bold: false,
            italic: false,
            color: Color::white(),
            opacity: 50,
            shadow: false,
            outline: false,
            image_path: None,
            image_scale: WatermarkScale::default(),
            image_opacity: 100,
            placement: PlacementSpec::default(),
        }
    }
}

impl WatermarkConfig {
    /// Text opacity clamped to [0, 100].
    pub fn text_opacity(&self) -> u8 {
        self.opacity.min(100)
    }

    /// Image watermark opacity clamped to [0, 100].
    pub fn overlay_opacity(&self) -> u8 {
        self.image_opacity.min(100)
    }

    /// True when neither a text nor an image watermark is configured.
    pub fn is_noop(&self) -> bool {
        self.text.is_empty() && self.image_path.is_none()
    }
}

/// Output options for one export pass: naming, format, quality, resize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Prefix prepended to the original file stem (underscore-joined when
    /// non-empty)
    pub prefix: String,
    /// Suffix appended to the original file stem
    pub suffix: String,
    /// Target encoding
    pub format: ExportFormat,
    /// JPEG quality 0-100; ignored for PNG
    pub quality: u8,
    /// Canvas resize applied before compositing
    pub resize: ResizeSpec,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            format: ExportFormat::Jpeg,
            quality: 80,
            resize: ResizeSpec::Original,
        }
    }
}

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Jpeg,
    Png,
}

impl ExportFormat {
    /// File extension for output naming.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Png => "png",
        }
    }

    /// Whether the encoded file can carry an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        matches!(self, ExportFormat::Png)
    }

    /// Parse a format name ("jpeg"/"jpg"/"png"), defaulting to JPEG.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "png" => ExportFormat::Png,
            _ => ExportFormat::Jpeg,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
