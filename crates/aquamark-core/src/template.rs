//! Named watermark templates and their JSON interchange format.
//!
//! A template file is a JSON mapping from template name to a flat record
//! of watermark settings. Every field is optional on read; missing
//! fields take the documented defaults so templates written by older
//! versions keep loading.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{Anchor, Color, PlacementSpec, WatermarkConfig, WatermarkScale};

/// One template record, in the on-disk field layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    #[serde(default)]
    pub watermark_text: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default = "Color::white")]
    pub color: Color,
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default)]
    pub outline: bool,
    #[serde(default)]
    pub image_watermark_path: Option<PathBuf>,
    #[serde(default)]
    pub image_watermark_scale: WatermarkScale,
    #[serde(default = "default_image_opacity")]
    pub image_watermark_opacity: u8,
    #[serde(default = "default_position_mode")]
    pub position_mode: String,
    /// Fractional top-left coordinate; present only when the user placed
    /// the watermark by hand. Supersedes `position_mode` when set.
    #[serde(default)]
    pub custom_pos: Option<[f64; 2]>,
}

fn default_font() -> String {
    "arial".to_string()
}

fn default_font_size() -> f32 {
    36.0
}

fn default_opacity() -> u8 {
    50
}

fn default_image_opacity() -> u8 {
    100
}

fn default_position_mode() -> String {
    "right_bottom".to_string()
}

impl Default for TemplateRecord {
    fn default() -> Self {
        Self {
            watermark_text: String::new(),
            font: default_font(),
            font_size: default_font_size(),
            bold: false,
            italic: false,
            color: Color::white(),
            opacity: default_opacity(),
            shadow: false,
            outline: false,
            image_watermark_path: None,
            image_watermark_scale: WatermarkScale::default(),
            image_watermark_opacity: default_image_opacity(),
            position_mode: default_position_mode(),
            custom_pos: None,
        }
    }
}

impl TemplateRecord {
    /// Apply the record as a watermark configuration.
    pub fn to_config(&self) -> WatermarkConfig {
        let placement = match self.custom_pos {
            Some([fx, fy]) => PlacementSpec::Custom { fx, fy },
            None => PlacementSpec::Anchor(Anchor::parse(&self.position_mode)),
        };

        WatermarkConfig {
            text: self.watermark_text.clone(),
            font_family: self.font.clone(),
            font_size: self.font_size,
            bold: self.bold,
            italic: self.italic,
            color: self.color,
            opacity: self.opacity.min(100),
            shadow: self.shadow,
            outline: self.outline,
            image_path: self.image_watermark_path.clone(),
            image_scale: self.image_watermark_scale,
            image_opacity: self.image_watermark_opacity.min(100),
            placement,
        }
    }

    /// Capture a watermark configuration as a template record.
    pub fn from_config(config: &WatermarkConfig) -> Self {
        let (position_mode, custom_pos) = match config.placement {
            PlacementSpec::Anchor(anchor) => (anchor.name().to_string(), None),
            PlacementSpec::Custom { fx, fy } => (default_position_mode(), Some([fx, fy])),
        };

        Self {
            watermark_text: config.text.clone(),
            font: config.font_family.clone(),
            font_size: config.font_size,
            bold: config.bold,
            italic: config.italic,
            color: config.color,
            opacity: config.opacity,
            shadow: config.shadow,
            outline: config.outline,
            image_watermark_path: config.image_path.clone(),
            image_watermark_scale: config.image_scale,
            image_watermark_opacity: config.image_opacity,
            position_mode,
            custom_pos,
        }
    }
}

/// A set of named templates, sorted by name for stable files.
pub type TemplateMap = BTreeMap<String, TemplateRecord>;

/// Load templates from a JSON file. A missing file is an empty set.
pub fn load_templates(path: &Path) -> Result<TemplateMap> {
    if !path.exists() {
        return Ok(TemplateMap::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let templates = serde_json::from_str(&contents)?;
    Ok(templates)
}

/// Write templates to a JSON file, creating parent directories.
pub fn save_templates(path: &Path, templates: &TemplateMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(templates)?;
    std::fs::write(path, contents)?;
    Ok(())
}
