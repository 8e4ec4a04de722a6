//! Font table construction and style-aware resolution.
//!
//! The fonts directory is scanned once, non-recursively, for `.ttf`/`.otf`
//! files. Each filename is split on the first `-` into a family name and a
//! style suffix (`bold`, `italic`, `bolditalic`, or none), e.g.
//! `arial-bolditalic.ttf` registers family `arial`, style `bolditalic`.
//!
//! Resolution never fails: the worst case falls back to an embedded
//! DejaVu Sans Mono face, so callers can always draw with the returned
//! handle.

use ab_glyph::FontArc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Embedded fallback font, used when a family is unknown or a file fails
/// to parse.
const DEFAULT_FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

static DEFAULT_FONT: OnceLock<FontArc> = OnceLock::new();

/// Style suffix keys in the font table.
const STYLE_BOLD: &str = "bold";
const STYLE_ITALIC: &str = "italic";
const STYLE_BOLD_ITALIC: &str = "bolditalic";
const STYLE_REGULAR: &str = "";

/// A registered font file, parsed at scan time.
#[derive(Clone)]
pub struct FontEntry {
    /// Path the font was loaded from
    pub path: PathBuf,
    /// Parsed face, ready for rasterization
    pub font: FontArc,
}

/// The family -> style -> font table, built once at startup and queried
/// read-only thereafter. Safe to share across concurrent exports.
pub struct FontLibrary {
    families: BTreeMap<String, BTreeMap<String, FontEntry>>,
}

impl FontLibrary {
    /// Build a library by scanning a fonts directory.
    ///
    /// Unreadable directories and unparseable files are logged and
    /// skipped; an empty library is still usable via the default font.
    pub fn scan(dir: &Path) -> Self {
        let mut families: BTreeMap<String, BTreeMap<String, FontEntry>> = BTreeMap::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot read fonts directory {:?}: {}", dir, e);
                return Self { families };
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || !is_font_file(&path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let stem = stem.to_lowercase();
            let (family, style) = match stem.split_once('-') {
                Some((family, style)) => (family.to_string(), style.to_string()),
                None => (stem, String::new()),
            };

            let data = match std::fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Cannot read font file {:?}: {}", path, e);
                    continue;
                }
            };
            let font = match FontArc::try_from_vec(data) {
                Ok(font) => font,
                Err(e) => {
                    tracing::warn!("Cannot parse font file {:?}: {}", path, e);
                    continue;
                }
            };

            families
                .entry(family)
                .or_default()
                .insert(style, FontEntry { path, font });
        }

        tracing::debug!("Font table built: {} families", families.len());
        Self { families }
    }

    /// An empty library; every resolution returns the default font.
    pub fn empty() -> Self {
        Self {
            families: BTreeMap::new(),
        }
    }

    /// Resolve a (family, bold, italic) request to a usable font.
    ///
    /// Fallback order: exact style match, then bold-only, then
    /// italic-only, then the family's base file, then any file in the
    /// family, then the embedded default.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> FontArc {
        let Some(styles) = self.families.get(&family.to_lowercase()) else {
            return default_font();
        };

        let wanted = match (bold, italic) {
            (true, true) => STYLE_BOLD_ITALIC,
            (true, false) => STYLE_BOLD,
            (false, true) => STYLE_ITALIC,
            (false, false) => STYLE_REGULAR,
        };

        if let Some(entry) = styles.get(wanted) {
            return entry.font.clone();
        }
        if bold {
            if let Some(entry) = styles.get(STYLE_BOLD) {
                return entry.font.clone();
            }
        }
        if italic {
            if let Some(entry) = styles.get(STYLE_ITALIC) {
                return entry.font.clone();
            }
        }
        if let Some(entry) = styles.get(STYLE_REGULAR) {
            return entry.font.clone();
        }
        if let Some(entry) = styles.values().next() {
            return entry.font.clone();
        }

        default_font()
    }

    /// Iterate registered families and their style names, for listing.
    pub fn families(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.families.iter().map(|(family, styles)| {
            let style_names = styles
                .keys()
                .map(|s| if s.is_empty() { "regular" } else { s.as_str() })
                .collect();
            (family.as_str(), style_names)
        })
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// True when no font files were registered.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// The embedded fallback font.
pub fn default_font() -> FontArc {
    DEFAULT_FONT
        .get_or_init(|| {
            FontArc::try_from_slice(DEFAULT_FONT_DATA).expect("embedded font data is valid")
        })
        .clone()
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ext == "ttf" || ext == "otf"
        })
        .unwrap_or(false)
}
