//! Aquamark Core - Embeddable watermark compositing library.
//!
//! Aquamark takes source photos and a watermark configuration and
//! produces watermarked output files: text and/or image watermarks with
//! configurable placement, opacity, styling, and resizing.
//!
//! # Architecture
//!
//! The pipeline is pure per image, with no shared mutable state:
//!
//! ```text
//! Image → Decode → Resize → Text Layer → Image Layer → Encode → JPEG/PNG
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use aquamark_core::{Config, Exporter, ExportOptions, FontLibrary, WatermarkConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> aquamark_core::Result<()> {
//!     let config = Config::load()?;
//!     let fonts = Arc::new(FontLibrary::scan(&config.fonts_dir()));
//!     let exporter = Arc::new(Exporter::new(&config, fonts));
//!
//!     let watermark = WatermarkConfig {
//!         text: "© 2026".to_string(),
//!         ..Default::default()
//!     };
//!     let summary = exporter
//!         .export_batch(
//!             vec!["./photo.jpg".into()],
//!             &watermark,
//!             &ExportOptions::default(),
//!             "./out".as_ref(),
//!             |_, _| {},
//!         )
//!         .await?;
//!     println!("Exported {} files", summary.succeeded());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod fonts;
pub mod pipeline;
pub mod preview;
pub mod template;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{AquamarkError, ConfigError, ExportError, ExportResult, Result};
pub use fonts::FontLibrary;
pub use pipeline::{ExportSummary, Exporter, FileDiscovery};
pub use preview::{PreviewEngine, PreviewFrame};
pub use template::{load_templates, save_templates, TemplateMap, TemplateRecord};
pub use types::{
    Anchor, Color, ExportFormat, ExportOptions, PlacementSpec, ResizeSpec, WatermarkConfig,
    WatermarkScale,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
