//! Watermark compositing pipeline components.
//!
//! This module contains all the stages of the export pipeline:
//! - **discovery**: Find image files in directories
//! - **decode**: Load and decode source images
//! - **resize**: Canvas resizing ahead of compositing
//! - **placement**: Anchor and custom position resolution
//! - **text**: Text watermark rasterization
//! - **overlay**: Image watermark scaling and fading
//! - **compose**: Orchestrates compositing and batch export
//! - **encode**: Output naming and JPEG/PNG encoding

pub mod compose;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod overlay;
pub mod placement;
pub mod resize;
pub mod text;

// Re-exports for convenient access
pub use compose::{composite, check_output_dir, Exporter, ExportSummary};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::FileDiscovery;
pub use encode::{output_file_name, output_path};
pub use overlay::RenderedOverlay;
