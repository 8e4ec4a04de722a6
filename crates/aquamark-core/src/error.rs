//! Error types for the Aquamark compositing pipeline.
//!
//! Errors are organized by stage so callers can tell per-image failures
//! (skip and continue the batch) apart from whole-batch gates like the
//! same-directory check.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Aquamark operations.
#[derive(Error, Debug)]
pub enum AquamarkError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Export pipeline errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors (templates)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Export pipeline errors, organized by stage.
///
/// `Decode`, `InvalidDimension` and `Encode` are per-image: the batch
/// records them and moves on. `SameDirectory` aborts the whole batch
/// before any file is written.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Source or watermark image could not be decoded
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Resize would produce a non-positive target dimension
    #[error("Invalid dimension for {path}: {message}")]
    InvalidDimension { path: PathBuf, message: String },

    /// Output directory contains one of the source images
    #[error("Output directory {dir} contains source images; refusing to export")]
    SameDirectory { dir: PathBuf },

    /// Encoding or writing the output file failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Decode exceeded the configured timeout
    #[error("Timeout decoding {path} after {timeout_ms}ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for Aquamark results.
pub type Result<T> = std::result::Result<T, AquamarkError>;

/// Convenience type alias for export-stage results.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
