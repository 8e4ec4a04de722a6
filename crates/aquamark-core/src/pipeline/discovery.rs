//! File discovery for building batch input lists from folders.
//!
//! The UI layer hands the pipeline plain path lists; this walks dropped
//! or imported folders and keeps only supported raster formats.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers image files in directories.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Expand a path into image files.
    ///
    /// A file path is returned as-is when supported; a directory is
    /// walked recursively. Results are sorted for deterministic batches.
    pub fn discover(&self, path: &Path) -> Vec<PathBuf> {
        if path.is_file() {
            if self.is_supported(path) {
                return vec![path.to_path_buf()];
            }
            return vec![];
        }

        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && self.is_supported(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// Expand a mixed list of files and folders, deduplicating.
    pub fn discover_all(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = paths.iter().flat_map(|p| self.discover(p)).collect();
        files.sort();
        files.dedup();
        files
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext)
            })
            .unwrap_or(false)
    }
}
