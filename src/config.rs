//! Configuration for the library scanner

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Schema version of persisted cache entries.
///
/// Bump this when the cached field set or the meaning of `number`/`volume`
/// changes; mismatched caches are discarded wholesale, never coerced.
pub const CACHE_VERSION: &str = "1.0";

/// Default cache file name, one per library root
pub const DEFAULT_CACHE_FILE_NAME: &str = ".catalog_cache.json";

/// Default width of the per-title worker pool
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Configuration for the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether the hybrid cache is used at all
    pub cache_enabled: bool,

    /// Name of the per-library cache file
    pub cache_file_name: String,

    /// Maximum number of parallel per-title scan workers
    pub max_workers: usize,

    /// Image file extensions that qualify as pages (lowercase, without dot)
    pub image_extensions: HashSet<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_file_name: DEFAULT_CACHE_FILE_NAME.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            image_extensions: Self::default_image_extensions(),
        }
    }
}

impl ScanConfig {
    /// Create a config builder
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
    }

    /// Get the default image extensions
    pub fn default_image_extensions() -> HashSet<String> {
        ["jpg", "jpeg", "png", "gif", "webp", "bmp"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Check if a file name has a qualifying image extension
    pub fn is_image_file(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.image_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Pool width for a batch of `pending` directories: never wider than the
    /// batch, never zero
    pub fn effective_workers(&self, pending: usize) -> usize {
        self.max_workers.min(pending).max(1)
    }
}

/// Builder for ScanConfig
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the hybrid cache
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache_enabled = enabled;
        self
    }

    /// Set the cache file name
    pub fn cache_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.cache_file_name = name.into();
        self
    }

    /// Set the worker pool width
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = workers;
        self
    }

    /// Set the qualifying image extensions
    pub fn image_extensions(mut self, extensions: HashSet<String>) -> Self {
        self.config.image_extensions = extensions;
        self
    }

    /// Build the config
    pub fn build(self) -> ScanConfig {
        self.config
    }
}
