//! Error types for the library scanner

use std::path::PathBuf;
use thiserror::Error;

/// Error kinds that can occur during scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Library root is missing or not a directory
    InvalidRoot,
    /// Cache file is unreadable, malformed or of the wrong version
    CacheCorrupt,
    /// A single manga directory failed to scan
    TitleScanFailed,
    /// The parallel worker pool could not be started
    PoolFailure,
    /// Writing the cache file failed
    CacheSaveFailed,
    /// I/O error during file operations
    IoError,
    /// Invalid path encoding
    InvalidPath,
}

/// Represents an error that occurred during scanning.
///
/// Only `InvalidRoot` ever propagates out of `Scanner::scan_library`; every
/// other kind is absorbed internally with a log line and a fallback.
#[derive(Debug, Error)]
#[error("{kind:?}: {message} (path: {path:?})")]
pub struct ScanError {
    /// The kind of error
    pub kind: ScanErrorKind,
    /// The path where the error occurred
    pub path: Option<PathBuf>,
    /// Human-readable error message
    pub message: String,
}

impl ScanError {
    /// Create a new scan error
    pub fn new(kind: ScanErrorKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Create an invalid-root error
    pub fn invalid_root(path: PathBuf) -> Self {
        Self::new(
            ScanErrorKind::InvalidRoot,
            Some(path.clone()),
            format!("Library root missing or not a directory: {:?}", path),
        )
    }

    /// Create a corrupt-cache error
    pub fn cache_corrupt(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::CacheCorrupt, Some(path), message)
    }

    /// Create a per-title scan failure
    pub fn title_scan_failed(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::TitleScanFailed, Some(path), message)
    }

    /// Create a worker pool failure
    pub fn pool_failure(message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::PoolFailure, None, message)
    }

    /// Create a cache save failure
    pub fn cache_save_failed(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::CacheSaveFailed, Some(path), message)
    }

    /// Create an I/O error
    pub fn io_error(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::IoError, path, message)
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ScanErrorKind::InvalidPath,
            _ => ScanErrorKind::IoError,
        };
        Self::new(kind, None, err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ScanErrorKind::CacheCorrupt, None, err.to_string())
    }
}
