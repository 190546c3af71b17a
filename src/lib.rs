//! Manga library scanner with hybrid timestamp-validated caching
//!
//! This library indexes a directory tree (one folder per manga, one
//! subfolder per chapter, image files inside) into a structured catalog,
//! skipping re-scans of directories whose modification time matches a
//! persisted per-library cache.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod parser;
pub mod scanner;

pub use cache::{CacheEntry, CacheStore};
pub use config::{ScanConfig, CACHE_VERSION, DEFAULT_CACHE_FILE_NAME, DEFAULT_MAX_WORKERS};
pub use context::LibraryContext;
pub use error::{ScanError, ScanErrorKind};
pub use models::{Chapter, Library, Manga, Page};
pub use parser::{
    generate_manga_id, natural_sort_key, parse_chapter_name, sort_chapters, ChapterInfo,
};
pub use scanner::{CacheInfo, Scanner};
