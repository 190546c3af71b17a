//! Scanner module - hybrid scan-and-cache orchestration
//!
//! A scan of a library root runs in phases: discover manga directories,
//! classify each against the cache, restore cache hits, re-scan the rest
//! across a bounded worker pool, assemble the library and persist a fresh
//! cache. Every failure short of an invalid root degrades to a correct,
//! slower, uncached scan.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use crate::cache::{CacheEntry, CacheStore};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::models::{Chapter, Library, Manga, Page};
use crate::parser;

/// Summary of a library's cache file, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    /// Whether a cache file exists at all
    pub exists: bool,
    /// Cache file size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Cache file modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Number of manga entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    /// Schema version declared by the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Orchestrates library scanning with the hybrid timestamp-validated cache.
///
/// Holds no per-scan state; two scans of different roots can share one
/// scanner. Concurrent scans of the *same* root are not coordinated here
/// beyond the atomic cache write (last writer wins).
pub struct Scanner {
    config: ScanConfig,
    cache: CacheStore,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl Scanner {
    /// Create a scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            cache: CacheStore::new(),
        }
    }

    /// Access the active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Re-enable the hybrid cache
    pub fn enable_cache(&mut self) {
        self.config.cache_enabled = true;
        log::info!("Hybrid cache enabled");
    }

    /// Disable the hybrid cache (for debugging/troubleshooting)
    pub fn disable_cache(&mut self) {
        self.config.cache_enabled = false;
        log::info!("Hybrid cache disabled");
    }

    /// Scan a library root into a [`Library`].
    ///
    /// The only error that propagates is an invalid root (missing or not a
    /// directory). Cache corruption, worker pool trouble and per-title
    /// failures are all absorbed: the scan falls back to a direct sequential
    /// pass and still returns an equivalent catalog.
    pub fn scan_library(&self, root: &Path) -> Result<Library, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::invalid_root(root.to_path_buf()));
        }

        if !self.config.cache_enabled {
            log::info!("Cache disabled, using direct scan");
            return Ok(self.scan_sequential_uncached(root));
        }

        match self.scan_with_cache(root) {
            Ok(library) => Ok(library),
            Err(e) => {
                log::warn!("Hybrid cache scan failed, using fallback scanner: {}", e);
                Ok(self.scan_sequential_uncached(root))
            }
        }
    }

    /// Check that a path is a plausible library root: exists, is a
    /// directory, and contains at least one manga directory
    pub fn validate_library_path(&self, root: &Path) -> Result<(), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::invalid_root(root.to_path_buf()));
        }
        let dirs = self.discover_manga_dirs(root)?;
        if dirs.is_empty() {
            return Err(ScanError::invalid_root(root.to_path_buf()));
        }
        Ok(())
    }

    /// Delete the cache file of a library root, returning whether one existed
    pub fn clear_cache(&self, root: &Path) -> Result<bool, ScanError> {
        self.cache.clear(&self.cache_file(root))
    }

    /// Summarize the cache file of a library root
    pub fn cache_info(&self, root: &Path) -> CacheInfo {
        let cache_file = self.cache_file(root);
        let Ok(metadata) = std::fs::metadata(&cache_file) else {
            return CacheInfo {
                exists: false,
                size_bytes: None,
                modified: None,
                entries: None,
                version: None,
            };
        };

        let version = std::fs::read_to_string(&cache_file)
            .ok()
            .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
            .and_then(|value| {
                value
                    .get("_cache_version")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            });

        CacheInfo {
            exists: true,
            size_bytes: Some(metadata.len()),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            entries: Some(self.cache.load(&cache_file).len()),
            version,
        }
    }

    fn cache_file(&self, root: &Path) -> PathBuf {
        root.join(&self.config.cache_file_name)
    }

    /// The hybrid pipeline: discover, classify, restore, re-scan, persist
    fn scan_with_cache(&self, root: &Path) -> Result<Library, ScanError> {
        let start = Instant::now();
        log::info!("Starting hybrid scan: {:?}", root);

        let cache_file = self.cache_file(root);
        let cache_data = self.cache.load(&cache_file);

        let manga_dirs = self.discover_manga_dirs(root)?;
        log::info!("Found {} manga directories", manga_dirs.len());

        let (cached, to_scan) = self.classify(&manga_dirs, &cache_data);
        log::info!("Cache hits: {}, rescans: {}", cached.len(), to_scan.len());

        let fresh = if to_scan.is_empty() {
            Vec::new()
        } else {
            self.scan_dirs_parallel(&to_scan)
        };
        let freshly_scanned = !fresh.is_empty();

        let mut library = Library::new();
        for manga in cached.into_iter().chain(fresh) {
            library.add_manga(manga);
        }

        // The saved cache always reflects the complete catalog, not the delta
        if freshly_scanned {
            if let Err(e) = self.cache.save(&cache_file, &library.mangas) {
                log::warn!("{}", e);
            }
        }

        log::info!(
            "Hybrid scan finished in {:.2}s ({} mangas)",
            start.elapsed().as_secs_f64(),
            library.total_mangas
        );
        Ok(library)
    }

    /// Direct, uncached, sequential scan; produces an equivalent catalog to
    /// the hybrid pipeline, just slower. Per-title failures are absorbed.
    fn scan_sequential_uncached(&self, root: &Path) -> Library {
        let mut library = Library::new();

        let manga_dirs = match self.discover_manga_dirs(root) {
            Ok(dirs) => dirs,
            Err(e) => {
                log::warn!("Failed to list library root {:?}: {}", root, e);
                return library;
            }
        };

        for manga_dir in &manga_dirs {
            match self.scan_manga(manga_dir) {
                Ok(Some(manga)) => library.add_manga(manga),
                Ok(None) => {}
                Err(e) => log::warn!("Failed to scan {:?}: {}", manga_dir, e),
            }
        }

        library
    }

    /// List non-hidden manga directories directly under the root, sorted by
    /// case-insensitive name
    fn discover_manga_dirs(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut dirs = list_subdirs(root)?;
        dirs.sort_by_key(|d| {
            d.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        });
        Ok(dirs)
    }

    /// Partition directories into restored cache hits and dirs needing a
    /// re-scan. Any trouble restoring a hit demotes it to a re-scan.
    fn classify(
        &self,
        manga_dirs: &[PathBuf],
        cache_data: &HashMap<String, CacheEntry>,
    ) -> (Vec<Manga>, Vec<PathBuf>) {
        let mut cached = Vec::new();
        let mut to_scan = Vec::new();

        for manga_dir in manga_dirs {
            let manga_id = manga_dir
                .file_name()
                .and_then(|n| n.to_str())
                .map(parser::generate_manga_id);

            if let Some(entry) = manga_id.as_ref().and_then(|id| cache_data.get(id)) {
                if self.cache.can_use_entry(manga_dir, Some(entry)) {
                    let mut manga = self.cache.restore(entry);
                    match self.refresh_cached_manga(&mut manga) {
                        Ok(()) => {
                            cached.push(manga);
                            continue;
                        }
                        Err(e) => {
                            log::warn!("Failed to refresh {:?} from cache: {}", manga_dir, e)
                        }
                    }
                }
            }

            to_scan.push(manga_dir.clone());
        }

        (cached, to_scan)
    }

    /// Rebuild the lazy parts of a restored manga from disk: page lists
    /// (never persisted) and a missing thumbnail. The filesystem is ground
    /// truth, so a diverging page count is corrected here.
    fn refresh_cached_manga(&self, manga: &mut Manga) -> Result<(), ScanError> {
        if manga.thumbnail.is_none() && manga.path.exists() {
            manga.thumbnail = self.find_thumbnail(&manga.path);
        }

        let mut corrected = false;
        for chapter in &mut manga.chapters {
            if chapter.pages.is_empty() && chapter.path.exists() {
                chapter.pages = self.create_pages_lazy(&chapter.path)?;
                if chapter.pages.len() != chapter.page_count {
                    chapter.page_count = chapter.pages.len();
                    corrected = true;
                }
            }
        }
        if corrected {
            manga.total_pages = manga.chapters.iter().map(|c| c.page_count).sum();
        }

        Ok(())
    }

    /// Scan a batch of manga directories across a bounded worker pool.
    ///
    /// Pool width is `min(max_workers, batch size)`. A worker failure gets
    /// one synchronous retry outside the pool; a second failure drops that
    /// title. If the pool itself cannot start, the whole batch runs
    /// sequentially.
    fn scan_dirs_parallel(&self, manga_dirs: &[PathBuf]) -> Vec<Manga> {
        if manga_dirs.len() == 1 {
            return self
                .scan_manga_with_retry(&manga_dirs[0])
                .into_iter()
                .collect();
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.effective_workers(manga_dirs.len()))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::info!("{}", ScanError::pool_failure(e.to_string()));
                return self.scan_dirs_sequential(manga_dirs);
            }
        };

        let results: Vec<Result<Option<Manga>, ScanError>> =
            pool.install(|| manga_dirs.par_iter().map(|dir| self.scan_manga(dir)).collect());

        let mut mangas = Vec::new();
        for (manga_dir, result) in manga_dirs.iter().zip(results) {
            match result {
                Ok(Some(manga)) => mangas.push(manga),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Parallel scan failed for {:?}: {}", manga_dir, e);
                    match self.scan_manga(manga_dir) {
                        Ok(Some(manga)) => mangas.push(manga),
                        Ok(None) => {}
                        Err(e2) => {
                            log::warn!("Retry failed for {:?}, dropping title: {}", manga_dir, e2)
                        }
                    }
                }
            }
        }
        mangas
    }

    fn scan_dirs_sequential(&self, manga_dirs: &[PathBuf]) -> Vec<Manga> {
        manga_dirs
            .iter()
            .filter_map(|dir| self.scan_manga_with_retry(dir))
            .collect()
    }

    fn scan_manga_with_retry(&self, manga_dir: &Path) -> Option<Manga> {
        match self.scan_manga(manga_dir) {
            Ok(manga) => manga,
            Err(e) => {
                log::warn!("Scan failed for {:?}: {}", manga_dir, e);
                match self.scan_manga(manga_dir) {
                    Ok(manga) => manga,
                    Err(e2) => {
                        log::warn!("Retry failed for {:?}, dropping title: {}", manga_dir, e2);
                        None
                    }
                }
            }
        }
    }

    /// Scan one manga directory.
    ///
    /// Returns `Ok(None)` when the path is not a directory or yields zero
    /// qualifying chapters; such titles never enter the catalog.
    pub fn scan_manga(&self, manga_path: &Path) -> Result<Option<Manga>, ScanError> {
        if !manga_path.is_dir() {
            return Ok(None);
        }

        let name = dir_name(manga_path)?;
        let manga_id = parser::generate_manga_id(name);
        let mut manga = Manga::new(
            manga_id.clone(),
            name,
            manga_path.to_path_buf(),
            created_time(manga_path),
        );

        manga.thumbnail = self.find_thumbnail(manga_path);

        let mut chapters = self.scan_chapters(manga_path, &manga_id)?;
        if chapters.is_empty() {
            return Ok(None);
        }

        parser::sort_chapters(&mut chapters);
        manga.chapter_count = chapters.len();
        manga.total_pages = chapters.iter().map(|c| c.page_count).sum();
        manga.chapters = chapters;

        Ok(Some(manga))
    }

    /// Scan the chapter subdirectories of a manga in natural name order.
    /// The sequential index advances only on accepted chapters; it backs the
    /// chapter id when no number is parseable from the name.
    fn scan_chapters(&self, manga_path: &Path, manga_id: &str) -> Result<Vec<Chapter>, ScanError> {
        let mut chapter_dirs = list_subdirs(manga_path)?;
        chapter_dirs.sort_by_key(|d| {
            parser::natural_sort_key(&d.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default())
        });

        let mut chapters = Vec::new();
        let mut sequential_index = 1usize;
        for chapter_dir in &chapter_dirs {
            match self.scan_chapter(chapter_dir, manga_id, sequential_index) {
                Ok(Some(chapter)) => {
                    chapters.push(chapter);
                    sequential_index += 1;
                }
                Ok(None) => {}
                Err(e) => log::warn!("Failed to scan chapter {:?}: {}", chapter_dir, e),
            }
        }

        Ok(chapters)
    }

    /// Scan one chapter directory; `Ok(None)` when it holds no image files
    fn scan_chapter(
        &self,
        chapter_path: &Path,
        manga_id: &str,
        sequential_index: usize,
    ) -> Result<Option<Chapter>, ScanError> {
        let name = dir_name(chapter_path)?;
        let info = parser::parse_chapter_name(name);

        let pages = self.create_pages_lazy(chapter_path)?;
        if pages.is_empty() {
            return Ok(None);
        }

        // The sequential index only feeds the id; the numeric field stays
        // empty when the name carries no number
        let number_label = info
            .number
            .map(parser::format_chapter_number)
            .unwrap_or_else(|| sequential_index.to_string());

        Ok(Some(Chapter {
            id: format!("{manga_id}-ch-{number_label}"),
            name: name.to_string(),
            number: info.number,
            volume: info.volume,
            path: chapter_path.to_path_buf(),
            page_count: pages.len(),
            pages,
            date_added: created_time(chapter_path),
        }))
    }

    /// Build lazy pages for every qualifying image file, in natural filename
    /// order. No metadata is loaded.
    fn create_pages_lazy(&self, chapter_path: &Path) -> Result<Vec<Page>, ScanError> {
        let mut filenames = Vec::new();
        for entry in WalkDir::new(chapter_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = entry
                .map_err(|e| ScanError::io_error(Some(chapter_path.to_path_buf()), e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().to_string();
            if self.config.is_image_file(&filename) {
                filenames.push(filename);
            }
        }

        filenames.sort_by_key(|name| parser::natural_sort_key(name));

        Ok(filenames
            .into_iter()
            .map(|filename| {
                let path = chapter_path.join(&filename);
                Page::new(filename, path)
            })
            .collect())
    }

    /// Resolve a manga's cover: first image directly in the manga directory,
    /// else the first image of the first chapter, both in natural order
    fn find_thumbnail(&self, manga_path: &Path) -> Option<PathBuf> {
        if let Some(image) = self.first_image_in(manga_path) {
            return Some(image);
        }

        let mut chapter_dirs = list_subdirs(manga_path).ok()?;
        chapter_dirs.sort_by_key(|d| {
            parser::natural_sort_key(&d.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default())
        });
        chapter_dirs
            .first()
            .and_then(|first| self.first_image_in(first))
    }

    fn first_image_in(&self, dir: &Path) -> Option<PathBuf> {
        let mut images: Vec<String> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| self.config.is_image_file(name))
            .collect();

        images.sort_by_key(|name| parser::natural_sort_key(name));
        images.first().map(|name| dir.join(name))
    }
}

/// List non-hidden immediate subdirectories of a path
fn list_subdirs(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(path).min_depth(1).max_depth(1).follow_links(false) {
        let entry =
            entry.map_err(|e| ScanError::io_error(Some(path.to_path_buf()), e.to_string()))?;
        if entry.file_type().is_dir() && !is_hidden(entry.file_name()) {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Last path component as UTF-8, or an invalid-path error
fn dir_name(path: &Path) -> Result<&str, ScanError> {
    path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        ScanError::io_error(
            Some(path.to_path_buf()),
            "directory name is not valid UTF-8",
        )
    })
}

/// Directory creation time, with mtime and then scan time as fallbacks
fn created_time(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .ok()
        .and_then(|m| m.created().or_else(|_| m.modified()).ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Build `root/<manga>/<chapter>/<pages...>` fixtures on disk
    fn make_manga(root: &Path, manga: &str, chapters: &[(&str, &[&str])]) {
        for (chapter, pages) in chapters {
            let dir = root.join(manga).join(chapter);
            std::fs::create_dir_all(&dir).unwrap();
            for page in *pages {
                std::fs::write(dir.join(page), b"fake image").unwrap();
            }
        }
    }

    #[test]
    fn test_scan_library_invalid_root() {
        let scanner = Scanner::default();
        let err = scanner.scan_library(Path::new("/nonexistent/library")).unwrap_err();
        assert_eq!(err.kind, crate::error::ScanErrorKind::InvalidRoot);
    }

    #[test]
    fn test_end_to_end_scan() {
        let root = TempDir::new().unwrap();
        make_manga(
            root.path(),
            "OnePiece",
            &[
                ("Chapter 1", &["001.jpg", "002.jpg", "003.jpg"]),
                ("Chapter 2", &["001.jpg", "002.jpg"]),
            ],
        );
        // A manga directory with no chapter subdirectories is discarded
        std::fs::create_dir(root.path().join("Empty")).unwrap();

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();

        assert_eq!(library.total_mangas, 1);
        let manga = library.get_manga("onepiece").unwrap();
        assert_eq!(manga.chapter_count, 2);
        assert_eq!(manga.total_pages, 5);
        // Chapters are newest-first
        assert_eq!(manga.chapters[0].number, Some(2.0));
        assert_eq!(manga.chapters[1].number, Some(1.0));
    }

    #[test]
    fn test_chapter_without_images_is_discarded() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Solo", &[("Chapter 1", &["001.png"])]);
        let empty_chapter = root.path().join("Solo").join("Chapter 2");
        std::fs::create_dir_all(&empty_chapter).unwrap();
        std::fs::write(empty_chapter.join("notes.txt"), b"not an image").unwrap();

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();
        let manga = library.get_manga("solo").unwrap();

        assert_eq!(manga.chapter_count, 1);
        assert_eq!(manga.chapters[0].name, "Chapter 1");
    }

    #[test]
    fn test_hidden_directories_are_skipped() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Visible", &[("Chapter 1", &["001.jpg"])]);
        make_manga(root.path(), ".hidden", &[("Chapter 1", &["001.jpg"])]);

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();

        assert_eq!(library.total_mangas, 1);
        assert!(library.get_manga("visible").is_some());
    }

    #[test]
    fn test_pages_in_natural_order() {
        let root = TempDir::new().unwrap();
        make_manga(
            root.path(),
            "Pages",
            &[("Chapter 1", &["page10.jpg", "page2.jpg", "page1.jpg"])],
        );

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();
        let pages: Vec<&str> = library.get_manga("pages").unwrap().chapters[0]
            .pages
            .iter()
            .map(|p| p.filename.as_str())
            .collect();

        assert_eq!(pages, vec!["page1.jpg", "page2.jpg", "page10.jpg"]);
    }

    #[test]
    fn test_unnumbered_chapter_uses_sequential_index_in_id_only() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Oddballs", &[("Extras", &["a.jpg"])]);

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();
        let chapter = &library.get_manga("oddballs").unwrap().chapters[0];

        assert_eq!(chapter.id, "oddballs-ch-1");
        assert_eq!(chapter.number, None);
    }

    #[test]
    fn test_thumbnail_from_first_chapter() {
        let root = TempDir::new().unwrap();
        make_manga(
            root.path(),
            "NoCover",
            &[("Chapter 1", &["005.jpg", "001.jpg"]), ("Chapter 2", &["001.jpg"])],
        );

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();
        let thumbnail = library.get_manga("nocover").unwrap().thumbnail.clone().unwrap();

        assert!(thumbnail.ends_with(Path::new("Chapter 1").join("001.jpg")));
    }

    #[test]
    fn test_root_level_cover_preferred() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Covered", &[("Chapter 1", &["001.jpg"])]);
        std::fs::write(root.path().join("Covered").join("cover.png"), b"img").unwrap();

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();
        let thumbnail = library.get_manga("covered").unwrap().thumbnail.clone().unwrap();

        assert!(thumbnail.ends_with("cover.png"));
    }

    #[test]
    fn test_second_scan_served_from_cache() {
        let root = TempDir::new().unwrap();
        make_manga(
            root.path(),
            "Cached Manga",
            &[("Chapter 1", &["001.jpg", "002.jpg"])],
        );

        let scanner = Scanner::default();
        let first = scanner.scan_library(root.path()).unwrap();
        assert!(root.path().join(".catalog_cache.json").exists());

        let second = scanner.scan_library(root.path()).unwrap();
        assert_eq!(second.total_mangas, first.total_mangas);
        assert_eq!(second.total_chapters, first.total_chapters);
        assert_eq!(second.total_pages, first.total_pages);

        let manga = second.get_manga("cached-manga").unwrap();
        // Pages were rebuilt from disk, not the (page-free) cache snapshot
        assert_eq!(manga.chapters[0].pages.len(), 2);
        assert!(manga.thumbnail.is_some());
    }

    #[test]
    fn test_cache_entry_corrected_when_disk_diverges() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Drift", &[("Chapter 1", &["001.jpg"])]);

        let scanner = Scanner::default();
        scanner.scan_library(root.path()).unwrap();

        // Add a page inside the chapter; the manga dir mtime is untouched so
        // the cache entry stays valid, but counts must track the filesystem
        let chapter_dir = root.path().join("Drift").join("Chapter 1");
        std::fs::write(chapter_dir.join("002.jpg"), b"img").unwrap();

        let library = scanner.scan_library(root.path()).unwrap();
        let manga = library.get_manga("drift").unwrap();
        assert_eq!(manga.chapters[0].page_count, 2);
    }

    #[test]
    fn test_corrupt_cache_recovers_and_rewrites() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Resilient", &[("Chapter 1", &["001.jpg"])]);
        let cache_file = root.path().join(".catalog_cache.json");
        std::fs::write(&cache_file, "garbage{{{").unwrap();

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();

        assert_eq!(library.total_mangas, 1);
        // A fresh, valid cache was written after the quarantine
        let store = CacheStore::new();
        assert_eq!(store.load(&cache_file).len(), 1);
    }

    #[test]
    fn test_cache_disabled_still_scans() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Direct", &[("Chapter 1", &["001.jpg"])]);

        let scanner = Scanner::new(ScanConfig::builder().cache_enabled(false).build());
        let library = scanner.scan_library(root.path()).unwrap();

        assert_eq!(library.total_mangas, 1);
        assert!(!root.path().join(".catalog_cache.json").exists());
    }

    #[test]
    fn test_parallel_scan_of_many_titles() {
        let root = TempDir::new().unwrap();
        for i in 0..8 {
            make_manga(
                root.path(),
                &format!("Series {i}"),
                &[("Chapter 1", &["001.jpg"]), ("Chapter 2", &["001.jpg", "002.jpg"])],
            );
        }

        let scanner = Scanner::default();
        let library = scanner.scan_library(root.path()).unwrap();

        assert_eq!(library.total_mangas, 8);
        assert_eq!(library.total_chapters, 16);
        assert_eq!(library.total_pages, 8 * 3);
    }

    #[test]
    fn test_validate_library_path() {
        let root = TempDir::new().unwrap();
        let scanner = Scanner::default();

        // A root with no manga directories is rejected
        assert!(scanner.validate_library_path(root.path()).is_err());

        make_manga(root.path(), "Some Manga", &[("Chapter 1", &["001.jpg"])]);
        assert!(scanner.validate_library_path(root.path()).is_ok());
        assert!(scanner.validate_library_path(&root.path().join("missing")).is_err());
    }

    #[test]
    fn test_cache_info_and_clear() {
        let root = TempDir::new().unwrap();
        make_manga(root.path(), "Info", &[("Chapter 1", &["001.jpg"])]);
        let scanner = Scanner::default();

        assert!(!scanner.cache_info(root.path()).exists);

        scanner.scan_library(root.path()).unwrap();
        let info = scanner.cache_info(root.path());
        assert!(info.exists);
        assert_eq!(info.entries, Some(1));
        assert_eq!(info.version.as_deref(), Some(crate::config::CACHE_VERSION));

        assert!(scanner.clear_cache(root.path()).unwrap());
        assert!(!scanner.cache_info(root.path()).exists);
    }

    #[test]
    fn test_scan_manga_returns_none_for_file() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("not_a_dir.txt");
        std::fs::write(&file, b"x").unwrap();

        let scanner = Scanner::default();
        assert!(scanner.scan_manga(&file).unwrap().is_none());
    }
}
