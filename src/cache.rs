//! Per-library cache: timestamp-validated manga snapshots in a JSON file
//!
//! The cache file lives inside the library root (one per library) and maps
//! manga ids to lightweight snapshots. Page lists are never persisted; they
//! dominate cache size and are cheap to rebuild from disk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CACHE_VERSION;
use crate::error::ScanError;
use crate::models::Manga;

/// Top-level key carrying the schema version of the whole file
const VERSION_KEY: &str = "_cache_version";

/// Persisted snapshot of one manga plus the validation timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Lightweight manga snapshot (every chapter's pages emptied)
    pub manga_data: Manga,
    /// Unix seconds when the snapshot was taken
    pub cache_timestamp: f64,
    /// Source directory mtime (unix seconds) at snapshot time
    pub dir_mtime: f64,
    /// Schema version of this entry
    pub cache_version: String,
}

/// Loads, validates and saves the per-library cache file.
///
/// The store never touches manga directories itself; validation stats the
/// directory handed in by the scanner, and `restore` is pure.
#[derive(Debug, Clone)]
pub struct CacheStore {
    version: String,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    /// Create a store using the current schema version
    pub fn new() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
        }
    }

    /// Load the cache file into an id → entry map.
    ///
    /// Fails soft on every path: a missing file or a version mismatch yields
    /// an empty map; malformed content yields an empty map after quarantining
    /// the file; entries that no longer decode are skipped with a warning.
    pub fn load(&self, cache_file: &Path) -> HashMap<String, CacheEntry> {
        if !cache_file.exists() {
            return HashMap::new();
        }

        let text = match std::fs::read_to_string(cache_file) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to read cache file {:?}: {}", cache_file, e);
                self.quarantine(cache_file);
                return HashMap::new();
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Cache file {:?} is not valid JSON: {}", cache_file, e);
                self.quarantine(cache_file);
                return HashMap::new();
            }
        };

        let Some(object) = value.as_object() else {
            log::warn!("Cache file {:?} has the wrong top-level shape", cache_file);
            self.quarantine(cache_file);
            return HashMap::new();
        };

        let file_version = object.get(VERSION_KEY).and_then(|v| v.as_str());
        if file_version != Some(self.version.as_str()) {
            log::info!(
                "Cache version mismatch ({:?} != {}), ignoring cache",
                file_version,
                self.version
            );
            return HashMap::new();
        }

        let mut entries = HashMap::new();
        for (manga_id, entry_value) in object {
            if manga_id == VERSION_KEY {
                continue;
            }
            match serde_json::from_value::<CacheEntry>(entry_value.clone()) {
                Ok(entry) => {
                    entries.insert(manga_id.clone(), entry);
                }
                Err(e) => {
                    log::warn!("Skipping undecodable cache entry {}: {}", manga_id, e);
                }
            }
        }

        log::info!("Cache loaded: {} entries", entries.len());
        entries
    }

    /// Save snapshots of `mangas` to the cache file.
    ///
    /// Each manga's source directory is stat-ed at save time so the entry
    /// records the mtime the snapshot corresponds to. A failure for one manga
    /// only omits that manga. The write is atomic: temp sibling then rename,
    /// so a concurrent reader never observes a half-written file.
    pub fn save(&self, cache_file: &Path, mangas: &[Manga]) -> Result<(), ScanError> {
        let mut object = serde_json::Map::new();
        object.insert(
            VERSION_KEY.to_string(),
            serde_json::Value::String(self.version.clone()),
        );

        let now = unix_seconds(SystemTime::now());
        for manga in mangas {
            let dir_mtime = match dir_mtime_seconds(&manga.path) {
                Some(mtime) => mtime,
                None => {
                    log::info!("Skipping cache entry for {}: directory not statable", manga.title);
                    continue;
                }
            };

            let entry = CacheEntry {
                manga_data: lightweight_snapshot(manga),
                cache_timestamp: now,
                dir_mtime,
                cache_version: self.version.clone(),
            };
            match serde_json::to_value(&entry) {
                Ok(value) => {
                    object.insert(manga.id.clone(), value);
                }
                Err(e) => {
                    log::info!("Skipping cache entry for {}: {}", manga.title, e);
                }
            }
        }

        let json = serde_json::to_string(&serde_json::Value::Object(object))
            .map_err(|e| ScanError::cache_save_failed(cache_file.to_path_buf(), e.to_string()))?;

        let temp_file = temp_sibling(cache_file);
        std::fs::write(&temp_file, &json)
            .map_err(|e| ScanError::cache_save_failed(temp_file.clone(), e.to_string()))?;
        std::fs::rename(&temp_file, cache_file)
            .map_err(|e| ScanError::cache_save_failed(cache_file.to_path_buf(), e.to_string()))?;

        log::info!(
            "Cache saved: {} mangas ({:.2} KB)",
            mangas.len(),
            json.len() as f64 / 1024.0
        );
        Ok(())
    }

    /// Decide whether a cache entry can stand in for re-scanning a directory.
    ///
    /// The 1-second tolerance is a deliberate fuzzy-equality check absorbing
    /// filesystem timestamp resolution differences across platforms.
    pub fn can_use_entry(&self, manga_dir: &Path, entry: Option<&CacheEntry>) -> bool {
        let Some(entry) = entry else {
            return false;
        };
        if entry.cache_version != self.version {
            return false;
        }
        match dir_mtime_seconds(manga_dir) {
            Some(dir_mtime) => (dir_mtime - entry.dir_mtime).abs() < 1.0,
            None => {
                log::warn!("Failed to stat {:?} for cache validation", manga_dir);
                false
            }
        }
    }

    /// Reconstruct a manga from a cache entry. Pure: page lists stay empty
    /// and the thumbnail is whatever was persisted; the scanner rebuilds both
    /// from disk afterwards.
    pub fn restore(&self, entry: &CacheEntry) -> Manga {
        entry.manga_data.clone()
    }

    /// Delete the cache file, returning whether one existed
    pub fn clear(&self, cache_file: &Path) -> Result<bool, ScanError> {
        if !cache_file.exists() {
            return Ok(false);
        }
        std::fs::remove_file(cache_file)
            .map_err(|e| ScanError::io_error(Some(cache_file.to_path_buf()), e.to_string()))?;
        log::info!("Cache cleared: {:?}", cache_file);
        Ok(true)
    }

    /// Rename a corrupt cache file out of the way (best effort)
    fn quarantine(&self, cache_file: &Path) {
        let timestamp = unix_seconds(SystemTime::now()) as i64;
        let file_name = cache_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("cache");
        let backup = cache_file.with_file_name(format!("{file_name}.corrupted.{timestamp}"));

        match std::fs::rename(cache_file, &backup) {
            Ok(()) => log::info!("Corrupt cache quarantined as {:?}", backup),
            Err(e) => log::error!("Failed to quarantine corrupt cache {:?}: {}", cache_file, e),
        }
    }
}

/// Snapshot with every chapter's page list emptied
fn lightweight_snapshot(manga: &Manga) -> Manga {
    let mut snapshot = manga.clone();
    for chapter in &mut snapshot.chapters {
        chapter.pages = Vec::new();
    }
    snapshot
}

/// Directory mtime as float unix seconds, `None` when the stat fails
pub(crate) fn dir_mtime_seconds(path: &Path) -> Option<f64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(unix_seconds(modified))
}

fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn temp_sibling(cache_file: &Path) -> PathBuf {
    let file_name = cache_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cache");
    cache_file.with_file_name(format!("{file_name}.tmp"))
}
