//! Core data models: pages, chapters, manga and the library catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single page image inside a chapter directory.
///
/// Pages are created lazily: size and dimensions stay `None` until a
/// collaborator (e.g. the image endpoint) fills them in. The scanner never
/// decodes image bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// File name without path
    pub filename: String,
    /// Full path to the image file
    pub path: PathBuf,
    /// File size in bytes (lazy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Pixel width (lazy, never populated by the scanner)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height (lazy, never populated by the scanner)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Page {
    /// Create a lazy page with no metadata loaded
    pub fn new(filename: impl Into<String>, path: PathBuf) -> Self {
        Self {
            filename: filename.into(),
            path,
            size: None,
            width: None,
            height: None,
        }
    }
}

/// One ordered chapter directory within a manga.
///
/// A chapter with zero pages is never constructed; the scanner discards
/// such directories before they reach a [`Manga`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Unique id within the manga: `{manga_id}-ch-{number-or-index}`
    pub id: String,
    /// Raw directory name
    pub name: String,
    /// Parsed chapter number (supports fractional values like 1.5)
    pub number: Option<f64>,
    /// Parsed volume number
    pub volume: Option<i64>,
    /// Full path to the chapter directory
    pub path: PathBuf,
    /// Pages in natural filename order
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Number of qualifying image files in the directory
    pub page_count: usize,
    /// Directory creation time (scan time as fallback)
    pub date_added: DateTime<Utc>,
}

/// One manga title: a top-level library subdirectory with its chapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manga {
    /// Slug id derived from the directory name
    pub id: String,
    /// Raw directory name
    pub title: String,
    /// Full path to the manga directory
    pub path: PathBuf,
    /// Cover image path, if one was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PathBuf>,
    /// Chapters, newest-first (see `parser::sort_chapters`)
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Number of chapters
    pub chapter_count: usize,
    /// Sum of page counts over all chapters
    pub total_pages: usize,

    // Descriptive metadata, populated by collaborators only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the directory was first seen (directory creation time)
    pub date_added: DateTime<Utc>,
    /// Last modification timestamp
    pub date_modified: DateTime<Utc>,
}

impl Manga {
    /// Create a manga skeleton with no chapters yet
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        path: PathBuf,
        date_added: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path,
            thumbnail: None,
            chapters: Vec::new(),
            chapter_count: 0,
            total_pages: 0,
            author: None,
            artist: None,
            status: None,
            genres: Vec::new(),
            description: None,
            date_added,
            date_modified: date_added,
        }
    }
}

/// The full in-memory result of scanning a library root.
///
/// Aggregate counts are recomputed on every mutation. The catalog itself is
/// never persisted; only per-manga cache entries are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    /// Titles in scan/discovery order
    pub mangas: Vec<Manga>,
    /// Number of titles
    pub total_mangas: usize,
    /// Sum of chapter counts over all titles
    pub total_chapters: usize,
    /// Sum of page counts over all titles
    pub total_pages: usize,
    /// When the collection last changed
    pub last_updated: DateTime<Utc>,
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

impl Library {
    /// Create an empty library
    pub fn new() -> Self {
        Self {
            mangas: Vec::new(),
            total_mangas: 0,
            total_chapters: 0,
            total_pages: 0,
            last_updated: Utc::now(),
        }
    }

    /// Add a manga, replacing any existing one with the same id
    pub fn add_manga(&mut self, manga: Manga) {
        if let Some(pos) = self.mangas.iter().position(|m| m.id == manga.id) {
            self.mangas.remove(pos);
        }
        self.mangas.push(manga);
        self.update_stats();
    }

    /// Remove a manga by id, returning whether anything was removed
    pub fn remove_manga(&mut self, manga_id: &str) -> bool {
        if let Some(pos) = self.mangas.iter().position(|m| m.id == manga_id) {
            self.mangas.remove(pos);
            self.update_stats();
            true
        } else {
            false
        }
    }

    /// Look up a manga by id
    pub fn get_manga(&self, manga_id: &str) -> Option<&Manga> {
        self.mangas.iter().find(|m| m.id == manga_id)
    }

    /// Case-insensitive substring search over titles
    pub fn search(&self, query: &str) -> Vec<&Manga> {
        let query = query.to_lowercase();
        self.mangas
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&query))
            .collect()
    }

    fn update_stats(&mut self) {
        self.total_mangas = self.mangas.len();
        self.total_chapters = self.mangas.iter().map(|m| m.chapter_count).sum();
        self.total_pages = self.mangas.iter().map(|m| m.total_pages).sum();
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manga(id: &str, chapters: usize, pages_per_chapter: usize) -> Manga {
        let now = Utc::now();
        let mut manga = Manga::new(id, id.to_uppercase(), PathBuf::from(format!("/lib/{id}")), now);
        for i in 1..=chapters {
            manga.chapters.push(Chapter {
                id: format!("{id}-ch-{i}"),
                name: format!("Chapter {i}"),
                number: Some(i as f64),
                volume: None,
                path: PathBuf::from(format!("/lib/{id}/Chapter {i}")),
                pages: Vec::new(),
                page_count: pages_per_chapter,
                date_added: now,
            });
        }
        manga.chapter_count = chapters;
        manga.total_pages = chapters * pages_per_chapter;
        manga
    }

    #[test]
    fn test_add_manga_updates_stats() {
        let mut library = Library::new();
        library.add_manga(sample_manga("one-piece", 3, 20));
        library.add_manga(sample_manga("naruto", 2, 18));

        assert_eq!(library.total_mangas, 2);
        assert_eq!(library.total_chapters, 5);
        assert_eq!(library.total_pages, 3 * 20 + 2 * 18);
    }

    #[test]
    fn test_add_manga_replaces_same_id() {
        let mut library = Library::new();
        library.add_manga(sample_manga("one-piece", 3, 20));
        library.add_manga(sample_manga("one-piece", 5, 10));

        assert_eq!(library.total_mangas, 1);
        assert_eq!(library.total_chapters, 5);
        assert_eq!(library.total_pages, 50);
    }

    #[test]
    fn test_remove_manga() {
        let mut library = Library::new();
        library.add_manga(sample_manga("one-piece", 3, 20));

        assert!(library.remove_manga("one-piece"));
        assert!(!library.remove_manga("one-piece"));
        assert_eq!(library.total_mangas, 0);
        assert_eq!(library.total_pages, 0);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut library = Library::new();
        library.add_manga(sample_manga("one-piece", 1, 1));
        library.add_manga(sample_manga("berserk", 1, 1));

        let hits = library.search("PIE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "one-piece");
        assert!(library.search("zzz").is_empty());
    }

    #[test]
    fn test_page_serialization_skips_lazy_fields() {
        let page = Page::new("001.jpg", PathBuf::from("/lib/m/ch/001.jpg"));
        let json = serde_json::to_string(&page).unwrap();
        assert!(!json.contains("size"));
        assert!(!json.contains("width"));
    }
}
