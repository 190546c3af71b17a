//! Current-library state shared with collaborators
//!
//! An explicit, thread-safe value the caller constructs and passes around,
//! rather than an ambient global. The selected path is persisted to a small
//! text file so it survives process restarts; set on a successful scan
//! request, cleared on an explicit "clear library" action.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Default persistence file for the selected library path
pub const DEFAULT_STATE_FILE: &str = "last_library_path.txt";

/// Thread-safe holder for the currently selected library root
#[derive(Debug)]
pub struct LibraryContext {
    current: RwLock<Option<PathBuf>>,
    state_file: PathBuf,
}

impl Default for LibraryContext {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

impl LibraryContext {
    /// Create a context persisting to the given state file
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            current: RwLock::new(None),
            state_file: state_file.into(),
        }
    }

    /// The currently selected library root, if any
    pub fn get(&self) -> Option<PathBuf> {
        self.current.read().expect("library context lock poisoned").clone()
    }

    /// Select a library root and persist it
    pub fn set(&self, path: PathBuf) {
        if let Err(e) = std::fs::write(&self.state_file, path.to_string_lossy().as_bytes()) {
            log::warn!("Failed to persist library path: {}", e);
        }
        *self.current.write().expect("library context lock poisoned") = Some(path);
    }

    /// Clear the selection and remove the persisted path
    pub fn clear(&self) {
        *self.current.write().expect("library context lock poisoned") = None;
        if self.state_file.exists() {
            if let Err(e) = std::fs::remove_file(&self.state_file) {
                log::warn!("Failed to remove persisted library path: {}", e);
            }
        }
    }

    /// Whether a library is currently selected
    pub fn is_configured(&self) -> bool {
        self.current.read().expect("library context lock poisoned").is_some()
    }

    /// Whether the selected path still exists on disk
    pub fn validate_current(&self) -> bool {
        self.get().map(|p| p.exists()).unwrap_or(false)
    }

    /// Reload the persisted path from the state file, ignoring it when the
    /// directory no longer exists. Returns the adopted path, if any.
    pub fn load_persisted(&self) -> Option<PathBuf> {
        let text = std::fs::read_to_string(&self.state_file).ok()?;
        let path = PathBuf::from(text.trim());
        if path.as_os_str().is_empty() || !path.exists() {
            log::info!("Persisted library path no longer exists: {:?}", path);
            return None;
        }
        *self.current.write().expect("library context lock poisoned") = Some(path.clone());
        log::info!("Restored library path: {:?}", path);
        Some(path)
    }

    /// The file this context persists to
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }
}
