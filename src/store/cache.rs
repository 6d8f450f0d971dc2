//! Key-value cache for per-file segment tables.
//!
//! Recognition is by far the most expensive step, so the phonemizer keeps
//! one segment table per audio file and skips the recognizer on a hit.
//! [`SegmentCache`] is the seam; [`DirCache`] stores `<key>.txt` files in a
//! directory and [`MemoryCache`] keeps everything in process.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use super::table::{SegmentTable, TableError};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cached entry for `{0}`")]
    Missing(String),

    #[error("invalid cache key {0:?}")]
    InvalidKey(String),

    #[error("cache table error: {0}")]
    Table(#[from] TableError),
}

/// Object-safe, thread-safe segment store.
pub trait SegmentCache: Send + Sync {
    fn has(&self, key: &str) -> bool;
    fn get(&self, key: &str) -> Result<SegmentTable, CacheError>;
    fn put(&self, key: &str, table: &SegmentTable) -> Result<(), CacheError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SegmentCache>) {}
};

/// Cache key for an audio file: its path without extension, one component
/// per `%2F`-joined part.
///
/// Files sharing a name in different directories get distinct keys.  `%`
/// and `\` inside a component are written as `%25` and `%5C`, so distinct
/// paths never map to the same key.  Root and `.` components are dropped.
///
/// ```
/// use std::path::Path;
/// use vowel_rhythm::store::cache_key;
///
/// assert_eq!(
///     cache_key(Path::new("HC_speakers/s01/read.wav")),
///     "HC_speakers%2Fs01%2Fread"
/// );
/// assert_eq!(cache_key(Path::new("read.wav")), "read");
/// ```
pub fn cache_key(audio: &Path) -> String {
    let Some(stem) = audio.file_stem() else {
        return String::new();
    };

    let mut parts: Vec<String> = audio
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(s) => Some(escape_component(&s.to_string_lossy())),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => None,
        })
        .collect();
    parts.push(escape_component(&stem.to_string_lossy()));
    parts.join("%2F")
}

fn escape_component(part: &str) -> String {
    part.replace('%', "%25").replace('\\', "%5C")
}

fn check_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// DirCache
// ---------------------------------------------------------------------------

/// One `<key>.txt` segment table per entry inside `dir`.
#[derive(Debug, Clone)]
pub struct DirCache {
    dir: PathBuf,
}

impl DirCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.txt"))
    }
}

impl SegmentCache for DirCache {
    fn has(&self, key: &str) -> bool {
        check_key(key).is_ok() && self.path_for(key).is_file()
    }

    fn get(&self, key: &str) -> Result<SegmentTable, CacheError> {
        check_key(key)?;
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(CacheError::Missing(key.to_string()));
        }
        Ok(SegmentTable::read_from(&path)?)
    }

    fn put(&self, key: &str, table: &SegmentTable) -> Result<(), CacheError> {
        check_key(key)?;
        let path = self.path_for(key);
        table.write_to(&path)?;
        log::debug!("cached {} segments at {}", table.len(), path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, SegmentTable>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SegmentTable>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SegmentCache for MemoryCache {
    fn has(&self, key: &str) -> bool {
        check_key(key).is_ok() && self.lock().contains_key(key)
    }

    fn get(&self, key: &str) -> Result<SegmentTable, CacheError> {
        check_key(key)?;
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::Missing(key.to_string()))
    }

    fn put(&self, key: &str, table: &SegmentTable) -> Result<(), CacheError> {
        check_key(key)?;
        self.lock().insert(key.to_string(), table.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
