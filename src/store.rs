//! In-memory document store.
//!
//! Loads every recognized document from a directory, extracts per-page text
//! once, and serves the result as an immutable snapshot. A reload rebuilds
//! the whole cache and swaps it in atomically, so scorer passes that started
//! against the old snapshot keep a consistent view.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::extract;

/// One extracted document: page number (1-based, contiguous) to plain text.
///
/// Immutable once built; a reload replaces the containing snapshot wholesale.
#[derive(Debug, Clone)]
pub struct Document {
    pages: BTreeMap<u32, String>,
}

impl Document {
    /// Builds a document from per-page texts, numbering pages from 1.
    pub fn from_pages(texts: Vec<String>) -> Self {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| (i as u32 + 1, text))
            .collect();
        Self { pages }
    }

    pub fn pages(&self) -> &BTreeMap<u32, String> {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Filename-keyed corpus snapshot handed to the scorer.
pub type Corpus = BTreeMap<String, Document>;

/// Process-wide document cache over a single directory.
pub struct DocumentStore {
    dir: PathBuf,
    cache: RwLock<Arc<Corpus>>,
}

impl DocumentStore {
    /// Creates an empty store over `dir`. Nothing is read until [`load`].
    ///
    /// [`load`]: DocumentStore::load
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(Arc::new(Corpus::new())),
        }
    }

    /// Creates a store and runs the initial load pass.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(dir);
        let count = store.load()?;
        tracing::info!("loaded {} documents from {}", count, store.dir.display());
        Ok(store)
    }

    /// Scans the directory and rebuilds the cache, returning the document count.
    ///
    /// A missing directory is created and yields an empty cache, not an error.
    /// A file whose extraction fails is logged and skipped; the load continues.
    /// The new cache replaces the old one in a single pointer swap.
    pub fn load(&self) -> Result<usize> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
            self.swap(Corpus::new());
            return Ok(0);
        }

        let mut corpus = Corpus::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let filename = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !extract::is_supported(&filename) {
                continue;
            }
            match extract::extract_pages(&entry.path()) {
                Ok(pages) => {
                    let doc = Document::from_pages(pages);
                    tracing::info!("loaded document {} ({} pages)", filename, doc.page_count());
                    corpus.insert(filename, doc);
                }
                Err(err) => {
                    tracing::warn!("skipping {}: {}", filename, err);
                }
            }
        }

        let count = corpus.len();
        self.swap(corpus);
        Ok(count)
    }

    /// Clears the cache and re-runs the load pass, returning the new count.
    pub fn reload(&self) -> Result<usize> {
        tracing::info!("reloading documents from {}", self.dir.display());
        self.load()
    }

    /// Current cache keys.
    pub fn list(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    /// A consistent view of the corpus for one scorer pass. Cheap to clone;
    /// unaffected by concurrent reloads.
    pub fn snapshot(&self) -> Arc<Corpus> {
        self.cache.read().expect("document cache lock poisoned").clone()
    }

    /// Pure join of the store directory and a filename. Existence is not
    /// checked; callers must verify before use.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn swap(&self, corpus: Corpus) {
        *self.cache.write().expect("document cache lock poisoned") = Arc::new(corpus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_files(files: &[(&str, &str)]) -> (TempDir, DocumentStore) {
        let tmp = TempDir::new().unwrap();
        for (name, body) in files {
            std::fs::write(tmp.path().join(name), body).unwrap();
        }
        let store = DocumentStore::open(tmp.path()).unwrap();
        (tmp, store)
    }

    #[test]
    fn loads_text_documents() {
        let (_tmp, store) = store_with_files(&[
            ("alpha.txt", "rust programming notes"),
            ("beta.md", "deployment checklist"),
        ]);
        let mut docs = store.list();
        docs.sort();
        assert_eq!(docs, vec!["alpha.txt", "beta.md"]);

        let corpus = store.snapshot();
        let alpha = corpus.get("alpha.txt").unwrap();
        assert_eq!(alpha.page_count(), 1);
        assert_eq!(alpha.pages().get(&1).unwrap(), "rust programming notes");
    }

    #[test]
    fn unrecognized_files_are_ignored() {
        let (_tmp, store) = store_with_files(&[
            ("alpha.txt", "notes"),
            ("archive.zip", "binary junk"),
        ]);
        assert_eq!(store.list(), vec!["alpha.txt"]);
    }

    #[test]
    fn broken_pdf_is_skipped_not_fatal() {
        let (_tmp, store) = store_with_files(&[
            ("broken.pdf", "this is not a pdf"),
            ("alpha.txt", "notes"),
        ]);
        assert_eq!(store.list(), vec!["alpha.txt"]);
    }

    #[test]
    fn missing_directory_is_created_and_empty() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("not_yet_here");
        let store = DocumentStore::new(&dir);
        let count = store.load().unwrap();
        assert_eq!(count, 0);
        assert!(dir.is_dir());
        assert!(store.list().is_empty());
    }

    #[test]
    fn reload_picks_up_new_files() {
        let (tmp, store) = store_with_files(&[("alpha.txt", "one")]);
        std::fs::write(tmp.path().join("beta.txt"), "two").unwrap();
        let count = store.reload().unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn reload_on_deleted_directory_returns_zero() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("corpus");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("alpha.txt"), "one").unwrap();
        let store = DocumentStore::open(&dir).unwrap();
        assert_eq!(store.list().len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
        let count = store.reload().unwrap();
        assert_eq!(count, 0);
        assert!(store.list().is_empty());
    }

    #[test]
    fn snapshot_is_isolated_from_reload() {
        let (tmp, store) = store_with_files(&[("alpha.txt", "one")]);
        let before = store.snapshot();
        std::fs::write(tmp.path().join("beta.txt"), "two").unwrap();
        store.reload().unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn path_for_joins_without_checking_existence() {
        let (_tmp, store) = store_with_files(&[]);
        let path = store.path_for("ghost.pdf");
        assert!(path.ends_with("ghost.pdf"));
        assert!(!path.exists());
    }
}
