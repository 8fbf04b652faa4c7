//! Flat-file document storage.
//!
//! Consumed by drivers (CLI, batch), not by the engine itself: the
//! engine receives documents from its caller and hands evolved ones
//! back through the result channel.

use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use quill_core::Document;

/// Errors from document storage.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability for loading and saving documents by id.
pub trait DocumentStore: Send + Sync {
    /// Load a document by id.
    fn load(&self, id: &str) -> Result<Document, StoreError>;

    /// Save a document under its id, replacing any previous content.
    fn save(&self, document: &Document) -> Result<(), StoreError>;

    /// Ids of all stored documents, in a stable (sorted) order.
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Directory of `<id>.txt` files, one per document.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Create a store rooted at `root`. The directory is created on
    /// first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file backing a document id.
    pub fn document_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.txt"))
    }

    fn ensure_root(&self) -> Result<(), StoreError> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
            tracing::info!(root = %self.root.display(), "created document store directory");
        }
        Ok(())
    }
}

impl DocumentStore for FsDocumentStore {
    fn load(&self, id: &str) -> Result<Document, StoreError> {
        let path = self.document_path(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(id, "loaded document");
        Ok(Document::from_text(id, &text))
    }

    fn save(&self, document: &Document) -> Result<(), StoreError> {
        self.ensure_root()?;
        fs::write(self.document_path(&document.id), document.to_text())?;
        tracing::info!(id = %document.id, "saved document");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_root()?;
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(id) = name.strip_suffix(".txt") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
