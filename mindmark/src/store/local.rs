//! Local fallback store
//!
//! A single JSON file standing in for browser local storage: a JSON object
//! of string keys, with every document kept as one array under
//! [`STORAGE_KEY`].

use super::StoreError;
use crate::document::Document;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Well-known key holding the document array
pub const STORAGE_KEY: &str = "mindmaps";

/// Document mapping persisted to one JSON file
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored document, most recently updated first
    pub fn get_all(&self) -> Result<Vec<Document>, StoreError> {
        let mut documents = self.read_documents()?;
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(documents)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.read_documents()?.into_iter().find(|d| d.id == id))
    }

    /// Store a new document, replacing any record with the same id
    pub fn create(&self, document: &Document) -> Result<Document, StoreError> {
        self.upsert(document)
    }

    /// Store an updated document
    ///
    /// A document missing from the local mapping is added, so a document
    /// created remotely stays reachable once the backend goes away.
    pub fn update(&self, document: &Document) -> Result<Document, StoreError> {
        self.upsert(document)
    }

    /// Remove a document
    ///
    /// # Returns
    /// * `Ok(true)` - A record was removed
    /// * `Ok(false)` - No record had that id
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut documents = self.read_documents()?;
        let before = documents.len();
        documents.retain(|d| d.id != id);
        let removed = documents.len() != before;
        if removed {
            self.write_documents(&documents)?;
        }
        Ok(removed)
    }

    fn upsert(&self, document: &Document) -> Result<Document, StoreError> {
        let mut documents = self.read_documents()?;
        match documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document.clone(),
            None => documents.push(document.clone()),
        }
        self.write_documents(&documents)?;
        Ok(document.clone())
    }

    fn read_storage(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::CorruptStorage(self.path.clone())),
        }
    }

    fn read_documents(&self) -> Result<Vec<Document>, StoreError> {
        match self.read_storage()?.remove(STORAGE_KEY) {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_documents(&self, documents: &[Document]) -> Result<(), StoreError> {
        let mut storage = self.read_storage()?;
        storage.insert(STORAGE_KEY.to_string(), serde_json::to_value(documents)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&storage)?)?;
        log::debug!(
            "Wrote {} documents to {}",
            documents.len(),
            self.path.display()
        );
        Ok(())
    }
}
