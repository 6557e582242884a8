//! Content store
//!
//! Document CRUD against the hosted backend, falling back to the local JSON
//! mapping whenever the backend is unavailable or a request fails. An
//! unconfigured or unreachable backend falls back silently; one that
//! rejects a call also leaves a [`StoreNotice`] for the user.

use crate::config::AppConfig;
use crate::document::{Document, DocumentError, NewDocument};
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// Submodules
mod local;
mod remote;

// Re-export public types
pub use local::{LocalStore, STORAGE_KEY};
pub use remote::{Backend, BackendError, RestBackend};

/// Errors that survive the fallback
///
/// Backend failures never show up here; only a failing local store does.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Local storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local storage holds invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Local storage at {0} is not a JSON object")]
    CorruptStorage(PathBuf),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Store operation a notice refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::List => "load documents",
            Self::Get => "load the document",
            Self::Create => "create the document",
            Self::Update => "save changes",
            Self::Delete => "delete the document",
        };
        f.write_str(verb)
    }
}

/// User-visible report of a backend failure that was absorbed locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNotice {
    pub operation: StoreOperation,
    pub document_id: Option<String>,
    /// Underlying backend error, for display
    pub detail: String,
}

impl StoreNotice {
    /// What the user can do about it
    pub fn retry_hint(&self) -> &'static str {
        match self.operation {
            StoreOperation::Update => "Your changes are kept locally. Save again to retry.",
            StoreOperation::Create | StoreOperation::Delete => {
                "The change was applied locally. Try again once the server is reachable."
            }
            StoreOperation::List | StoreOperation::Get => {
                "Showing locally stored documents. Reload to retry."
            }
        }
    }
}

impl fmt::Display for StoreNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not {} on the server ({}). {}",
            self.operation,
            self.detail,
            self.retry_hint()
        )
    }
}

/// Document store with local fallback
pub struct ContentStore {
    backend: Option<Box<dyn Backend>>,
    local: LocalStore,
    notices: Vec<StoreNotice>,
}

impl ContentStore {
    pub fn new(backend: Option<Box<dyn Backend>>, local: LocalStore) -> Self {
        Self {
            backend,
            local,
            notices: Vec::new(),
        }
    }

    /// Store that never talks to a backend
    pub fn local_only(local: LocalStore) -> Self {
        Self::new(None, local)
    }

    /// Build the store from configuration
    ///
    /// A backend that cannot be set up leaves the store local-only.
    pub fn from_config(config: &AppConfig) -> Self {
        let local = LocalStore::new(&config.storage.local_path);
        match RestBackend::from_config(&config.backend) {
            Ok(backend) => {
                log::info!("Using hosted backend table '{}'", config.backend.table);
                Self::new(Some(Box::new(backend)), local)
            }
            Err(BackendError::Unconfigured) => {
                log::warn!(
                    "Backend not configured, using local storage at {}",
                    config.storage.local_path.display()
                );
                Self::local_only(local)
            }
            Err(e) => {
                log::warn!("Backend unavailable ({}), using local storage", e);
                Self::local_only(local)
            }
        }
    }

    /// True when a backend is set up
    pub fn is_remote(&self) -> bool {
        self.backend.is_some()
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Drain the notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<StoreNotice> {
        std::mem::take(&mut self.notices)
    }

    /// All documents, most recently updated first
    pub fn get_all(&mut self) -> Result<Vec<Document>, StoreError> {
        if let Some(mut documents) =
            self.remote(StoreOperation::List, None, |backend| backend.fetch_all())
        {
            documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            return Ok(documents);
        }
        self.local.get_all()
    }

    /// Look up one document
    ///
    /// A document the backend does not know is still looked up locally,
    /// since it may have been created while the backend was failing.
    pub fn get_by_id(&mut self, id: &str) -> Result<Option<Document>, StoreError> {
        if let Some(Some(document)) =
            self.remote(StoreOperation::Get, Some(id), |backend| backend.fetch(id))
        {
            return Ok(Some(document));
        }
        self.local.get_by_id(id)
    }

    /// Create a document from a name, description and optional content
    ///
    /// # Returns
    /// * `Ok(Document)` - The stored document, remote or local
    /// * `Err(StoreError::Document)` - The name was blank
    pub fn create(&mut self, new: NewDocument) -> Result<Document, StoreError> {
        let document = Document::create(new, Utc::now())?;
        log::debug!("Creating document {} '{}'", document.id, document.name);

        if let Some(stored) = self.remote(StoreOperation::Create, Some(&document.id), |backend| {
            backend.insert(&document)
        }) {
            return Ok(stored);
        }
        self.local.create(&document)
    }

    /// Save a document, stamping a fresh modification time
    pub fn update(&mut self, document: &Document) -> Result<Document, StoreError> {
        let mut document = document.clone();
        document.refresh_structure();
        document.touch(Utc::now());

        if let Some(stored) = self.remote(StoreOperation::Update, Some(&document.id), |backend| {
            backend.update(&document)
        }) {
            return Ok(stored);
        }
        self.local.update(&document)
    }

    /// Delete a document
    ///
    /// A successful remote delete also drops any local copy.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        if self
            .remote(StoreOperation::Delete, Some(id), |backend| backend.delete(id))
            .is_some()
        {
            self.local.delete(id)?;
            return Ok(true);
        }
        self.local.delete(id)
    }

    /// Run a backend call, recording a notice when the backend rejects it
    ///
    /// An unconfigured or unreachable backend falls back without a notice.
    ///
    /// # Returns
    /// * `Some(T)` - The backend answered
    /// * `None` - Fall back to local storage
    fn remote<T, F>(&mut self, operation: StoreOperation, id: Option<&str>, call: F) -> Option<T>
    where
        F: FnOnce(&dyn Backend) -> Result<T, BackendError>,
    {
        let result = match self.backend.as_deref() {
            Some(backend) => call(backend),
            None => return None,
        };

        match result {
            Ok(value) => Some(value),
            Err(e) if e.is_unavailable() => {
                log::warn!("Backend unavailable ({}), falling back to local storage", e);
                None
            }
            Err(e) => {
                log::warn!("Backend failed to {}: {}", operation, e);
                self.notices.push(StoreNotice {
                    operation,
                    document_id: id.map(str::to_string),
                    detail: e.to_string(),
                });
                None
            }
        }
    }
}
