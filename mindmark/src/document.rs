//! Persisted mindmap documents

use crate::outline::{extract_outline, OutlineNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Content given to a freshly created document
pub const PLACEHOLDER_CONTENT: &str = "Start writing your content here...";

/// A mindmap document as stored in the content store
///
/// `content` is the source of truth; `structure` is derived from it and
/// rebuilt on every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Markdown text
    pub content: String,
    /// Heading tree derived from `content`
    pub structure: OutlineNode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDocument {
    pub name: String,
    pub description: Option<String>,
    /// Initial content; the placeholder when `None`
    pub content: Option<String>,
}

impl NewDocument {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Errors raised while building a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Documents need a non-blank name
    #[error("Document name must not be empty")]
    EmptyName,
}

impl Document {
    /// Build a new document with a fresh id and timestamps
    ///
    /// # Parameters
    /// * `new` - Name, optional description and optional initial content
    /// * `now` - Creation time, used for both timestamps
    ///
    /// # Returns
    /// * `Ok(Document)` - Document with its structure already derived
    /// * `Err(DocumentError)` - The name was blank
    pub fn create(new: NewDocument, now: DateTime<Utc>) -> Result<Self, DocumentError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(DocumentError::EmptyName);
        }

        let content = new
            .content
            .unwrap_or_else(|| PLACEHOLDER_CONTENT.to_string());
        let description = new
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let mut document = Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description,
            structure: OutlineNode::root(name),
            content: String::new(),
            created_at: now,
            updated_at: now,
        };
        document.set_content(&content);
        Ok(document)
    }

    /// Replace the content and rebuild the structure from it
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.refresh_structure();
    }

    /// Rebuild the structure from the current content
    pub fn refresh_structure(&mut self) {
        self.structure = extract_outline(&self.content).titled(self.name.as_str());
    }

    /// Stamp the modification time
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// True when the content yields no headings
    pub fn is_empty_outline(&self) -> bool {
        self.structure.children.is_empty()
    }
}
