//! Hosted table backend
//!
//! Talks to a PostgREST-style table API (`/rest/v1/<table>`), the shape
//! exposed by hosted backend-as-a-service providers. Every request carries
//! the anonymous key both as `apikey` and as a bearer token.

use crate::config::BackendConfig;
use crate::document::Document;
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors from the hosted backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// URL or key missing; never reaches the network
    #[error("Backend is not configured")]
    Unconfigured,

    /// Connection refused or timed out; treated like a missing backend
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A write returned no row
    #[error("Backend returned no record for {0}")]
    NoRecord(String),
}

impl BackendError {
    /// True when the backend could not be used at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unconfigured | Self::Unreachable(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Unreachable(e.to_string())
        } else {
            Self::Request(e)
        }
    }
}

/// Remote CRUD over the document table
pub trait Backend {
    /// All documents, most recently updated first
    fn fetch_all(&self) -> Result<Vec<Document>, BackendError>;

    /// One document, `None` when the table has no such id
    fn fetch(&self, id: &str) -> Result<Option<Document>, BackendError>;

    /// Insert a new document and return the stored row
    fn insert(&self, document: &Document) -> Result<Document, BackendError>;

    /// Update the mutable fields of a document and return the stored row
    fn update(&self, document: &Document) -> Result<Document, BackendError>;

    fn delete(&self, id: &str) -> Result<(), BackendError>;
}

/// Columns written by an update
#[derive(Serialize)]
struct DocumentPatch<'a> {
    name: &'a str,
    description: Option<&'a str>,
    content: &'a str,
    structure: &'a crate::outline::OutlineNode,
    updated_at: DateTime<Utc>,
}

/// HTTP client for the table API
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RestBackend {
    /// Build a client from configuration
    ///
    /// # Returns
    /// * `Ok(RestBackend)` - Client ready to use
    /// * `Err(BackendError::Unconfigured)` - URL or key missing
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        if !config.is_configured() {
            return Err(BackendError::Unconfigured);
        }
        let (Some(url), Some(api_key)) = (&config.url, &config.api_key) else {
            return Err(BackendError::Unconfigured);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", url.trim_end_matches('/'), config.table),
            api_key: api_key.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(BackendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn first_row(rows: Vec<Document>, id: &str) -> Result<Document, BackendError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NoRecord(id.to_string()))
    }
}

impl Backend for RestBackend {
    fn fetch_all(&self) -> Result<Vec<Document>, BackendError> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("order", "updated_at.desc")]);
        let response = Self::check(self.authorized(request).send()?)?;
        Self::decode(response)
    }

    fn fetch(&self, id: &str) -> Result<Option<Document>, BackendError> {
        let filter = format!("eq.{}", id);
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("id", filter.as_str())]);
        let response = Self::check(self.authorized(request).send()?)?;
        let rows: Vec<Document> = Self::decode(response)?;
        Ok(rows.into_iter().next())
    }

    fn insert(&self, document: &Document) -> Result<Document, BackendError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=representation")
            .json(&[document]);
        let response = Self::check(self.authorized(request).send()?)?;
        Self::first_row(Self::decode(response)?, &document.id)
    }

    fn update(&self, document: &Document) -> Result<Document, BackendError> {
        let patch = DocumentPatch {
            name: &document.name,
            description: document.description.as_deref(),
            content: &document.content,
            structure: &document.structure,
            updated_at: document.updated_at,
        };
        let filter = format!("eq.{}", document.id);
        let request = self
            .client
            .patch(&self.endpoint)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = Self::check(self.authorized(request).send()?)?;
        Self::first_row(Self::decode(response)?, &document.id)
    }

    fn delete(&self, id: &str) -> Result<(), BackendError> {
        let filter = format!("eq.{}", id);
        let request = self
            .client
            .delete(&self.endpoint)
            .query(&[("id", filter.as_str())]);
        Self::check(self.authorized(request).send()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_backend_is_refused() {
        let config = BackendConfig::default();
        assert!(matches!(
            RestBackend::from_config(&config),
            Err(BackendError::Unconfigured)
        ));
    }

    #[test]
    fn test_refused_connection_is_unreachable() {
        let config = BackendConfig {
            url: Some("http://127.0.0.1:1".to_string()),
            api_key: Some("anon".to_string()),
            timeout_secs: 2,
            ..BackendConfig::default()
        };
        let backend = RestBackend::from_config(&config).unwrap();
        let error = backend.fetch_all().unwrap_err();
        assert!(error.is_unavailable(), "unexpected error: {}", error);
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = BackendConfig {
            url: Some("https://project.example.co/".to_string()),
            api_key: Some("anon".to_string()),
            ..BackendConfig::default()
        };
        let backend = RestBackend::from_config(&config).unwrap();
        assert_eq!(backend.endpoint, "https://project.example.co/rest/v1/mindmaps");
    }
}
