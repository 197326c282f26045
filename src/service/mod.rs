//! Download, decode and store pipeline behind the descriptor endpoint
//!
//! [`EdfFileService::process`] validates the URL, fetches the file through a
//! [`Retriever`], decodes its header and hands the result to a
//! [`MetadataStore`]. Every step blocks.

pub mod auth;
pub mod retriever;
pub mod store;

pub use auth::{AuthService, PresharedKeyAuth};
pub use retriever::{RetrievalError, Retriever, UrlRetriever};
pub use store::{InMemoryStore, JsonLinesStore, MetadataStore, StorageError, RECORD_TITLE};

use std::sync::Arc;

use reqwest::Url;
use thiserror::Error;
use tracing::{error, info};

use crate::error::EdfError;
use crate::reader::decode;
use crate::types::StoredMetadata;

/// Errors surfaced by [`EdfFileService::process`]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Rejected before anything was fetched
    #[error("{0}")]
    InvalidUrl(String),

    #[error("Failed to retrieve EDF file: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Failed to decode EDF header: {0}")]
    Decode(#[from] EdfError),

    #[error("Failed to store EDF metadata: {0}")]
    Storage(#[from] StorageError),
}

pub struct EdfFileService {
    retriever: Arc<dyn Retriever>,
    store: Arc<dyn MetadataStore>,
    allowed_schemes: Vec<String>,
}

impl EdfFileService {
    /// Creates a service accepting `http` and `https` URLs
    pub fn new(retriever: Arc<dyn Retriever>, store: Arc<dyn MetadataStore>) -> Self {
        Self {
            retriever,
            store,
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
        }
    }

    pub fn with_allowed_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_schemes = schemes
            .into_iter()
            .map(|s| s.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    /// Parses `file_url` and checks its scheme against the allowlist
    pub fn validate_url(&self, file_url: &str) -> Result<Url, ServiceError> {
        let file_url = file_url.trim();
        if file_url.is_empty() {
            return Err(ServiceError::InvalidUrl(
                "Invalid EDF file URL. Must be a valid HTTP/HTTPS URL.".to_string(),
            ));
        }

        let url = Url::parse(file_url)
            .map_err(|_| ServiceError::InvalidUrl(format!("Malformed EDF file URL: {}", file_url)))?;

        if !self.allowed_schemes.iter().any(|s| s == url.scheme()) {
            return Err(ServiceError::InvalidUrl(format!(
                "Invalid EDF file URL. Scheme must be one of: {}",
                self.allowed_schemes.join(", ")
            )));
        }
        Ok(url)
    }

    /// Fetches the EDF file at `file_url`, decodes its header and stores the result
    pub fn process(&self, file_url: &str) -> Result<StoredMetadata, ServiceError> {
        info!(url = %file_url, "Processing EDF file");

        let url = self.validate_url(file_url).map_err(|e| {
            error!(url = %file_url, error = %e, "Invalid EDF file URL");
            e
        })?;

        let mut source = self.retriever.fetch(&url).map_err(|e| {
            error!(url = %url, error = %e, "Failed to retrieve EDF file");
            ServiceError::from(e)
        })?;

        let metadata = decode(&mut *source).map_err(|e| {
            error!(url = %url, error = %e, "Failed to decode EDF header");
            ServiceError::from(e)
        })?;

        let stored = self.store.save(metadata).map_err(|e| {
            error!(url = %url, error = %e, "Failed to store EDF metadata");
            ServiceError::from(e)
        })?;

        info!(id = stored.id, url = %url, "EDF metadata saved");
        Ok(stored)
    }
}
