//! Record store: access to the remote document index.
//!
//! The [`RecordStore`] trait is the seam between the navigation/transfer core
//! and the wire protocol. [`HttpStore`] talks to the real index;
//! [`MockStore`] serves predefined pages for tests.

mod api;
pub mod mock;

pub use api::HttpStore;
pub use mock::MockStore;

use async_trait::async_trait;

use crate::models::{ArtifactLocation, ResultPage, SearchQuery};

/// Interface to the remote document index.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Fetch one page of results for a query. `page` is 1-based.
    async fn search(&self, query: &SearchQuery, page: u32) -> Result<ResultPage, StoreError>;

    /// Resolve the artifact location descriptor for a record instance id.
    async fn resolve_artifact(&self, instance: &str) -> Result<ArtifactLocation, StoreError>;
}

/// Errors that can occur when talking to the index
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Network or HTTP transport error
    #[error("network error: {0}")]
    Network(String),

    /// Non-success response from the index
    #[error("index returned an error: {0}")]
    Api(String),

    /// Malformed response payload
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for StoreError {
    fn from(err: quick_xml::DeError) -> Self {
        StoreError::Parse(format!("XML: {}", err))
    }
}
