//! Search sources.
//!
//! A [`Source`] turns a fully built search URL into a [`ResultPage`]. The
//! [`SearchController`](crate::controller::SearchController) only talks to
//! this trait, so tests can swap the HTTP implementation for a
//! [`MockSource`] with scripted, delayed responses.

mod openlibrary;

pub mod mock;

pub use mock::MockSource;
pub use openlibrary::OpenLibrarySource;

use async_trait::async_trait;

use crate::models::ResultPage;

/// The transport seam between the controller and a catalog endpoint.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch and parse one page of results for `url`
    async fn fetch(&self, url: &str) -> Result<ResultPage, SourceError>;
}

/// Errors that can occur when fetching from a source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status
    #[error("Search request failed with HTTP status {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SourceError::Status(status.as_u16()),
            None => SourceError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
