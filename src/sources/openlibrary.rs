//! Open Library search source implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::models::{Book, ResultPage};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Open Library search source
///
/// Uses the public `search.json` endpoint.
#[derive(Debug, Clone)]
pub struct OpenLibrarySource {
    client: HttpClient,
}

impl OpenLibrarySource {
    /// Create a new source with default HTTP settings
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
        })
    }

    /// Create a source honoring the configured timeout and user agent
    pub fn from_config(config: &SearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::from_config(config)?,
        })
    }

    /// Create from an existing HTTP client
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }

    /// Parse a search response body
    pub(crate) fn parse_response(body: &str) -> Result<ResultPage, SourceError> {
        let data: SearchApiResponse = serde_json::from_str(body)?;
        Ok(data.into_page())
    }

    fn parse_doc(doc: SearchDoc) -> Book {
        Book {
            key: doc.key,
            title: doc.title,
            authors: doc.author_name,
            first_publish_year: doc.first_publish_year,
            subjects: doc.subject,
            cover_id: doc.cover_i,
            ia: doc.ia,
            edition_count: doc.edition_count,
        }
    }
}

#[async_trait]
impl Source for OpenLibrarySource {
    fn id(&self) -> &str {
        "openlibrary"
    }

    fn name(&self) -> &str {
        "Open Library"
    }

    async fn fetch(&self, url: &str) -> Result<ResultPage, SourceError> {
        let response = self
            .client
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search Open Library: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        Self::parse_response(&body)
    }
}

impl SearchApiResponse {
    fn into_page(self) -> ResultPage {
        let books = self
            .docs
            .into_iter()
            .map(OpenLibrarySource::parse_doc)
            .collect();
        ResultPage::new(self.num_found, self.start, books)
    }
}

// ===== Open Library API Types =====

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    start: u64,
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    author_name: Vec<String>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    subject: Vec<String>,
    cover_i: Option<i64>,
    #[serde(default)]
    ia: Vec<String>,
    edition_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_doc() {
        let body = r#"{
            "numFound": 1,
            "start": 0,
            "docs": [{
                "key": "/works/OL27448W",
                "title": "The Hobbit",
                "author_name": ["J.R.R. Tolkien"],
                "first_publish_year": 1937,
                "subject": ["Fantasy", "Dragons"],
                "cover_i": 6979861,
                "ia": ["hobbit00tolk"],
                "edition_count": 342
            }]
        }"#;

        let page = OpenLibrarySource::parse_response(body).unwrap();
        assert_eq!(page.num_found, 1);
        assert_eq!(page.len(), 1);

        let book = &page.books[0];
        assert_eq!(book.key, "/works/OL27448W");
        assert_eq!(book.authors, vec!["J.R.R. Tolkien"]);
        assert_eq!(book.subjects, vec!["Fantasy", "Dragons"]);
        assert_eq!(book.cover_id, Some(6979861));
        assert_eq!(book.edition_count, Some(342));
    }

    #[test]
    fn test_parse_sparse_doc() {
        let body = r#"{"numFound": 3, "docs": [{"key": "/works/OL1W", "title": "Untitled"}]}"#;
        let page = OpenLibrarySource::parse_response(body).unwrap();
        let book = &page.books[0];
        assert!(book.authors.is_empty());
        assert_eq!(book.cover_id, None);
        assert_eq!(page.start, 0);
    }

    #[test]
    fn test_parse_empty_result() {
        let page = OpenLibrarySource::parse_response(r#"{"numFound": 0, "docs": []}"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_missing_docs_is_parse_error() {
        let result = OpenLibrarySource::parse_response(r#"{"numFound": 10}"#);
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = OpenLibrarySource::parse_response("<html>busy</html>");
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }
}
