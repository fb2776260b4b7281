//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::models::{Book, ResultPage};
use crate::sources::{Source, SourceError};

/// One scripted reply, chosen when the request URL contains `pattern`
#[derive(Debug, Clone)]
struct Reply {
    pattern: String,
    delay: Duration,
    result: Result<ResultPage, SourceError>,
}

/// A mock source for testing that returns predefined responses.
///
/// Replies are matched by substring against the requested URL, first match
/// wins; unmatched requests yield an empty page. Delays are driven by
/// `tokio::time`, so paused-clock tests stay deterministic.
#[derive(Debug, Default)]
pub struct MockSource {
    replies: Mutex<Vec<Reply>>,
    requests: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply immediately to URLs containing `pattern`.
    pub fn respond(&self, pattern: impl Into<String>, result: Result<ResultPage, SourceError>) {
        self.respond_after(pattern, Duration::ZERO, result);
    }

    /// Reply after `delay` to URLs containing `pattern`.
    pub fn respond_after(
        &self,
        pattern: impl Into<String>,
        delay: Duration,
        result: Result<ResultPage, SourceError>,
    ) {
        let mut guard = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push(Reply {
            pattern: pattern.into(),
            delay,
            result,
        });
    }

    /// Clear the configured replies.
    pub fn clear_responses(&self) {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// URLs fetched so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of fetches issued so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn fetch(&self, url: &str) -> Result<ResultPage, SourceError> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(url.to_string());

        let reply = {
            let guard = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
            guard.iter().find(|r| url.contains(&r.pattern)).cloned()
        };

        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => Ok(ResultPage::empty(0)),
        }
    }
}

/// Helper function to create a mock book for testing.
pub fn make_book(key: &str, title: &str) -> Book {
    Book::new(key, title)
}

/// Helper function to create a one-page result from books.
pub fn make_page(num_found: u64, books: Vec<Book>) -> ResultPage {
    ResultPage::new(num_found, 0, books)
}
