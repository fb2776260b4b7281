//! Book model representing one catalog entry returned by the search endpoint.

use serde::{Deserialize, Serialize};

/// Base URL of the catalog's human-facing site
pub const OPENLIBRARY_SITE: &str = "https://openlibrary.org";

/// Base URL of the reading-access service
pub const ARCHIVE_SITE: &str = "https://archive.org";

/// A single result record from a catalog search
///
/// Only the attributes requested through the fixed `fields` list are carried,
/// so rendering code may rely on exactly these being populated (or defaulted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Catalog key, e.g. `/works/OL27448W`
    pub key: String,

    /// Work title
    pub title: String,

    /// Author display names, in catalog order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Year of first publication
    pub first_publish_year: Option<i32>,

    /// Subject headings
    #[serde(default)]
    pub subjects: Vec<String>,

    /// Numeric cover image identifier
    pub cover_id: Option<i64>,

    /// Alternate-access (scan) identifiers
    #[serde(default)]
    pub ia: Vec<String>,

    /// Number of known editions
    pub edition_count: Option<u32>,
}

impl Book {
    /// Create a new book with required fields
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            authors: Vec::new(),
            first_publish_year: None,
            subjects: Vec::new(),
            cover_id: None,
            ia: Vec::new(),
            edition_count: None,
        }
    }

    /// Authors joined for display
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }

    /// First alternate-access identifier, if any
    pub fn access_id(&self) -> Option<&str> {
        self.ia.first().map(|s| s.as_str()).filter(|s| !s.is_empty())
    }

    /// Outbound link for this record using the public site defaults
    pub fn link(&self) -> String {
        self.link_with(OPENLIBRARY_SITE, ARCHIVE_SITE)
    }

    /// Outbound link: the reading-access page when a scan exists, otherwise
    /// the catalog detail page for the key.
    pub fn link_with(&self, site_base: &str, archive_base: &str) -> String {
        let site_base = site_base.trim_end_matches('/');
        let archive_base = archive_base.trim_end_matches('/');

        match self.access_id() {
            Some(ia) => format!("{}/details/{}", archive_base, ia),
            None if self.key.starts_with('/') => format!("{}{}", site_base, self.key),
            None => format!("{}/{}", site_base, self.key),
        }
    }
}

/// Builder for constructing Book objects
#[derive(Debug, Clone)]
pub struct BookBuilder {
    book: Book,
}

impl BookBuilder {
    /// Create a new builder with required fields
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            book: Book::new(key, title),
        }
    }

    /// Add an author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.book.authors.push(author.into());
        self
    }

    /// Set first publication year
    pub fn first_publish_year(mut self, year: i32) -> Self {
        self.book.first_publish_year = Some(year);
        self
    }

    /// Add a subject heading
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.book.subjects.push(subject.into());
        self
    }

    /// Set cover identifier
    pub fn cover_id(mut self, cover_id: i64) -> Self {
        self.book.cover_id = Some(cover_id);
        self
    }

    /// Add an alternate-access identifier
    pub fn ia(mut self, ia: impl Into<String>) -> Self {
        self.book.ia.push(ia.into());
        self
    }

    /// Set edition count
    pub fn edition_count(mut self, count: u32) -> Self {
        self.book.edition_count = Some(count);
        self
    }

    /// Build the Book
    pub fn build(self) -> Book {
        self.book
    }
}

/// One page of search results
///
/// Replaced wholesale on every completed fetch; never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPage {
    /// Total number of matches reported by the endpoint
    pub num_found: u64,

    /// Index of the first record on this page
    pub start: u64,

    /// Records on this page
    pub books: Vec<Book>,
}

impl ResultPage {
    /// Create a page from its parts
    pub fn new(num_found: u64, start: u64, books: Vec<Book>) -> Self {
        Self {
            num_found,
            start,
            books,
        }
    }

    /// An explicit page with no records
    pub fn empty(num_found: u64) -> Self {
        Self::new(num_found, 0, Vec::new())
    }

    /// Whether the page carries no records
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.books.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_builder() {
        let book = BookBuilder::new("/works/OL27448W", "The Hobbit")
            .author("J.R.R. Tolkien")
            .first_publish_year(1937)
            .subject("Fantasy")
            .cover_id(6979861)
            .edition_count(342)
            .build();

        assert_eq!(book.key, "/works/OL27448W");
        assert_eq!(book.title, "The Hobbit");
        assert_eq!(book.author_line(), "J.R.R. Tolkien");
        assert_eq!(book.first_publish_year, Some(1937));
        assert_eq!(book.cover_id, Some(6979861));
    }

    #[test]
    fn test_link_prefers_access_id() {
        let book = BookBuilder::new("/works/OL1W", "Scanned")
            .ia("hobbit00tolk")
            .ia("hobbit01tolk")
            .build();

        assert_eq!(book.link(), "https://archive.org/details/hobbit00tolk");
    }

    #[test]
    fn test_link_falls_back_to_catalog_page() {
        let book = Book::new("/works/OL1W", "Unscanned");
        assert_eq!(book.link(), "https://openlibrary.org/works/OL1W");

        let custom = book.link_with("http://localhost:8080/", "http://archive.local");
        assert_eq!(custom, "http://localhost:8080/works/OL1W");
    }

    #[test]
    fn test_empty_access_id_is_ignored() {
        let book = BookBuilder::new("/works/OL2W", "Blank scan").ia("").build();
        assert_eq!(book.access_id(), None);
        assert_eq!(book.link(), "https://openlibrary.org/works/OL2W");
    }

    #[test]
    fn test_empty_result_page() {
        let page = ResultPage::empty(0);
        assert!(page.is_empty());
        assert_eq!(page.len(), 0);
        assert_eq!(page.num_found, 0);
    }
}
