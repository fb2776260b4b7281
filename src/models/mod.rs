//! Core data models for catalog records and search requests.

mod book;
mod search;

pub use book::{Book, BookBuilder, ResultPage, ARCHIVE_SITE, OPENLIBRARY_SITE};
pub use search::{
    normalize_text, FilterSet, ParamsUpdate, RequestParams, SearchClauses, SortMode,
    DEFAULT_PAGE_SIZE,
};
