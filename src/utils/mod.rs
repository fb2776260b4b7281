//! Utility modules supporting the search client.
//!
//! - [`build_search_url`]: deterministic request URL construction
//! - [`CoverResolver`]: cover identifier to image URL, with a local fallback
//! - [`HttpClient`]: shared reqwest client with timeouts and user agent
//! - [`results_table`]: terminal rendering of a result page
//!
//! # Building a search URL
//!
//! ```rust
//! use book_finder::models::{FilterSet, RequestParams};
//! use book_finder::utils::{build_search_url, DEFAULT_SEARCH_ENDPOINT};
//!
//! let params = RequestParams::new(FilterSet::default().title("the hobbit").to_clauses());
//! let url = build_search_url(DEFAULT_SEARCH_ENDPOINT, &params);
//! assert!(url.contains(r#"?q=title:"the hobbit"&page=1&limit=24"#));
//! ```
//!
//! # Resolving covers
//!
//! ```rust
//! use book_finder::utils::{cover_url, CoverSize, DEFAULT_PLACEHOLDER};
//!
//! assert_eq!(
//!     cover_url(Some(8739161), CoverSize::Small),
//!     "https://covers.openlibrary.org/b/id/8739161-S.jpg"
//! );
//! assert_eq!(cover_url(None, CoverSize::Small), DEFAULT_PLACEHOLDER);
//! ```

mod cover;
mod display;
mod http;
mod query;

pub use cover::{cover_url, CoverResolver, CoverSize, DEFAULT_COVERS_BASE, DEFAULT_PLACEHOLDER};
pub use display::{
    book_table_columns, calculate_column_widths, display_width, format_year, is_terminal,
    pagination_footer, results_table, terminal_info, terminal_width, truncate_at_word,
    truncate_with_ellipsis, ColumnConfig, Terminal, DEFAULT_WIDTH,
};
pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use query::{
    build_clauses, build_q, build_query_string, build_search_url, escape_value,
    DEFAULT_SEARCH_ENDPOINT, SEARCH_FIELDS,
};
