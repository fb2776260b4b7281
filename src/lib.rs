//! # Book Finder
//!
//! A search client for the Open Library catalog: it turns user-entered
//! filters into search URLs, fetches paginated results with a debounced,
//! cancellable request lifecycle, and renders them with cover images and
//! outbound links.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Book, FilterSet, RequestParams, etc.)
//! - [`sources`]: The transport trait with HTTP and mock implementations
//! - [`controller`]: Request lifecycle and the search status state machine
//! - [`utils`]: Query building, cover resolution, HTTP client, display
//! - [`config`]: Configuration management
//! - [`ui`]: Styled terminal messages

pub mod config;
pub mod controller;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use controller::{SearchController, SearchState, SearchStatus};
pub use models::{Book, FilterSet, RequestParams};
pub use sources::{OpenLibrarySource, Source};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
