//! Configuration management.

mod file_config;

pub use file_config::{
    ConfigFile, ConfigFileError, CoversConfig, HttpConfig, LinksConfig, LoggingConfig,
    SearchSection,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{CoverResolver, CoverSize};

/// Name of the configuration file looked up by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "book-finder.toml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "BOOK_FINDER";

/// Runtime settings handed to the search controller and the HTTP source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint (JSON)
    pub endpoint: String,

    /// Records per page
    pub page_size: u32,

    /// Quiet period before a request is issued
    pub debounce_ms: u64,

    /// Highest result index the endpoint will serve
    pub max_result_index: u64,

    /// Cover image service
    pub covers_base: String,

    /// Local asset used when a record has no cover
    pub placeholder: String,

    /// Cover size used when rendering results
    pub cover_size: CoverSize,

    /// Catalog site used for detail links
    pub site_base: String,

    /// Reading-access site used for scan links
    pub archive_base: String,

    /// Whole-request timeout
    pub timeout_secs: u64,

    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        ConfigFile::default().into()
    }
}

impl SearchConfig {
    /// Point the configuration at a different search endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the debounce window
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    /// Override the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cover resolver for the configured service and placeholder
    pub fn cover_resolver(&self) -> CoverResolver {
        CoverResolver::new(&self.covers_base, &self.placeholder)
    }
}

/// Load configuration from a file, with `BOOK_FINDER_*` environment overrides.
///
/// Nested keys use a double underscore, e.g. `BOOK_FINDER_SEARCH__PAGE_SIZE=12`.
pub fn load_config(path: &Path) -> Result<SearchConfig, ::config::ConfigError> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let file: ConfigFile = settings.try_deserialize()?;
    Ok(file.into())
}

/// Find a configuration file in the working directory or the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("book-finder").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration
pub fn get_config() -> SearchConfig {
    SearchConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.endpoint, "https://openlibrary.org/search.json");
        assert_eq!(config.page_size, 24);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.max_result_index, 1000);
        assert_eq!(config.cover_size, CoverSize::Medium);
    }

    #[test]
    fn test_builder_overrides() {
        let config = SearchConfig::default()
            .with_endpoint("http://127.0.0.1:1234/search.json")
            .with_debounce(Duration::from_millis(5))
            .with_page_size(10);
        assert_eq!(config.endpoint, "http://127.0.0.1:1234/search.json");
        assert_eq!(config.debounce_ms, 5);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book-finder.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(
            br#"
[search]
endpoint = "http://localhost:8080/search.json"
page_size = 12
debounce_ms = 150

[covers]
placeholder = "/img/blank.png"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/search.json");
        assert_eq!(config.page_size, 12);
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.placeholder, "/img/blank.png");
        assert_eq!(config.max_result_index, 1000);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/book-finder.toml"));
        assert!(result.is_err());
    }
}
