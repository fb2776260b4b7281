//! Configuration file support for book-finder.
//!
//! This module provides TOML configuration file parsing. Every section and
//! key is optional; missing values fall back to the public Open Library
//! services.
//!
//! # Configuration File Format
//!
//! ```toml
//! [search]
//! endpoint = "https://openlibrary.org/search.json"
//! page_size = 24
//! debounce_ms = 300
//! max_result_index = 1000
//!
//! [covers]
//! base_url = "https://covers.openlibrary.org"
//! placeholder = "assets/cover-placeholder.svg"
//! size = "M"
//!
//! [links]
//! site_base = "https://openlibrary.org"
//! archive_base = "https://archive.org"
//!
//! [http]
//! timeout_secs = 30
//! user_agent = "book-finder/0.1"
//!
//! [logging]
//! level = "warn"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::SearchConfig;
use crate::models::{ARCHIVE_SITE, DEFAULT_PAGE_SIZE, OPENLIBRARY_SITE};
use crate::utils::{CoverSize, DEFAULT_COVERS_BASE, DEFAULT_PLACEHOLDER, DEFAULT_SEARCH_ENDPOINT};

/// Configuration file structure
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Search section
    #[serde(default)]
    pub search: SearchSection,

    /// Covers section
    #[serde(default)]
    pub covers: CoversConfig,

    /// Outbound links section
    #[serde(default)]
    pub links: LinksConfig,

    /// HTTP section
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Search endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_max_result_index")]
    pub max_result_index: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            max_result_index: default_max_result_index(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_SEARCH_ENDPOINT.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_max_result_index() -> u64 {
    1000
}

/// Cover image configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoversConfig {
    #[serde(default = "default_covers_base")]
    pub base_url: String,

    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    #[serde(default)]
    pub size: CoverSize,
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            base_url: default_covers_base(),
            placeholder: default_placeholder(),
            size: CoverSize::default(),
        }
    }
}

fn default_covers_base() -> String {
    DEFAULT_COVERS_BASE.to_string()
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

/// Outbound link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_site_base")]
    pub site_base: String,

    #[serde(default = "default_archive_base")]
    pub archive_base: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            site_base: default_site_base(),
            archive_base: default_archive_base(),
        }
    }
}

fn default_site_base() -> String {
    OPENLIBRARY_SITE.to_string()
}

fn default_archive_base() -> String {
    ARCHIVE_SITE.to_string()
}

/// HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` for structured output, anything else for human-readable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl LoggingConfig {
    /// Whether structured JSON log output was requested
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

impl From<ConfigFile> for SearchConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            endpoint: file.search.endpoint,
            page_size: file.search.page_size,
            debounce_ms: file.search.debounce_ms,
            max_result_index: file.search.max_result_index,
            covers_base: file.covers.base_url,
            placeholder: file.covers.placeholder,
            cover_size: file.covers.size,
            site_base: file.links.site_base,
            archive_base: file.links.archive_base,
            timeout_secs: file.http.timeout_secs,
            user_agent: file.http.user_agent,
        }
    }
}

impl From<&SearchConfig> for ConfigFile {
    fn from(config: &SearchConfig) -> Self {
        Self {
            search: SearchSection {
                endpoint: config.endpoint.clone(),
                page_size: config.page_size,
                debounce_ms: config.debounce_ms,
                max_result_index: config.max_result_index,
            },
            covers: CoversConfig {
                base_url: config.covers_base.clone(),
                placeholder: config.placeholder.clone(),
                size: config.cover_size,
            },
            links: LinksConfig {
                site_base: config.site_base.clone(),
                archive_base: config.archive_base.clone(),
            },
            http: HttpConfig {
                timeout_secs: config.timeout_secs,
                user_agent: config.user_agent.clone(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
