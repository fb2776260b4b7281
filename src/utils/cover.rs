//! Cover image URL resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default cover image service
pub const DEFAULT_COVERS_BASE: &str = "https://covers.openlibrary.org";

/// Bundled asset shown when a record has no cover
pub const DEFAULT_PLACEHOLDER: &str = "assets/cover-placeholder.svg";

/// Size token understood by the cover service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverSize {
    #[serde(rename = "S")]
    Small,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl CoverSize {
    pub fn token(&self) -> &'static str {
        match self {
            CoverSize::Small => "S",
            CoverSize::Medium => "M",
            CoverSize::Large => "L",
        }
    }
}

impl fmt::Display for CoverSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for CoverSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" | "SMALL" => Ok(CoverSize::Small),
            "M" | "MEDIUM" => Ok(CoverSize::Medium),
            "L" | "LARGE" => Ok(CoverSize::Large),
            other => Err(format!("unknown cover size: {}", other)),
        }
    }
}

/// Maps optional cover identifiers to displayable URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverResolver {
    base_url: String,
    placeholder: String,
}

impl CoverResolver {
    /// Create a resolver for the given cover service and fallback asset
    pub fn new(base_url: impl Into<String>, placeholder: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            placeholder: placeholder.into(),
        }
    }

    /// The fallback asset path
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Resolve a cover URL; missing or non-positive identifiers yield the placeholder
    pub fn resolve(&self, cover_id: Option<i64>, size: CoverSize) -> String {
        match cover_id {
            Some(id) if id > 0 => format!("{}/b/id/{}-{}.jpg", self.base_url, id, size.token()),
            _ => self.placeholder.clone(),
        }
    }
}

impl Default for CoverResolver {
    fn default() -> Self {
        Self::new(DEFAULT_COVERS_BASE, DEFAULT_PLACEHOLDER)
    }
}

/// Resolve a cover URL against the public cover service
pub fn cover_url(cover_id: Option<i64>, size: CoverSize) -> String {
    CoverResolver::default().resolve(cover_id, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_url_with_id() {
        assert_eq!(
            cover_url(Some(6979861), CoverSize::Medium),
            "https://covers.openlibrary.org/b/id/6979861-M.jpg"
        );
        assert_eq!(
            cover_url(Some(1), CoverSize::Large),
            "https://covers.openlibrary.org/b/id/1-L.jpg"
        );
    }

    #[test]
    fn test_missing_or_invalid_id_uses_placeholder() {
        assert_eq!(cover_url(None, CoverSize::Small), DEFAULT_PLACEHOLDER);
        assert_eq!(cover_url(Some(0), CoverSize::Small), DEFAULT_PLACEHOLDER);
        assert_eq!(cover_url(Some(-5), CoverSize::Large), DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn test_custom_resolver_trims_base() {
        let resolver = CoverResolver::new("http://localhost:9000/", "/static/none.png");
        assert_eq!(
            resolver.resolve(Some(42), CoverSize::Small),
            "http://localhost:9000/b/id/42-S.jpg"
        );
        assert_eq!(resolver.resolve(None, CoverSize::Small), "/static/none.png");
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!("l".parse::<CoverSize>(), Ok(CoverSize::Large));
        assert_eq!("small".parse::<CoverSize>(), Ok(CoverSize::Small));
        assert!("xl".parse::<CoverSize>().is_err());
    }
}
