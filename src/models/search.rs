//! Search filter, request parameter and update models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of records requested per page when nothing else is configured
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Sort mode for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// The endpoint's own ranking
    #[default]
    Relevance,
    /// Newest first publication first
    New,
    /// Oldest first publication first
    Old,
    /// Alphabetical by title
    Title,
    /// Highest reader rating first
    Rating,
    /// Most editions first
    Editions,
    /// Random order
    Random,
}

impl SortMode {
    /// Value of the `sort` query parameter, `None` for the endpoint default
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            SortMode::Relevance => None,
            SortMode::New => Some("new"),
            SortMode::Old => Some("old"),
            SortMode::Title => Some("title"),
            SortMode::Rating => Some("rating"),
            SortMode::Editions => Some("editions"),
            SortMode::Random => Some("random"),
        }
    }

    /// Lowercase identifier
    pub fn id(&self) -> &'static str {
        self.as_param().unwrap_or("relevance")
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "relevance" => Ok(SortMode::Relevance),
            "new" | "newest" => Ok(SortMode::New),
            "old" | "oldest" => Ok(SortMode::Old),
            "title" => Ok(SortMode::Title),
            "rating" => Ok(SortMode::Rating),
            "editions" => Ok(SortMode::Editions),
            "random" => Ok(SortMode::Random),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

/// Trim a user-entered value and collapse internal whitespace runs.
///
/// Returns `None` when nothing but whitespace was entered.
pub fn normalize_text(value: &str) -> Option<String> {
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn parse_year(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// The raw, user-facing form fields
///
/// Every field is kept exactly as typed; nothing is parsed until the set is
/// submitted through [`FilterSet::to_clauses`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Free-text query
    #[serde(default)]
    pub query: String,

    /// Title filter
    #[serde(default)]
    pub title: String,

    /// Author filter
    #[serde(default)]
    pub author: String,

    /// Subject filter
    #[serde(default)]
    pub subject: String,

    /// Language code filter (e.g. "eng")
    #[serde(default)]
    pub language: String,

    /// Lower bound of first publication year
    #[serde(default)]
    pub year_from: String,

    /// Upper bound of first publication year
    #[serde(default)]
    pub year_to: String,

    /// Sort mode
    #[serde(default)]
    pub sort: SortMode,
}

impl FilterSet {
    /// Create a filter set with only a free-text query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set title filter
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set author filter
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set subject filter
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set language filter
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the publication year range; either side may be left empty
    pub fn years(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.year_from = from.into();
        self.year_to = to.into();
        self
    }

    /// Set sort mode
    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Normalize the form into structured clauses.
    ///
    /// Year fields that do not parse as integers are dropped.
    pub fn to_clauses(&self) -> SearchClauses {
        SearchClauses {
            text: normalize_text(&self.query),
            title: normalize_text(&self.title),
            author: normalize_text(&self.author),
            subject: normalize_text(&self.subject),
            language: normalize_text(&self.language),
            year_from: parse_year(&self.year_from),
            year_to: parse_year(&self.year_to),
        }
    }
}

/// Structured search clauses derived from a [`FilterSet`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchClauses {
    /// Free-text clause, emitted without a field prefix
    pub text: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub language: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

impl SearchClauses {
    /// Whether any query-bearing clause is set.
    ///
    /// Language and year range only narrow a search; on their own they never
    /// cause a request.
    pub fn has_query(&self) -> bool {
        [&self.text, &self.title, &self.author, &self.subject]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Whether no clause at all is set
    pub fn is_empty(&self) -> bool {
        *self == SearchClauses::default()
    }
}

/// Normalized parameters for one search request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestParams {
    /// 1-based page number
    pub page: u32,

    /// Records per page
    pub limit: u32,

    /// Sort mode
    pub sort: SortMode,

    /// Search clauses
    pub clauses: SearchClauses,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: SortMode::Relevance,
            clauses: SearchClauses::default(),
        }
    }
}

impl RequestParams {
    /// Parameters for the first page of the given clauses
    pub fn new(clauses: SearchClauses) -> Self {
        Self {
            clauses,
            ..Default::default()
        }
    }

    /// Set page
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set limit
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set sort mode
    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Page clamped to a valid 1-based number
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Limit with the default substituted for zero
    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.limit
        }
    }

    /// Zero-based index of the first record on the current page
    pub fn first_index(&self) -> u64 {
        u64::from(self.effective_page() - 1) * u64::from(self.effective_limit())
    }

    /// Whether any query-bearing clause is set
    pub fn has_query(&self) -> bool {
        self.clauses.has_query()
    }

    /// Merge a partial update.
    ///
    /// Unless the update names a page explicitly, the page returns to 1.
    pub fn apply(&mut self, update: ParamsUpdate) {
        if let Some(limit) = update.limit {
            self.limit = limit;
        }
        if let Some(sort) = update.sort {
            self.sort = sort;
        }
        if let Some(clauses) = update.clauses {
            self.clauses = clauses;
        }
        self.page = update.page.unwrap_or(1);
    }
}

/// A partial [`RequestParams`]; unset fields are left untouched on merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamsUpdate {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<SortMode>,
    pub clauses: Option<SearchClauses>,
}

impl ParamsUpdate {
    /// An empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Update built from a submitted filter set (clauses and sort)
    pub fn from_filters(filters: &FilterSet) -> Self {
        Self {
            clauses: Some(filters.to_clauses()),
            sort: Some(filters.sort),
            ..Default::default()
        }
    }

    /// Set page
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set limit
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set sort mode
    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set clauses
    pub fn clauses(mut self, clauses: SearchClauses) -> Self {
        self.clauses = Some(clauses);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_set_has_no_query() {
        let clauses = FilterSet::default().to_clauses();
        assert!(clauses.is_empty());
        assert!(!clauses.has_query());
    }

    #[test]
    fn test_whitespace_only_fields_are_dropped() {
        let clauses = FilterSet::new("   ").title("\t").author(" \n ").to_clauses();
        assert!(clauses.is_empty());
    }

    #[test]
    fn test_text_is_trimmed_and_collapsed() {
        let clauses = FilterSet::default().title("  the   hobbit ").to_clauses();
        assert_eq!(clauses.title.as_deref(), Some("the hobbit"));
    }

    #[test]
    fn test_language_and_years_are_not_query_bearing() {
        let clauses = FilterSet::default()
            .language("eng")
            .years("1950", "1960")
            .to_clauses();
        assert!(!clauses.is_empty());
        assert!(!clauses.has_query());
    }

    #[test]
    fn test_invalid_years_are_ignored() {
        let clauses = FilterSet::new("dune").years("nineteen", " 1990 ").to_clauses();
        assert_eq!(clauses.year_from, None);
        assert_eq!(clauses.year_to, Some(1990));
    }

    #[test]
    fn test_apply_resets_page_unless_named() {
        let mut params = RequestParams::new(FilterSet::new("dune").to_clauses()).page(5);

        params.apply(ParamsUpdate::new().sort(SortMode::New));
        assert_eq!(params.page, 1);
        assert_eq!(params.sort, SortMode::New);

        params.apply(ParamsUpdate::new().page(7));
        assert_eq!(params.page, 7);
        assert_eq!(params.sort, SortMode::New);
        assert_eq!(params.clauses.text.as_deref(), Some("dune"));
    }

    #[test]
    fn test_first_index() {
        let params = RequestParams::default().page(3).limit(24);
        assert_eq!(params.first_index(), 48);
        assert_eq!(RequestParams::default().page(0).first_index(), 0);
    }

    #[test]
    fn test_sort_mode_parsing() {
        assert_eq!("NEW".parse::<SortMode>(), Ok(SortMode::New));
        assert_eq!("".parse::<SortMode>(), Ok(SortMode::Relevance));
        assert!("sideways".parse::<SortMode>().is_err());
        assert_eq!(SortMode::Relevance.as_param(), None);
        assert_eq!(SortMode::Editions.to_string(), "editions");
    }
}
