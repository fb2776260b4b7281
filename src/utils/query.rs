//! Search URL construction.
//!
//! Turns [`RequestParams`] into the query string understood by the catalog
//! search endpoint. Output is fully deterministic: the clause order is fixed
//! (title, author, subject, language, year range, free text) and is followed
//! by `page`, `limit`, `sort` and `fields`.

use crate::models::{normalize_text, RequestParams, SearchClauses};

/// Default catalog search endpoint
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://openlibrary.org/search.json";

/// Attributes always requested from the endpoint
pub const SEARCH_FIELDS: &[&str] = &[
    "key",
    "title",
    "author_name",
    "first_publish_year",
    "subject",
    "cover_i",
    "ia",
    "edition_count",
];

/// Field used for the publication year range clause
const YEAR_FIELD: &str = "first_publish_year";

/// Escape one clause value.
///
/// Values containing whitespace become a quoted phrase with inner quotes and
/// backslashes backslash-escaped; only the query-string delimiters are
/// percent-encoded inside the quotes. Values without whitespace are
/// percent-encoded whole.
pub fn escape_value(value: &str) -> String {
    if !value.chars().any(char::is_whitespace) {
        return urlencoding::encode(value).into_owned();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            '+' => out.push_str("%2B"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn field_clause(field: &str, value: Option<&str>) -> Option<String> {
    let value = normalize_text(value?)?;
    Some(format!("{}:{}", field, escape_value(&value)))
}

fn year_clause(from: Option<i32>, to: Option<i32>) -> Option<String> {
    if from.is_none() && to.is_none() {
        return None;
    }
    let bound = |b: Option<i32>| b.map_or_else(|| "*".to_string(), |y| y.to_string());
    Some(format!("{}:[{} TO {}]", YEAR_FIELD, bound(from), bound(to)))
}

/// Build the individual clauses in their fixed order
pub fn build_clauses(clauses: &SearchClauses) -> Vec<String> {
    let text = clauses
        .text
        .as_deref()
        .and_then(normalize_text)
        .map(|t| escape_value(&t));

    [
        field_clause("title", clauses.title.as_deref()),
        field_clause("author", clauses.author.as_deref()),
        field_clause("subject", clauses.subject.as_deref()),
        field_clause("language", clauses.language.as_deref()),
        year_clause(clauses.year_from, clauses.year_to),
        text,
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// The combined `q` value (clauses joined by a single space)
pub fn build_q(clauses: &SearchClauses) -> String {
    build_clauses(clauses).join(" ")
}

/// The full query string, without the leading `?`
pub fn build_query_string(params: &RequestParams) -> String {
    let mut query = format!(
        "q={}&page={}&limit={}",
        build_q(&params.clauses),
        params.effective_page(),
        params.effective_limit()
    );

    if let Some(sort) = params.sort.as_param() {
        query.push_str("&sort=");
        query.push_str(sort);
    }

    query.push_str("&fields=");
    query.push_str(&SEARCH_FIELDS.join(","));
    query
}

/// The complete request URL against `endpoint`
pub fn build_search_url(endpoint: &str, params: &RequestParams) -> String {
    format!("{}?{}", endpoint, build_query_string(params))
}
