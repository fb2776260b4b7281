//! Controller status, snapshots and pagination arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Book, RequestParams, ResultPage};

/// Lifecycle status of the current search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    /// No query-bearing field is set; nothing requested
    #[default]
    Idle,
    /// A request is debouncing or in flight
    Loading,
    /// The last request returned at least one record
    Success,
    /// The last request failed
    Error,
    /// The last request returned no records
    Empty,
}

impl SearchStatus {
    /// Whether no request is pending
    pub fn is_settled(&self) -> bool {
        *self != SearchStatus::Loading
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchStatus::Idle => "idle",
            SearchStatus::Loading => "loading",
            SearchStatus::Success => "success",
            SearchStatus::Error => "error",
            SearchStatus::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// Read-only snapshot of the controller, published on every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    /// Parameters the snapshot was derived from
    pub params: RequestParams,

    /// Request URL derived from `params`
    pub url: String,

    pub status: SearchStatus,

    /// Results of the last completed request
    pub data: Option<ResultPage>,

    /// Human-readable failure message when `status` is `Error`
    pub error: Option<String>,
}

impl SearchState {
    pub(crate) fn idle(params: RequestParams, url: String) -> Self {
        Self {
            params,
            url,
            status: SearchStatus::Idle,
            data: None,
            error: None,
        }
    }

    pub(crate) fn loading(params: RequestParams, url: String, data: Option<ResultPage>) -> Self {
        Self {
            params,
            url,
            status: SearchStatus::Loading,
            data,
            error: None,
        }
    }

    pub(crate) fn loaded(params: RequestParams, url: String, page: ResultPage) -> Self {
        let status = if page.is_empty() {
            SearchStatus::Empty
        } else {
            SearchStatus::Success
        };
        Self {
            params,
            url,
            status,
            data: Some(page),
            error: None,
        }
    }

    pub(crate) fn failed(params: RequestParams, url: String, message: String) -> Self {
        Self {
            params,
            url,
            status: SearchStatus::Error,
            data: None,
            error: Some(message),
        }
    }

    /// Records of the last completed request (empty when none)
    pub fn books(&self) -> &[Book] {
        self.data.as_ref().map(|p| p.books.as_slice()).unwrap_or(&[])
    }

    /// Total match count of the last completed request
    pub fn num_found(&self) -> Option<u64> {
        self.data.as_ref().map(|p| p.num_found)
    }
}

/// Highest page that may be requested.
///
/// Bounded both by the match count (when known) and by the endpoint's
/// maximum reachable result index. Always at least 1.
pub fn last_page(num_found: Option<u64>, limit: u32, max_result_index: u64) -> u32 {
    let limit = u64::from(limit.max(1));
    let reachable = num_found.map_or(max_result_index, |n| n.min(max_result_index));
    let pages = reachable.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Whether `page` may be requested.
///
/// A page is refused when it is zero, when its first record index reaches
/// the reachable-index cap, or when it lies past the last page of results.
pub fn page_in_range(page: u32, limit: u32, num_found: Option<u64>, max_result_index: u64) -> bool {
    if page == 0 {
        return false;
    }
    let first_index = u64::from(page - 1) * u64::from(limit.max(1));
    if page > 1 && first_index >= max_result_index {
        return false;
    }
    page <= last_page(num_found, limit, max_result_index)
}
