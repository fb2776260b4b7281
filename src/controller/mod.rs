//! Search controller: request parameters, debounced fetching and the status
//! state machine.
//!
//! The controller owns the current [`RequestParams`] and a single
//! "current operation" slot. Every parameter change recomputes the request
//! URL; a changed URL with at least one query-bearing clause cancels the
//! operation in the slot and schedules a new one, which waits out the
//! debounce window before fetching. Results are applied only if their
//! operation still occupies the slot, so a stale response can never replace
//! a fresher one.
//!
//! State is published through a [`tokio::sync::watch`] channel; the
//! presentation layer either polls [`SearchController::state`] or follows
//! [`SearchController::subscribe`].
//!
//! All methods that change parameters spawn onto the current Tokio runtime
//! and must be called from within one.

mod state;

pub use state::{last_page, page_in_range, SearchState, SearchStatus};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::SearchConfig;
use crate::models::{FilterSet, ParamsUpdate, RequestParams, ResultPage, SearchClauses};
use crate::sources::{Source, SourceError};
use crate::utils::build_search_url;

/// Errors returned by controller operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// The requested page cannot be reached
    #[error("Page {page} is out of range (last reachable page is {last_page})")]
    PageOutOfRange { page: u32, last_page: u32 },

    /// Already on the first page
    #[error("Already on the first page")]
    NoPreviousPage,
}

/// The operation occupying the current-request slot
#[derive(Debug)]
struct Operation {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug)]
struct Lifecycle {
    params: RequestParams,
    generation: u64,
    current: Option<Operation>,
}

impl Lifecycle {
    /// Vacate the slot, signalling cancellation to its occupant
    fn cancel_current(&mut self) {
        if let Some(op) = self.current.take() {
            trace!(generation = op.generation, "cancelling superseded request");
            op.token.cancel();
        }
        self.generation += 1;
    }
}

#[derive(Debug)]
struct Inner {
    source: Arc<dyn Source>,
    config: SearchConfig,
    lifecycle: Mutex<Lifecycle>,
    state: watch::Sender<SearchState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: SearchState) {
        debug!(status = %state.status, url = %state.url, "search state changed");
        self.state.send_replace(state);
    }

    /// Apply a finished fetch if its operation still holds the slot
    fn complete(
        &self,
        generation: u64,
        params: RequestParams,
        url: String,
        result: Result<ResultPage, SourceError>,
    ) {
        let mut lifecycle = self.lock();
        let is_current = lifecycle
            .current
            .as_ref()
            .is_some_and(|op| op.generation == generation && !op.token.is_cancelled());
        if !is_current {
            trace!(generation, "dropping result of superseded request");
            return;
        }
        lifecycle.current = None;

        let state = match result {
            Ok(page) => SearchState::loaded(params, url, page),
            Err(err) => {
                warn!(error = %err, url = %url, "search request failed");
                SearchState::failed(params, url, err.to_string())
            }
        };
        self.publish(state);
    }

    async fn run(
        self: Arc<Self>,
        generation: u64,
        token: CancellationToken,
        params: RequestParams,
        url: String,
    ) {
        tokio::select! {
            _ = token.cancelled() => {
                trace!(generation, "request superseded during debounce");
                return;
            }
            _ = tokio::time::sleep(self.config.debounce()) => {}
        }

        debug!(generation, url = %url, "issuing search request");
        let result = tokio::select! {
            _ = token.cancelled() => {
                trace!(generation, "request superseded in flight");
                return;
            }
            result = self.source.fetch(&url) => result,
        };

        self.complete(generation, params, url, result);
    }
}

/// Owns the search request lifecycle
#[derive(Debug, Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

impl SearchController {
    /// Create an idle controller fetching through `source`
    pub fn new(source: Arc<dyn Source>, config: SearchConfig) -> Self {
        let params = RequestParams::default().limit(config.page_size);
        let url = build_search_url(&config.endpoint, &params);
        let (state, _) = watch::channel(SearchState::idle(params.clone(), url));

        Self {
            inner: Arc::new(Inner {
                source,
                config,
                lifecycle: Mutex::new(Lifecycle {
                    params,
                    generation: 0,
                    current: None,
                }),
                state,
            }),
        }
    }

    /// The configuration this controller was built with
    pub fn config(&self) -> &SearchConfig {
        &self.inner.config
    }

    /// Current request parameters
    pub fn params(&self) -> RequestParams {
        self.inner.lock().params.clone()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    /// Current status
    pub fn status(&self) -> SearchStatus {
        self.inner.state.borrow().status
    }

    /// Follow state changes
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    /// Wait until no request is pending and return the resulting state
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| s.status.is_settled()).await;
        match settled {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Merge a partial parameter update and refresh.
    ///
    /// The page returns to 1 unless `update` names one. A named page past
    /// the reachable result window is refused and nothing changes.
    pub fn update(&self, update: ParamsUpdate) -> Result<(), ControllerError> {
        let mut lifecycle = self.inner.lock();
        if let Some(page) = update.page {
            let mut next = lifecycle.params.clone();
            next.apply(update.clone());
            self.check_page(&next, page)?;
        }
        lifecycle.params.apply(update);
        self.refresh(&mut lifecycle);
        Ok(())
    }

    /// Submit a filter set: replaces clauses and sort, back to page 1
    pub fn search(&self, filters: &FilterSet) {
        self.apply(ParamsUpdate::from_filters(filters));
    }

    /// Clear every clause, returning to idle
    pub fn clear(&self) {
        self.apply(ParamsUpdate::new().clauses(SearchClauses::default()));
    }

    /// Highest page that may currently be requested
    pub fn last_page(&self) -> u32 {
        let params = self.params();
        last_page(
            self.known_num_found(&params),
            params.effective_limit(),
            self.inner.config.max_result_index,
        )
    }

    /// Whether forward pagination is enabled
    pub fn has_next_page(&self) -> bool {
        let params = self.params();
        self.status() == SearchStatus::Success
            && page_in_range(
                params.effective_page() + 1,
                params.effective_limit(),
                self.known_num_found(&params),
                self.inner.config.max_result_index,
            )
    }

    /// Whether backward pagination is enabled
    pub fn has_prev_page(&self) -> bool {
        self.params().effective_page() > 1
    }

    /// Jump to `page`, refusing pages past the reachable result window
    pub fn set_page(&self, page: u32) -> Result<(), ControllerError> {
        self.update(ParamsUpdate::new().page(page))
    }

    /// Advance one page
    pub fn next_page(&self) -> Result<(), ControllerError> {
        let page = self.params().effective_page();
        self.set_page(page.saturating_add(1))
    }

    /// Go back one page
    pub fn prev_page(&self) -> Result<(), ControllerError> {
        let page = self.params().effective_page();
        if page <= 1 {
            return Err(ControllerError::NoPreviousPage);
        }
        self.set_page(page - 1)
    }

    /// Merge an update that names no page, which can never be refused
    fn apply(&self, update: ParamsUpdate) {
        let mut lifecycle = self.inner.lock();
        lifecycle.params.apply(update);
        self.refresh(&mut lifecycle);
    }

    /// Match count that bounds pages for `params`.
    ///
    /// Only a settled result for the same clauses counts; while a new query
    /// is loading the published data still belongs to the previous one.
    fn known_num_found(&self, params: &RequestParams) -> Option<u64> {
        let state = self.inner.state.borrow();
        let settled = matches!(state.status, SearchStatus::Success | SearchStatus::Empty);
        if settled && state.params.clauses == params.clauses {
            state.num_found()
        } else {
            None
        }
    }

    fn check_page(&self, params: &RequestParams, page: u32) -> Result<(), ControllerError> {
        let limit = params.effective_limit();
        let num_found = self.known_num_found(params);
        let max_index = self.inner.config.max_result_index;

        if page_in_range(page, limit, num_found, max_index) {
            Ok(())
        } else {
            Err(ControllerError::PageOutOfRange {
                page,
                last_page: last_page(num_found, limit, max_index),
            })
        }
    }

    /// Recompute the URL and drive the state machine from the new parameters
    fn refresh(&self, lifecycle: &mut Lifecycle) {
        let params = lifecycle.params.clone();
        let url = build_search_url(&self.inner.config.endpoint, &params);

        if !params.has_query() {
            lifecycle.cancel_current();
            self.inner.publish(SearchState::idle(params, url));
            return;
        }

        let (unchanged, previous) = {
            let current = self.inner.state.borrow();
            let unchanged = current.url == url
                && matches!(
                    current.status,
                    SearchStatus::Loading | SearchStatus::Success | SearchStatus::Empty
                );
            (unchanged, current.data.clone())
        };
        if unchanged {
            trace!(url = %url, "query unchanged, keeping current request");
            return;
        }

        lifecycle.cancel_current();
        let generation = lifecycle.generation;
        let token = CancellationToken::new();
        lifecycle.current = Some(Operation {
            generation,
            token: token.clone(),
        });

        debug!(generation, url = %url, "search scheduled");
        self.inner
            .publish(SearchState::loading(params.clone(), url.clone(), previous));

        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.run(generation, token, params, url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Book, BookBuilder, SortMode};
    use crate::sources::mock::{make_book, make_page};
    use crate::sources::MockSource;
    use std::time::Duration;

    fn controller(mock: &Arc<MockSource>) -> SearchController {
        let source: Arc<dyn Source> = mock.clone();
        SearchController::new(source, SearchConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle() {
        let mock = Arc::new(MockSource::new());
        let ctrl = controller(&mock);

        let state = ctrl.state();
        assert_eq!(state.status, SearchStatus::Idle);
        assert!(state.data.is_none());
        assert_eq!(ctrl.params().page, 1);
        assert_eq!(ctrl.params().limit, 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_filters_stay_idle() {
        let mock = Arc::new(MockSource::new());
        let ctrl = controller(&mock);

        ctrl.search(&FilterSet::default().language("eng").years("1900", ""));
        assert_eq!(ctrl.status(), SearchStatus::Idle);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(ctrl.status(), SearchStatus::Idle);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_title_search_succeeds() {
        let mock = Arc::new(MockSource::new());
        let hobbit = BookBuilder::new("/works/OL27448W", "The Hobbit")
            .author("J.R.R. Tolkien")
            .first_publish_year(1937)
            .cover_id(6979861)
            .build();
        mock.respond("title:\"the hobbit\"", Ok(make_page(1, vec![hobbit.clone()])));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::default().title("the hobbit"));
        assert_eq!(ctrl.status(), SearchStatus::Loading);

        let state = ctrl.settled().await;
        assert_eq!(state.status, SearchStatus::Success);
        assert_eq!(state.books(), &[hobbit][..]);
        assert!(state.error.is_none());

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("?q=title:\"the hobbit\"&page=1&limit=24&fields="));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_rapid_updates() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=dun", Ok(make_page(1, vec![make_book("/works/OL1W", "Dune")])));

        let ctrl = controller(&mock);
        for text in ["d", "du", "dun"] {
            ctrl.search(&FilterSet::new(text));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let state = ctrl.settled().await;
        assert_eq!(state.status, SearchStatus::Success);
        assert_eq!(mock.request_count(), 1);
        assert!(mock.requests()[0].contains("q=dun&"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_never_overwrites_fresh_one() {
        let mock = Arc::new(MockSource::new());
        mock.respond_after(
            "q=alpha",
            Duration::from_millis(800),
            Ok(make_page(1, vec![make_book("/works/A", "Alpha")])),
        );
        mock.respond_after(
            "q=beta",
            Duration::from_millis(50),
            Ok(make_page(1, vec![make_book("/works/B", "Beta")])),
        );

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("alpha"));
        // past the debounce window, so the slow request is in flight
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(mock.request_count(), 1);

        ctrl.search(&FilterSet::new("beta"));
        let state = ctrl.settled().await;
        assert_eq!(state.books()[0].title, "Beta");

        tokio::time::sleep(Duration::from_secs(3)).await;
        let state = ctrl.state();
        assert_eq!(state.status, SearchStatus::Success);
        assert_eq!(state.books().len(), 1);
        assert_eq!(state.books()[0].title, "Beta");
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_results_is_empty_not_error() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=zzzz", Ok(make_page(0, Vec::new())));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("zzzz"));

        let state = ctrl.settled().await;
        assert_eq!(state.status, SearchStatus::Empty);
        assert_eq!(state.data, Some(ResultPage::empty(0)));
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_becomes_error_state() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=broken", Err(SourceError::Status(503)));
        mock.respond("q=offline", Err(SourceError::Network("unreachable".into())));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("broken"));
        let state = ctrl.settled().await;
        assert_eq!(state.status, SearchStatus::Error);
        assert!(state.error.as_deref().unwrap().contains("503"));
        assert!(state.data.is_none());

        ctrl.search(&FilterSet::new("offline"));
        let state = ctrl.settled().await;
        assert_eq!(state.status, SearchStatus::Error);
        assert!(!state.error.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmitting_after_error_retries() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=flaky", Err(SourceError::Status(500)));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("flaky"));
        assert_eq!(ctrl.settled().await.status, SearchStatus::Error);

        mock.clear_responses();
        mock.respond("q=flaky", Ok(make_page(1, vec![make_book("/works/F", "Flaky")])));
        ctrl.search(&FilterSet::new("flaky"));

        assert_eq!(ctrl.settled().await.status, SearchStatus::Success);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_query_is_not_refetched() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=same", Ok(make_page(1, vec![make_book("/works/S", "Same")])));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("same"));
        ctrl.settled().await;
        ctrl.search(&FilterSet::new("  same "));
        assert_eq!(ctrl.status(), SearchStatus::Success);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_query_cancels_and_returns_to_idle() {
        let mock = Arc::new(MockSource::new());
        mock.respond_after(
            "q=slow",
            Duration::from_millis(500),
            Ok(make_page(1, vec![make_book("/works/S", "Slow")])),
        );
        mock.respond("q=fast", Ok(make_page(1, vec![make_book("/works/F", "Fast")])));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("fast"));
        assert_eq!(ctrl.settled().await.status, SearchStatus::Success);

        ctrl.search(&FilterSet::new("slow"));
        tokio::time::sleep(Duration::from_millis(350)).await;
        ctrl.clear();

        let state = ctrl.state();
        assert_eq!(state.status, SearchStatus::Idle);
        assert!(state.data.is_none());
        assert!(state.error.is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(ctrl.status(), SearchStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_resets_page_unless_explicit() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=tolkien", Ok(make_page(500, vec![make_book("/works/T", "T")])));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("tolkien"));
        ctrl.settled().await;

        ctrl.update(ParamsUpdate::new().page(3)).unwrap();
        assert_eq!(ctrl.params().page, 3);
        ctrl.settled().await;
        assert!(mock.requests().last().unwrap().contains("&page=3&"));

        ctrl.update(ParamsUpdate::new().sort(SortMode::New)).unwrap();
        assert_eq!(ctrl.params().page, 1);
        assert_eq!(ctrl.params().sort, SortMode::New);
        ctrl.settled().await;
        assert!(mock.requests().last().unwrap().contains("&page=1&limit=24&sort=new&"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_is_capped() {
        let mock = Arc::new(MockSource::new());
        let books: Vec<Book> = (0..24)
            .map(|i| make_book(&format!("/works/OL{}W", i), "Many"))
            .collect();
        mock.respond("q=popular", Ok(make_page(1000, books)));

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("popular"));
        ctrl.settled().await;

        assert_eq!(ctrl.last_page(), 42);
        assert!(ctrl.has_next_page());
        assert!(!ctrl.has_prev_page());

        assert!(ctrl.set_page(42).is_ok());
        ctrl.settled().await;
        assert!(!ctrl.has_next_page());
        assert!(ctrl.has_prev_page());
        assert_eq!(
            ctrl.next_page(),
            Err(ControllerError::PageOutOfRange {
                page: 43,
                last_page: 42
            })
        );
        assert_eq!(ctrl.params().page, 42);

        assert!(ctrl.set_page(0).is_err());
        assert!(ctrl.prev_page().is_ok());
        assert_eq!(ctrl.params().page, 41);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_page_update_respects_cap() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=popular", Ok(make_page(1000, vec![make_book("/works/P", "Popular")])));

        let ctrl = controller(&mock);
        let first = ctrl.update(ParamsUpdate::from_filters(&FilterSet::new("popular")).page(100));
        assert_eq!(
            first,
            Err(ControllerError::PageOutOfRange {
                page: 100,
                last_page: 42
            })
        );
        assert_eq!(ctrl.status(), SearchStatus::Idle);
        assert!(!ctrl.params().has_query());

        let unseen = ctrl.update(ParamsUpdate::from_filters(&FilterSet::new("popular")).page(43));
        assert!(unseen.is_err());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.request_count(), 0);

        ctrl.search(&FilterSet::new("popular"));
        ctrl.settled().await;
        assert_eq!(mock.request_count(), 1);

        assert!(ctrl.update(ParamsUpdate::new().page(60)).is_err());
        assert!(ctrl.update(ParamsUpdate::new().page(43)).is_err());
        assert_eq!(ctrl.params().page, 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.request_count(), 1);
        assert!(mock.requests().iter().all(|url| url.contains("&page=1&")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_bounds_ignore_previous_query_while_loading() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=rare", Ok(make_page(48, vec![make_book("/works/R", "Rare")])));
        mock.respond_after(
            "q=common",
            Duration::from_millis(200),
            Ok(make_page(500, vec![make_book("/works/C", "Common")])),
        );

        let ctrl = controller(&mock);
        ctrl.search(&FilterSet::new("rare"));
        ctrl.settled().await;
        assert_eq!(ctrl.last_page(), 2);
        assert!(ctrl.set_page(5).is_err());

        ctrl.search(&FilterSet::new("common"));
        assert_eq!(ctrl.status(), SearchStatus::Loading);
        assert_eq!(ctrl.last_page(), 42);
        assert!(ctrl.set_page(5).is_ok());

        let state = ctrl.settled().await;
        assert_eq!(state.status, SearchStatus::Success);
        assert_eq!(state.params.page, 5);
        assert_eq!(ctrl.last_page(), 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_observe_transitions() {
        let mock = Arc::new(MockSource::new());
        mock.respond("q=watch", Ok(make_page(1, vec![make_book("/works/W", "Watch")])));

        let ctrl = controller(&mock);
        let mut rx = ctrl.subscribe();

        ctrl.search(&FilterSet::new("watch"));
        assert_eq!(rx.borrow_and_update().status, SearchStatus::Loading);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().status, SearchStatus::Success);
    }
}
