use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::controller::{FeedController, FeedKind, FeedState, DEFAULT_PREFETCH_DISTANCE};
use crate::news::{SearchRequest, DEFAULT_SORT_BY};
use crate::storage::NewsRepository;

/// Ad-hoc search mode, independent of the standing feeds.
///
/// Each search gets a fresh [`FeedController`]; clearing drops it and
/// leaves everything else alone.
pub struct SearchController<R: NewsRepository + ?Sized> {
    repository: Arc<R>,
    page_size: u32,
    prefetch_distance: usize,
    sort_by: String,
    query_text: RwLock<String>,
    last_request: RwLock<Option<SearchRequest>>,
    active: RwLock<Option<Arc<FeedController<R>>>>,
}

impl<R: NewsRepository + ?Sized> SearchController<R> {
    pub fn new(repository: Arc<R>, page_size: u32) -> Self {
        Self {
            repository,
            page_size,
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            sort_by: DEFAULT_SORT_BY.to_string(),
            query_text: RwLock::new(String::new()),
            last_request: RwLock::new(None),
            active: RwLock::new(None),
        }
    }

    pub fn with_sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = sort_by.into();
        self
    }

    pub fn with_prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = distance;
        self
    }

    /// Record what the user is typing without searching.
    pub fn set_query(&self, text: impl Into<String>) {
        *self.query_text.write() = text.into();
    }

    pub fn query(&self) -> String {
        self.query_text.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.read().is_some()
    }

    /// Controller of the current search, if one is active.
    pub fn results(&self) -> Option<Arc<FeedController<R>>> {
        self.active.read().clone()
    }

    pub fn state(&self) -> Option<FeedState> {
        self.active.read().as_ref().map(|feed| feed.state())
    }

    /// Search for `query`. A blank query leaves search mode instead.
    pub async fn search(&self, query: &str) -> Option<FeedState> {
        if query.trim().is_empty() {
            self.clear();
            return None;
        }

        let mut request = SearchRequest::new(query);
        request.sort_by = self.sort_by.clone();
        Some(self.search_with(request).await)
    }

    /// Search with explicit date bounds and ordering.
    pub async fn search_with(&self, request: SearchRequest) -> FeedState {
        debug!("Searching for '{}'", request.query);
        *self.query_text.write() = request.query.clone();
        *self.last_request.write() = Some(request.clone());

        let feed = Arc::new(
            FeedController::new(
                Arc::clone(&self.repository),
                FeedKind::Search(request),
                self.page_size,
            )
            .with_prefetch_distance(self.prefetch_distance),
        );
        *self.active.write() = Some(Arc::clone(&feed));

        feed.load().await
    }

    /// Run the last search again.
    pub async fn retry(&self) -> Option<FeedState> {
        let request = self.last_request.read().clone()?;
        Some(self.search_with(request).await)
    }

    /// Leave search mode, dropping results, error and query.
    pub fn clear(&self) {
        self.query_text.write().clear();
        *self.last_request.write() = None;
        *self.active.write() = None;
    }
}
