use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::controller::{FeedKind, FeedPhase, FeedState, LoadMoreOutcome, DEFAULT_PREFETCH_DISTANCE};
use crate::error::Result;
use crate::news::{Article, SearchRequest};
use crate::storage::NewsRepository;

/// Drives one feed: initial load, refresh and load-more with recycling.
///
/// State lives in a `watch` channel so observers can follow it; all methods
/// take `&self`, and overlapping load-more calls back off on
/// `is_loading_more`.
pub struct FeedController<R: NewsRepository + ?Sized> {
    repository: Arc<R>,
    kind: FeedKind,
    page_size: u32,
    prefetch_distance: usize,
    state: watch::Sender<FeedState>,
    base: RwLock<Vec<Article>>,
}

/// Undoes an in-flight flag if the owning future is dropped before it
/// finishes.
struct ResetOnDrop<'a> {
    state: &'a watch::Sender<FeedState>,
    reset: fn(&mut FeedState),
    armed: bool,
}

impl<'a> ResetOnDrop<'a> {
    fn new(state: &'a watch::Sender<FeedState>, reset: fn(&mut FeedState)) -> Self {
        Self { state, reset, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(self.reset);
        }
    }
}

fn reset_loading(state: &mut FeedState) {
    state.is_loading = false;
    state.phase = if state.items.is_empty() { FeedPhase::Idle } else { FeedPhase::Loaded };
}

fn reset_loading_more(state: &mut FeedState) {
    state.is_loading_more = false;
    state.phase = FeedPhase::Loaded;
}

impl<R: NewsRepository + ?Sized> FeedController<R> {
    pub fn new(repository: Arc<R>, kind: FeedKind, page_size: u32) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            repository,
            kind,
            page_size: page_size.max(1),
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            state,
            base: RwLock::new(Vec::new()),
        }
    }

    pub fn with_prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = distance;
        self
    }

    pub fn kind(&self) -> &FeedKind {
        &self.kind
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Page-1 result kept for recycling.
    pub fn base_snapshot(&self) -> Vec<Article> {
        self.base.read().clone()
    }

    async fn fetch(&self, page: u32) -> Result<Vec<Article>> {
        match &self.kind {
            FeedKind::Headlines { country } => {
                self.repository.get_top_headlines(country, page, self.page_size).await
            }
            FeedKind::Regional { query } => {
                let request = SearchRequest::new(query.clone()).with_page(page, self.page_size);
                self.repository.search_news(&request).await
            }
            FeedKind::Search(template) => {
                let request = template.clone().with_page(page, self.page_size);
                self.repository.search_news(&request).await
            }
        }
    }

    fn is_full_page(&self, articles: &[Article]) -> bool {
        articles.len() >= self.page_size as usize
    }

    /// Load page 1 from scratch. Failures are recorded in `last_error`
    /// and leave the items untouched.
    pub async fn load(&self) -> FeedState {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.last_error = None;
            s.current_page = 1;
            s.has_more = true;
            s.phase = FeedPhase::Loading;
        });
        let pending = ResetOnDrop::new(&self.state, reset_loading);

        let result = self.fetch(1).await;
        pending.disarm();

        match result {
            Ok(articles) => {
                let has_more = self.is_full_page(&articles);
                info!("Loaded {} articles for {}", articles.len(), self.kind.label());
                *self.base.write() = articles.clone();
                self.state.send_modify(|s| {
                    s.items = articles;
                    s.is_loading = false;
                    s.current_page = 1;
                    s.has_more = has_more;
                    s.phase = FeedPhase::Loaded;
                });
            }
            Err(e) => {
                debug!("Initial load of {} failed: {}", self.kind.label(), e);
                self.state.send_modify(|s| {
                    s.last_error = Some(e.to_string());
                    s.is_loading = false;
                    s.phase = FeedPhase::Failed;
                });
            }
        }

        self.state()
    }

    pub async fn refresh(&self) -> FeedState {
        self.load().await
    }

    /// Extend the feed by one page, or by the base page again once the
    /// source has run dry. Errors are swallowed.
    pub async fn load_more(&self) -> LoadMoreOutcome {
        let mut outcome = LoadMoreOutcome::Skipped;
        let mut next_page = None;

        self.state.send_if_modified(|s| {
            if s.is_loading_more || s.items.is_empty() {
                return false;
            }

            if !s.has_more {
                let base = self.base.read();
                s.items.extend(base.iter().cloned());
                outcome = LoadMoreOutcome::Recycled(base.len());
                return !base.is_empty();
            }

            s.is_loading_more = true;
            s.phase = FeedPhase::LoadingMore;
            next_page = Some(s.current_page + 1);
            true
        });

        let Some(page) = next_page else {
            if let LoadMoreOutcome::Recycled(count) = outcome {
                debug!("Recycled {} base articles into {}", count, self.kind.label());
            }
            return outcome;
        };

        let pending = ResetOnDrop::new(&self.state, reset_loading_more);
        let result = self.fetch(page).await;
        pending.disarm();

        match result {
            Ok(articles) => {
                let count = articles.len();
                let has_more = self.is_full_page(&articles);
                self.state.send_modify(|s| {
                    s.items.extend(articles);
                    s.current_page = page;
                    s.has_more = has_more;
                    s.is_loading_more = false;
                    s.phase = FeedPhase::Loaded;
                });
                debug!("Appended page {} ({} articles) to {}", page, count, self.kind.label());
                LoadMoreOutcome::Appended(count)
            }
            Err(e) => {
                debug!("Loading page {} of {} failed: {}", page, self.kind.label(), e);
                self.state.send_modify(reset_loading_more);
                LoadMoreOutcome::Failed
            }
        }
    }

    /// True when `last_visible_index` is within the prefetch distance of
    /// the end of the loaded items.
    pub fn near_end(&self, last_visible_index: usize) -> bool {
        let len = self.state.borrow().items.len();
        len > 0 && last_visible_index.saturating_add(self.prefetch_distance) >= len.saturating_sub(1)
    }

    /// Load more when the viewer has scrolled close to the end.
    pub async fn on_scrolled(&self, last_visible_index: usize) -> LoadMoreOutcome {
        if self.near_end(last_visible_index) {
            self.load_more().await
        } else {
            LoadMoreOutcome::Skipped
        }
    }
}
