pub mod feed;
pub mod search;
pub mod session;

use serde::Serialize;

use crate::news::{Article, SearchRequest};

pub use feed::FeedController;
pub use search::SearchController;
pub use session::NewsSession;

pub const DEFAULT_PREFETCH_DISTANCE: usize = 5;

/// What a feed pulls from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    /// Top headlines for a country; page 1 is cached.
    Headlines { country: String },
    /// Fixed-query search presented as a standing feed.
    Regional { query: String },
    /// Ad-hoc search; paging fields of the template are ignored.
    Search(SearchRequest),
}

impl FeedKind {
    pub fn headlines(country: impl Into<String>) -> Self {
        FeedKind::Headlines { country: country.into() }
    }

    pub fn regional(query: impl Into<String>) -> Self {
        FeedKind::Regional { query: query.into() }
    }

    pub fn search(query: impl Into<String>) -> Self {
        FeedKind::Search(SearchRequest::new(query))
    }

    pub fn label(&self) -> String {
        match self {
            FeedKind::Headlines { country } => format!("headlines:{}", country),
            FeedKind::Regional { query } => format!("regional:{}", query),
            FeedKind::Search(request) => format!("search:{}", request.query),
        }
    }
}

/// Where a feed sits in its load cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FeedPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
    LoadingMore,
}

/// Pagination state of one feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedState {
    /// Accumulated pages; may repeat articles once recycling kicks in.
    pub items: Vec<Article>,
    pub current_page: u32,
    pub has_more: bool,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub last_error: Option<String>,
    pub phase: FeedPhase,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            has_more: true,
            is_loading: false,
            is_loading_more: false,
            last_error: None,
            phase: FeedPhase::Idle,
        }
    }
}

impl FeedState {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of a load-more request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// Already loading more, or nothing loaded yet.
    Skipped,
    /// Source exhausted; the base page was appended again.
    Recycled(usize),
    /// Next page fetched and appended.
    Appended(usize),
    /// Next page failed; state left as it was.
    Failed,
}
