use std::sync::Arc;

use crate::config::FeedsConfig;
use crate::controller::{FeedController, FeedKind, FeedState, SearchController};
use crate::storage::NewsRepository;

/// The three feeds of the reader sharing one repository: top headlines,
/// the regional feed and ad-hoc search.
pub struct NewsSession<R: NewsRepository + ?Sized> {
    pub headlines: FeedController<R>,
    pub regional: FeedController<R>,
    pub search: SearchController<R>,
}

impl<R: NewsRepository + ?Sized> NewsSession<R> {
    pub fn new(repository: Arc<R>, settings: &FeedsConfig) -> Self {
        let headlines = FeedController::new(
            Arc::clone(&repository),
            FeedKind::headlines(settings.country.clone()),
            settings.page_size,
        )
        .with_prefetch_distance(settings.prefetch_distance);

        let regional = FeedController::new(
            Arc::clone(&repository),
            FeedKind::regional(settings.regional_query.clone()),
            settings.page_size,
        )
        .with_prefetch_distance(settings.prefetch_distance);

        let search = SearchController::new(repository, settings.page_size)
            .with_sort_by(settings.sort_by.clone())
            .with_prefetch_distance(settings.prefetch_distance);

        Self { headlines, regional, search }
    }

    /// Initial load of both standing feeds.
    pub async fn start(&self) -> (FeedState, FeedState) {
        tokio::join!(self.headlines.load(), self.regional.load())
    }
}
