use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::news::{Article, NewsSource, SearchRequest, TopHeadlinesRequest};
use crate::storage::traits::{ArticleStore, MemoryArticleStore, CATEGORY_TOP_HEADLINES};

/// Read side of the news data consumed by the feed controllers.
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Page of top headlines. Page 1 is written through to the store and
    /// served from it when the source fails.
    async fn get_top_headlines(&self, country: &str, page: u32, page_size: u32) -> Result<Vec<Article>>;

    /// Page of search results, straight from the source.
    async fn search_news(&self, request: &SearchRequest) -> Result<Vec<Article>>;
}

/// Counters kept by the repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub live_fetches: u64,
    pub fetch_failures: u64,
    pub fallbacks_served: u64,
    pub fallback_misses: u64,
    pub store_writes: u64,
    pub store_write_failures: u64,
}

/// Mediates between a [`NewsSource`] and an [`ArticleStore`].
///
/// Holds no feed state; clones share the same source, store and counters.
#[derive(Clone)]
pub struct Repository {
    source: Arc<dyn NewsSource>,
    store: Arc<dyn ArticleStore>,
    category_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    metrics: Arc<parking_lot::RwLock<RepositoryStats>>,
}

impl Repository {
    pub fn new(source: Arc<dyn NewsSource>, store: Arc<dyn ArticleStore>) -> Self {
        Self {
            source,
            store,
            category_locks: Arc::new(DashMap::new()),
            metrics: Arc::new(parking_lot::RwLock::new(RepositoryStats::default())),
        }
    }

    pub fn with_memory_store(source: Arc<dyn NewsSource>) -> Self {
        Self::new(source, Arc::new(MemoryArticleStore::default()))
    }

    pub fn store(&self) -> &Arc<dyn ArticleStore> {
        &self.store
    }

    pub fn stats(&self) -> RepositoryStats {
        self.metrics.read().clone()
    }

    /// Last cached page 1 of the top headlines, without touching the network.
    pub async fn cached_top_headlines(&self) -> Result<Vec<Article>> {
        self.store.read_category(CATEGORY_TOP_HEADLINES).await
    }

    fn category_lock(&self, category: &str) -> Arc<Mutex<()>> {
        self.category_locks
            .entry(category.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Write a fresh page 1 through to the store. A failed write does not
    /// invalidate the articles just fetched, so it is logged and dropped.
    async fn write_through(&self, category: &str, articles: &[Article]) {
        match self.store.replace_category(category, articles).await {
            Ok(()) => {
                self.metrics.write().store_writes += 1;
                info!("Cached {} articles under '{}'", articles.len(), category);
            }
            Err(e) => {
                self.metrics.write().store_write_failures += 1;
                warn!("Failed to cache articles under '{}': {}", category, e);
            }
        }
    }

    /// Serve the cached category in place of a failed fetch, or hand the
    /// original error back when there is nothing to serve.
    async fn fallback(&self, category: &str, error: Error) -> Result<Vec<Article>> {
        match self.store.read_category(category).await {
            Ok(cached) if !cached.is_empty() => {
                self.metrics.write().fallbacks_served += 1;
                warn!(
                    "Serving {} cached '{}' articles after fetch failure: {}",
                    cached.len(),
                    category,
                    error
                );
                Ok(cached)
            }
            Ok(_) => {
                self.metrics.write().fallback_misses += 1;
                debug!("No cached '{}' articles to fall back on", category);
                Err(error)
            }
            Err(store_error) => {
                self.metrics.write().fallback_misses += 1;
                warn!("Reading cached '{}' articles failed: {}", category, store_error);
                Err(error)
            }
        }
    }
}

#[async_trait]
impl NewsRepository for Repository {
    async fn get_top_headlines(&self, country: &str, page: u32, page_size: u32) -> Result<Vec<Article>> {
        let request = TopHeadlinesRequest {
            country: country.to_string(),
            page,
            page_size,
        };

        if page > 1 {
            return match self.source.fetch_top_headlines(&request).await {
                Ok(articles) => {
                    self.metrics.write().live_fetches += 1;
                    Ok(articles)
                }
                Err(e) => {
                    self.metrics.write().fetch_failures += 1;
                    debug!("Top headlines page {} failed: {}", page, e);
                    Err(e)
                }
            };
        }

        // Page 1 fetch and replace for one category never interleave.
        let lock = self.category_lock(CATEGORY_TOP_HEADLINES);
        let _guard = lock.lock().await;

        match self.source.fetch_top_headlines(&request).await {
            Ok(articles) => {
                self.metrics.write().live_fetches += 1;
                self.write_through(CATEGORY_TOP_HEADLINES, &articles).await;
                Ok(articles)
            }
            Err(e) => {
                self.metrics.write().fetch_failures += 1;
                self.fallback(CATEGORY_TOP_HEADLINES, e).await
            }
        }
    }

    async fn search_news(&self, request: &SearchRequest) -> Result<Vec<Article>> {
        match self.source.fetch_search(request).await {
            Ok(articles) => {
                self.metrics.write().live_fetches += 1;
                Ok(articles)
            }
            Err(e) => {
                self.metrics.write().fetch_failures += 1;
                debug!("Search '{}' page {} failed: {}", request.query, request.page, e);
                Err(e)
            }
        }
    }
}
