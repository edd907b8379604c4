use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::news::Article;

/// Category under which page 1 of the top headlines is cached.
pub const CATEGORY_TOP_HEADLINES: &str = "top_headlines";

/// Category-partitioned article cache.
///
/// For any category the records held are exactly the last set passed to
/// [`ArticleStore::replace_category`]; readers never observe a category
/// half-way through a replace.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Drop every record of `category` and insert `articles` in one step.
    async fn replace_category(&self, category: &str, articles: &[Article]) -> Result<()>;

    /// Records of `category`, newest `published_at` first. Empty when the
    /// category has never been written.
    async fn read_category(&self, category: &str) -> Result<Vec<Article>>;

    /// Categories that currently hold at least one record.
    async fn categories(&self) -> Result<Vec<String>>;

    /// Remove every record of every category.
    async fn clear(&self) -> Result<()>;

    async fn stats(&self) -> Result<StoreStats>;
}

/// An article tagged with the category it was cached under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedArticle {
    pub category: String,
    pub article: Article,
    pub cached_at: DateTime<Utc>,
}

impl CachedArticle {
    pub fn new(category: &str, article: Article) -> Self {
        Self {
            category: category.to_string(),
            article,
            cached_at: Utc::now(),
        }
    }
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_records: usize,
    pub records_by_category: HashMap<String, usize>,
    pub last_write: Option<DateTime<Utc>>,
    pub storage_size_bytes: u64,
}

/// Sort newest first by `published_at`. Timestamps are ISO-8601 strings, so
/// lexical order is chronological; the sort is stable for equal values.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

pub(crate) fn ordered_articles(records: &[CachedArticle]) -> Vec<Article> {
    let mut articles: Vec<Article> = records.iter().map(|r| r.article.clone()).collect();
    sort_newest_first(&mut articles);
    articles
}

pub(crate) fn tag_articles(category: &str, articles: &[Article]) -> Vec<CachedArticle> {
    articles
        .iter()
        .cloned()
        .map(|article| CachedArticle::new(category, article))
        .collect()
}

pub(crate) fn stats_for(
    records: &HashMap<String, Vec<CachedArticle>>,
    last_write: Option<DateTime<Utc>>,
    storage_size_bytes: u64,
) -> StoreStats {
    let records_by_category: HashMap<String, usize> = records
        .iter()
        .filter(|(_, r)| !r.is_empty())
        .map(|(category, r)| (category.clone(), r.len()))
        .collect();

    StoreStats {
        total_records: records_by_category.values().sum(),
        records_by_category,
        last_write,
        storage_size_bytes,
    }
}

/// Memory-only store, used in tests and when persistence is disabled
pub struct MemoryArticleStore {
    records: Arc<RwLock<HashMap<String, Vec<CachedArticle>>>>,
    last_write: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            last_write: Arc::new(RwLock::new(None)),
        }
    }

    pub fn records_count(&self) -> usize {
        self.records.read().values().map(Vec::len).sum()
    }

    /// Raw records of a category in insertion order.
    pub fn records(&self, category: &str) -> Vec<CachedArticle> {
        self.records.read().get(category).cloned().unwrap_or_default()
    }
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn replace_category(&self, category: &str, articles: &[Article]) -> Result<()> {
        let tagged = tag_articles(category, articles);

        // Delete and insert under the same write guard.
        let mut records = self.records.write();
        records.insert(category.to_string(), tagged);
        *self.last_write.write() = Some(Utc::now());

        Ok(())
    }

    async fn read_category(&self, category: &str) -> Result<Vec<Article>> {
        let records = self.records.read();
        Ok(records
            .get(category)
            .map(|r| ordered_articles(r))
            .unwrap_or_default())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let records = self.records.read();
        let mut categories: Vec<String> = records
            .iter()
            .filter(|(_, r)| !r.is_empty())
            .map(|(category, _)| category.clone())
            .collect();
        categories.sort();
        Ok(categories)
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().clear();
        *self.last_write.write() = Some(Utc::now());
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let records = self.records.read();
        // Rough estimate of memory usage
        let size = records.values().map(Vec::len).sum::<usize>() * 2048;
        Ok(stats_for(&records, *self.last_write.read(), size as u64))
    }
}
