use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::news::Article;
use crate::storage::traits::{
    ordered_articles, stats_for, tag_articles, ArticleStore, CachedArticle, StoreStats,
};

pub const STORE_VERSION: u32 = 1;
pub const STORE_FILE_NAME: &str = "articles.json";

/// On-disk layout of the article store
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    saved_at: DateTime<Utc>,
    categories: HashMap<String, Vec<CachedArticle>>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            saved_at: Utc::now(),
            categories: HashMap::new(),
        }
    }
}

/// Article store persisted as a single JSON document.
///
/// Every write produces a complete new document in a temporary file that is
/// then renamed over the old one, so the file on disk always holds either the
/// previous or the next state. The in-memory snapshot is swapped only after
/// the rename succeeded, which keeps readers and disk in agreement.
pub struct FileArticleStore {
    path: PathBuf,
    snapshot: Arc<RwLock<StoreFile>>,
    write_lock: Arc<Mutex<()>>,
}

impl FileArticleStore {
    /// Open (or create) the store inside `cache_dir`.
    pub fn open<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        if !cache_dir.exists() {
            fs::create_dir_all(cache_dir).map_err(|e| {
                Error::Storage(format!(
                    "Failed to create cache directory '{}': {}",
                    cache_dir.display(),
                    e
                ))
            })?;
        }

        let path = cache_dir.join(STORE_FILE_NAME);
        let snapshot = Self::load(&path)?;

        let total: usize = snapshot.categories.values().map(Vec::len).sum();
        tracing::debug!("Opened article store {} with {} records", path.display(), total);

        Ok(Self {
            path,
            snapshot: Arc::new(RwLock::new(snapshot)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<StoreFile> {
        if !path.exists() {
            tracing::debug!("Store file does not exist yet: {}", path.display());
            return Ok(StoreFile::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Storage(format!("Failed to read store file '{}': {}", path.display(), e))
        })?;

        let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
            Error::Storage(format!("Corrupt store file '{}': {}", path.display(), e))
        })?;

        if file.version != STORE_VERSION {
            return Err(Error::Storage(format!(
                "Unsupported store version {} in '{}' (expected {})",
                file.version,
                path.display(),
                STORE_VERSION
            )));
        }

        Ok(file)
    }

    fn write_atomically(path: &Path, file: &StoreFile) -> Result<()> {
        let json_content = serde_json::to_string_pretty(file)?;

        let temp_file = path.with_extension("tmp");
        fs::write(&temp_file, json_content).map_err(|e| {
            Error::Storage(format!("Failed to write store to '{}': {}", temp_file.display(), e))
        })?;

        fs::rename(&temp_file, path).map_err(|e| {
            Error::Storage(format!(
                "Failed to rename store file '{}' to '{}': {}",
                temp_file.display(),
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Apply `change` to a copy of the snapshot, persist it, then publish it.
    ///
    /// Runs on the blocking pool and owns the write lock for its whole
    /// duration, so a caller dropping the returned future can neither
    /// interleave two writes nor leave disk and memory out of step.
    async fn commit<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreFile) + Send + 'static,
    {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let snapshot = Arc::clone(&self.snapshot);
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let mut next = snapshot.read().clone();
            change(&mut next);
            next.saved_at = Utc::now();

            Self::write_atomically(&path, &next)?;
            *snapshot.write() = next;
            Ok(())
        })
        .await
        .map_err(|e| Error::Storage(format!("Store write task failed: {}", e)))?
    }
}

#[async_trait]
impl ArticleStore for FileArticleStore {
    async fn replace_category(&self, category: &str, articles: &[Article]) -> Result<()> {
        let category = category.to_string();
        let tagged = tag_articles(&category, articles);
        let count = tagged.len();

        self.commit(move |file| {
            if tagged.is_empty() {
                file.categories.remove(&category);
            } else {
                file.categories.insert(category, tagged);
            }
        })
        .await?;

        tracing::debug!("Persisted {} records to {}", count, self.path.display());
        Ok(())
    }

    async fn read_category(&self, category: &str) -> Result<Vec<Article>> {
        let snapshot = self.snapshot.read();
        Ok(snapshot
            .categories
            .get(category)
            .map(|r| ordered_articles(r))
            .unwrap_or_default())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let snapshot = self.snapshot.read();
        let mut categories: Vec<String> = snapshot
            .categories
            .iter()
            .filter(|(_, r)| !r.is_empty())
            .map(|(category, _)| category.clone())
            .collect();
        categories.sort();
        Ok(categories)
    }

    async fn clear(&self) -> Result<()> {
        self.commit(|file| file.categories.clear()).await?;
        tracing::info!("Cleared article store {}", self.path.display());
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let size = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        let snapshot = self.snapshot.read();
        let last_write = if self.path.exists() { Some(snapshot.saved_at) } else { None };
        Ok(stats_for(&snapshot.categories, last_write, size))
    }
}
