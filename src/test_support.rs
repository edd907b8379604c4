//! Scripted collaborators shared by the unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::news::{Article, NewsSource, SearchRequest, TopHeadlinesRequest};
use crate::storage::{ArticleStore, StoreStats};

pub fn articles_named(prefix: &str, count: usize) -> Vec<Article> {
    (0..count)
        .map(|i| Article {
            source_id: "test".to_string(),
            source_name: "Test Source".to_string(),
            title: format!("{} {}", prefix, i),
            url: format!("https://example.com/{}/{}", prefix, i),
            published_at: format!("2024-03-16T{:02}:00:00Z", 23 - (i % 24)),
            ..Default::default()
        })
        .collect()
}

/// News source answering from queued results and recording every request.
/// An empty queue answers with a network error.
#[derive(Default)]
pub struct ScriptedSource {
    headlines: Mutex<VecDeque<Result<Vec<Article>>>>,
    search: Mutex<VecDeque<Result<Vec<Article>>>>,
    headline_requests: Mutex<Vec<TopHeadlinesRequest>>,
    search_requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_headlines(&self, result: Result<Vec<Article>>) {
        self.headlines.lock().push_back(result);
    }

    pub fn push_search(&self, result: Result<Vec<Article>>) {
        self.search.lock().push_back(result);
    }

    pub fn headline_requests(&self) -> Vec<TopHeadlinesRequest> {
        self.headline_requests.lock().clone()
    }

    pub fn search_requests(&self) -> Vec<SearchRequest> {
        self.search_requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.headline_requests.lock().len() + self.search_requests.lock().len()
    }
}

#[async_trait]
impl NewsSource for ScriptedSource {
    async fn fetch_top_headlines(&self, request: &TopHeadlinesRequest) -> Result<Vec<Article>> {
        self.headline_requests.lock().push(request.clone());
        let next = self.headlines.lock().pop_front();
        next.unwrap_or_else(|| Err(Error::Network("no scripted response".to_string())))
    }

    async fn fetch_search(&self, request: &SearchRequest) -> Result<Vec<Article>> {
        self.search_requests.lock().push(request.clone());
        let next = self.search.lock().pop_front();
        next.unwrap_or_else(|| Err(Error::Network("no scripted response".to_string())))
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl ArticleStore for FailingStore {
    async fn replace_category(&self, _category: &str, _articles: &[Article]) -> Result<()> {
        Err(Error::Storage("disk unavailable".to_string()))
    }

    async fn read_category(&self, _category: &str) -> Result<Vec<Article>> {
        Err(Error::Storage("disk unavailable".to_string()))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        Err(Error::Storage("disk unavailable".to_string()))
    }

    async fn clear(&self) -> Result<()> {
        Err(Error::Storage("disk unavailable".to_string()))
    }

    async fn stats(&self) -> Result<StoreStats> {
        Err(Error::Storage("disk unavailable".to_string()))
    }
}
