pub mod client;
pub mod parser;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_SORT_BY: &str = "publishedAt";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A news article as the rest of the crate sees it. Every field is a plain
/// string; values missing upstream are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub source_id: String,
    pub source_name: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub published_at: String,
    pub content: String,
}

/// Source block of an upstream article.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDto {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Article as delivered by the news API; any field may be missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub source: Option<SourceDto>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

/// Envelope shared by the `top-headlines` and `everything` endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub status: Option<String>,
    pub total_results: Option<u64>,
    pub articles: Option<Vec<ArticleDto>>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ArticleDto {
    pub fn into_article(self) -> Article {
        let (source_id, source_name) = match self.source {
            Some(source) => (source.id.unwrap_or_default(), source.name.unwrap_or_default()),
            None => (String::new(), String::new()),
        };

        Article {
            source_id,
            source_name,
            author: self.author.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            image_url: self.url_to_image.unwrap_or_default(),
            published_at: self.published_at.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
        }
    }
}

impl NewsResponse {
    pub fn into_articles(self) -> Vec<Article> {
        self.articles
            .unwrap_or_default()
            .into_iter()
            .map(ArticleDto::into_article)
            .collect()
    }
}

impl Article {
    /// Single-line summary: `[source] title (published)`.
    pub fn headline(&self) -> String {
        let source = if self.source_name.is_empty() { "unknown" } else { &self.source_name };
        if self.published_at.is_empty() {
            format!("[{}] {}", source, self.title)
        } else {
            format!("[{}] {} ({})", source, self.title, self.published_at)
        }
    }
}

/// Parameters for a paged top-headlines request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopHeadlinesRequest {
    pub country: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for TopHeadlinesRequest {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parameters for a paged search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort_by: String,
    pub page: u32,
    pub page_size: u32,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            from: None,
            to: None,
            sort_by: DEFAULT_SORT_BY.to_string(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

/// Remote source of articles. Implementations surface transport failures
/// as network errors and malformed payloads as parse errors.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_top_headlines(&self, request: &TopHeadlinesRequest) -> Result<Vec<Article>>;

    async fn fetch_search(&self, request: &SearchRequest) -> Result<Vec<Article>>;
}
