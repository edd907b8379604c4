use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};
use crate::news::parser::ResponseParser;
use crate::news::{Article, NewsSource, SearchRequest, TopHeadlinesRequest};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// HTTP client for a NewsAPI-compatible service.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_duration: Duration,
    user_agent: String,
}

impl NewsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        ResponseParser::new().validate_base_url(&base_url)?;

        // No client-level timeout: `timeout_duration` bounds each whole exchange.
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            timeout_duration: Duration::from_secs(30),
            user_agent: format!("news-reader/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_articles(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Vec<Article>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Requesting {} with {} query parameters", url, query.len());

        let (status, body) = timeout(self.timeout_duration, self.download(&url, query))
            .await
            .map_err(|_| Error::Timeout(format!("Request to {} timed out", url)))??;

        let parser = ResponseParser::new();

        if !status.is_success() {
            let detail = parser
                .error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(Error::Network(format!(
                "HTTP {} for {}: {}",
                status.as_u16(),
                url,
                detail
            )));
        }

        debug!("Downloaded {} bytes from {}", body.len(), url);

        parser.parse_articles(&body)
    }

    /// Send the request and read the full body.
    async fn download(&self, url: &str, query: &[(&str, String)]) -> Result<(StatusCode, Vec<u8>)> {
        let response = self.send(url, query).await?;
        let status = response.status();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        Ok((status, body.to_vec()))
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        if let Some(api_key) = &self.api_key {
            request = request.header("X-Api-Key", api_key);
        }

        request
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {}", e)))
    }
}

#[async_trait]
impl NewsSource for NewsClient {
    async fn fetch_top_headlines(&self, request: &TopHeadlinesRequest) -> Result<Vec<Article>> {
        let query = vec![
            ("country", request.country.clone()),
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];
        self.get_articles("top-headlines", &query).await
    }

    async fn fetch_search(&self, request: &SearchRequest) -> Result<Vec<Article>> {
        let mut query = vec![("q", request.query.clone())];
        if let Some(from) = &request.from {
            query.push(("from", from.clone()));
        }
        if let Some(to) = &request.to {
            query.push(("to", to.clone()));
        }
        query.push(("sortBy", request.sort_by.clone()));
        query.push(("page", request.page.to_string()));
        query.push(("pageSize", request.page_size.to_string()));

        self.get_articles("everything", &query).await
    }
}
