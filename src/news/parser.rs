use crate::error::{Error, Result};
use crate::news::{Article, NewsResponse};

pub struct ResponseParser;

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_response(&self, body: &[u8]) -> Result<NewsResponse> {
        let response: NewsResponse = serde_json::from_slice(body)
            .map_err(|e| Error::Parse(format!("Failed to parse news response: {}", e)))?;

        if response.status.as_deref() == Some("error") {
            return Err(Error::Api {
                code: response.code.unwrap_or_else(|| "unknown".to_string()),
                message: response.message.unwrap_or_else(|| "No message provided".to_string()),
            });
        }

        Ok(response)
    }

    pub fn parse_articles(&self, body: &[u8]) -> Result<Vec<Article>> {
        Ok(self.parse_response(body)?.into_articles())
    }

    /// Pull the upstream `message` out of an error body, if there is one.
    pub fn error_message(&self, body: &[u8]) -> Option<String> {
        serde_json::from_slice::<NewsResponse>(body)
            .ok()
            .and_then(|r| r.message)
    }

    pub fn validate_base_url(&self, url: &str) -> Result<()> {
        let parsed_url = url::Url::parse(url)
            .map_err(|e| Error::InvalidUrl(format!("Invalid URL: {}", e)))?;

        match parsed_url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::InvalidUrl(format!("Unsupported scheme: {}", scheme))),
        }
    }
}
