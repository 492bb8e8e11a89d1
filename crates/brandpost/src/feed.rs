//! News feed collaborator: article records and the fetch adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::FeedConfig;
use crate::error::FeedError;

/// Maximum length for error bodies quoted in feed errors.
const MAX_ERROR_BODY_LENGTH: usize = 200;

pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// A raw article record as returned by the news aggregation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    pub source_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Article-list retrieval seam. The aggregate category calls this once per
/// other configured category, concurrently.
#[async_trait]
pub trait NewsFeed: Send + Sync {
    async fn fetch_category(&self, category: &str) -> Result<Vec<Article>, FeedError>;
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

/// HTTP adapter for the news aggregation service.
pub struct FeedClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FeedClient {
    pub fn new(config: &FeedConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl NewsFeed for FeedClient {
    async fn fetch_category(&self, category: &str) -> Result<Vec<Article>, FeedError> {
        let url = format!("{}/articles", self.base_url);
        let mut request = self.client.get(&url).query(&[("category", category)]);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| FeedError::Request {
            category: category.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                category: category.to_string(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: FeedResponse = response.json().await.map_err(|e| FeedError::Decode {
            category: category.to_string(),
            source: e,
        })?;

        tracing::debug!(
            category,
            count = parsed.articles.len(),
            "Fetched feed articles"
        );

        Ok(parsed.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_deserializes_with_optional_fields_absent() {
        let json = r#"{
            "title": "Quake hits coastal region",
            "link": "https://news.example.com/quake",
            "source_id": "example-news"
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.title, "Quake hits coastal region");
        assert!(article.published.is_none());
        assert!(article.image_url.is_none());
        assert!(article.description.is_none());
        assert!(article.content.is_none());
    }

    #[test]
    fn test_article_parses_publish_date() {
        let json = r#"{
            "title": "Markets rally",
            "link": "https://news.example.com/markets",
            "published": "2026-08-01T09:30:00Z",
            "source_id": "example-news"
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        let published = article.published.unwrap();
        assert_eq!(published.to_rfc3339(), "2026-08-01T09:30:00+00:00");
    }

    #[test]
    fn test_truncate_body_short_passthrough() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn test_truncate_body_long() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert!(truncated.len() < 500);
        assert!(truncated.ends_with("(truncated)"));
    }

    #[test]
    fn test_feed_response_tolerates_missing_articles() {
        let parsed: FeedResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.articles.is_empty());
    }
}
