//! Content-selection collaborator: picks and analyzes one article from a
//! candidate list.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::feed::{truncate_body, Article};

/// Editorial analysis of one chosen article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub headline: String,
    /// Ordered phrases to emphasize within the headline.
    #[serde(default)]
    pub highlights: Vec<String>,
    pub caption: String,
    pub source_name: String,
    /// Prompt for the fallback image generator.
    pub image_prompt: String,
}

/// The analyst's verdict: an analysis paired with the chosen input article.
#[derive(Debug, Clone)]
pub struct Selection {
    pub analysis: Analysis,
    pub article: Article,
}

/// Selection/analysis seam. Returns `None` when no candidate is relevant.
#[async_trait]
pub trait ArticleAnalyst: Send + Sync {
    async fn analyze(&self, articles: &[Article]) -> Result<Option<Selection>, AnalyzeError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    articles: &'a [Article],
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    chosen_index: Option<usize>,
    #[serde(default)]
    analysis: Option<Analysis>,
}

/// HTTP adapter for the content-selection service.
pub struct AnalysisClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AnalysisClient {
    pub fn new(config: &AnalysisConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
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
impl ArticleAnalyst for AnalysisClient {
    async fn analyze(&self, articles: &[Article]) -> Result<Option<Selection>, AnalyzeError> {
        let url = format!("{}/select", self.base_url);
        let mut request = self.client.post(&url).json(&AnalyzeRequest { articles });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(AnalyzeError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzeError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: AnalyzeResponse = response.json().await.map_err(AnalyzeError::Decode)?;

        let (index, analysis) = match (parsed.chosen_index, parsed.analysis) {
            (Some(index), Some(analysis)) => (index, analysis),
            // Service signals "nothing relevant" by omitting the selection.
            _ => return Ok(None),
        };

        let article = articles
            .get(index)
            .cloned()
            .ok_or(AnalyzeError::IndexOutOfRange {
                index,
                len: articles.len(),
            })?;

        Ok(Some(Selection { analysis, article }))
    }
}
