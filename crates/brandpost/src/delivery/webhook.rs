//! Workflow webhook collaborator: hands the finished post to the downstream
//! automation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::analysis::Analysis;
use crate::config::WebhookConfig;
use crate::error::DeliveryError;
use crate::feed::{truncate_body, Article};

/// Fixed status literal expected by the downstream workflow.
pub const STATUS_READY: &str = "ready";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookPayload {
    pub headline: String,
    pub image_url: String,
    pub caption: String,
    pub source_link: String,
    pub status: String,
}

impl WebhookPayload {
    pub fn new(analysis: &Analysis, article: &Article, image_url: &str) -> Self {
        Self {
            headline: analysis.headline.clone(),
            image_url: image_url.to_string(),
            caption: analysis.caption.clone(),
            source_link: article.link.clone(),
            status: STATUS_READY.to_string(),
        }
    }
}

#[async_trait]
pub trait WorkflowWebhook: Send + Sync {
    async fn dispatch(&self, payload: &WebhookPayload) -> Result<(), DeliveryError>;
}

pub struct WebhookClient {
    client: Client,
    url: String,
    auth_token: Option<String>,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: config.url.clone(),
            auth_token: config.auth_token.clone(),
        }
    }
}

#[async_trait]
impl WorkflowWebhook for WebhookClient {
    async fn dispatch(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(DeliveryError::WebhookRequest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // An authorization rejection gets its own error so operators can tell
        // a revoked token apart from a broken receiver.
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(DeliveryError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body: truncate_body(&body),
        })
    }
}
