//! Image hosting collaborator: uploads a composed image, returns its public
//! URL.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::HostingConfig;
use crate::error::DeliveryError;
use crate::feed::truncate_body;

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &[u8]) -> Result<String, DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: Option<String>,
}

pub struct HostingClient {
    client: Client,
    upload_url: String,
    api_key: Option<String>,
}

impl HostingClient {
    pub fn new(config: &HostingConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            client,
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ImageHost for HostingClient {
    async fn upload(&self, image: &[u8]) -> Result<String, DeliveryError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);

        let mut form = vec![("image", encoded)];
        if let Some(ref key) = self.api_key {
            form.push(("key", key.clone()));
        }

        let response = self
            .client
            .post(&self.upload_url)
            .form(&form)
            .send()
            .await
            .map_err(DeliveryError::UploadRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::UploadStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(DeliveryError::UploadRequest)?;

        parsed.url.ok_or(DeliveryError::UploadMissingUrl)
    }
}
