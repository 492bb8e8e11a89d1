//! Image acquisition: loading article images over HTTP and the generated
//! fallback. The compositor never performs I/O; everything it draws comes
//! through here already decoded.

use async_trait::async_trait;
use base64::Engine;
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ImageGenConfig;
use crate::error::ImagingError;
use crate::feed::truncate_body;

/// Fetch-and-decode seam for article images.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<DynamicImage, ImagingError>;
}

/// Text-to-image seam, used only when the article's own image is unusable.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImagingError>;
}

/// HTTP image loader.
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<DynamicImage, ImagingError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| ImagingError::Fetch {
                    url: url.to_string(),
                    source: e,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImagingError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ImagingError::Fetch {
            url: url.to_string(),
            source: e,
        })?;

        image::load_from_memory(&bytes).map_err(|e| ImagingError::Decode(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    image_b64: String,
}

/// HTTP adapter for the generative image service.
pub struct ImageGenClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ImageGenClient {
    pub fn new(config: &ImageGenConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
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
impl ImageGenerator for ImageGenClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImagingError> {
        let url = format!("{}/generate", self.base_url);
        let mut request = self.client.post(&url).json(&GenerateRequest { prompt });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(ImagingError::GenerateRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImagingError::GenerateStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ImagingError::GenerateDecode(e.to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(parsed.image_b64.as_bytes())
            .map_err(|e| ImagingError::GenerateDecode(e.to_string()))
    }
}
