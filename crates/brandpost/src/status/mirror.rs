//! Best-effort mirror of status log entries to an external monitoring
//! endpoint.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::error::MirrorError;
use crate::status::log::LogEntry;

#[async_trait]
pub trait StatusMirror: Send + Sync {
    async fn send(&self, entry: &LogEntry) -> Result<(), MirrorError>;
}

pub struct MonitorClient {
    client: Client,
    url: String,
}

impl MonitorClient {
    pub fn new(config: &MonitorConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: config.url.clone(),
        }
    }
}

#[async_trait]
impl StatusMirror for MonitorClient {
    async fn send(&self, entry: &LogEntry) -> Result<(), MirrorError> {
        let response = self
            .client
            .post(&self.url)
            .json(entry)
            .send()
            .await
            .map_err(MirrorError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
