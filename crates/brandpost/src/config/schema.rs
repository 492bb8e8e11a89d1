use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub categories: Vec<Category>,
    /// Synthetic category merging every other category's feed. Optional;
    /// when present it joins the batch ahead of the configured categories.
    #[serde(default)]
    pub aggregate: Option<Category>,
    #[serde(default = "default_gather_delay")]
    pub gather_delay_seconds: u64,
    pub feed: FeedConfig,
    pub analysis: AnalysisConfig,
    pub image_generation: ImageGenConfig,
    pub hosting: HostingConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub monitor: Option<MonitorConfig>,
    pub branding: BrandingConfig,
}

fn default_gather_delay() -> u64 {
    2
}

/// A news topic bucket. One task per category per batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    pub upload_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    pub logo_path: String,
    pub overlay_path: String,
    pub font_path: String,
    pub brand_text: String,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
}

fn default_background_color() -> String {
    "#101629".to_string()
}

fn default_highlight_color() -> String {
    "#e8b40f".to_string()
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}
