use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrandpostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    #[error("Imaging error: {0}")]
    Imaging(#[from] ImagingError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid category '{id}': {reason}")]
    InvalidCategory { id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed request for category '{category}' failed: {source}")]
    Request {
        category: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Feed returned status {status} for category '{category}': {body}")]
    Status {
        category: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode feed response for category '{category}': {source}")]
    Decode {
        category: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Analysis request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Analysis service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode analysis response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Analysis referenced article index {index} outside the candidate list ({len} articles)")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Failed to fetch image from '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Image fetch from '{url}' returned status {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Image generation request failed: {0}")]
    GenerateRequest(#[source] reqwest::Error),

    #[error("Image generation returned status {status}: {body}")]
    GenerateStatus { status: u16, body: String },

    #[error("Failed to decode generated image payload: {0}")]
    GenerateDecode(String),

    #[error("Article has no image URL")]
    NoImageUrl,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read brand asset '{path}': {source}")]
    ReadAsset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode brand asset '{path}': {reason}")]
    DecodeAsset { path: PathBuf, reason: String },

    #[error("Failed to load font '{path}': {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("Failed to encode composed image: {0}")]
    Encode(String),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Upload request failed: {0}")]
    UploadRequest(#[source] reqwest::Error),

    #[error("Upload returned status {status}: {body}")]
    UploadStatus { status: u16, body: String },

    #[error("Upload response contained no image URL")]
    UploadMissingUrl,

    #[error("Webhook request failed: {0}")]
    WebhookRequest(#[source] reqwest::Error),

    #[error("Webhook rejected the dispatch as unauthorized (status {status})")]
    Unauthorized { status: u16 },

    #[error("Webhook returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Status mirror request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Status mirror returned status {status}")]
    Status { status: u16 },
}

pub type Result<T> = std::result::Result<T, BrandpostError>;
