pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, parse_hex_color};
pub use schema::{
    AnalysisConfig, BrandingConfig, Category, Config, FeedConfig, HostingConfig, ImageGenConfig,
    MonitorConfig, WebhookConfig,
};
