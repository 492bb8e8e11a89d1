pub mod analysis;
pub mod batch;
pub mod config;
pub mod delivery;
pub mod error;
pub mod feed;
pub mod imaging;
pub mod render;
pub mod status;

pub use analysis::{Analysis, AnalysisClient, ArticleAnalyst, Selection};
pub use batch::{Bundle, CategoryTask, Collaborators, Orchestrator, PostResult, TaskStatus, TaskStore};
pub use config::{load_config, Category, Config};
pub use delivery::{HostingClient, ImageHost, WebhookClient, WebhookPayload, WorkflowWebhook};
pub use error::{
    AnalyzeError, BrandpostError, ConfigError, DeliveryError, FeedError, ImagingError,
    MirrorError, RenderError, Result,
};
pub use feed::{Article, FeedClient, NewsFeed};
pub use imaging::{HttpImageLoader, ImageGenClient, ImageGenerator, ImageLoader};
pub use render::{BrandKit, Compositor, PostComposer};
pub use status::{LogEntry, MonitorClient, Severity, StatusLog, StatusMirror};
