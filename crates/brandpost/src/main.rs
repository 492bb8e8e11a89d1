use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use brandpost::batch::{Collaborators, Orchestrator};
use brandpost::config::load_config;
use brandpost::delivery::{HostingClient, WebhookClient};
use brandpost::feed::FeedClient;
use brandpost::imaging::{HttpImageLoader, ImageGenClient};
use brandpost::render::{BrandKit, Compositor};
use brandpost::status::{MonitorClient, StatusLog, StatusMirror};
use brandpost::AnalysisClient;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    // Route `log` facade records from dependencies through tracing.
    let _ = tracing_log::LogTracer::init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());

    info!("Starting brandpost v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&config_path) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load config from '{}': {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };

    let kit = match BrandKit::load(&config.branding) {
        Ok(kit) => kit,
        Err(e) => {
            error!("Failed to load brand assets: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let log = Arc::new(match config.monitor {
        Some(ref monitor) => StatusLog::with_mirror(
            256,
            Arc::new(MonitorClient::new(monitor)) as Arc<dyn StatusMirror>,
        ),
        None => StatusLog::new(256),
    });

    let collaborators = Collaborators {
        feed: Arc::new(FeedClient::new(&config.feed)),
        analyst: Arc::new(AnalysisClient::new(&config.analysis)),
        loader: Arc::new(HttpImageLoader::new()),
        generator: Arc::new(ImageGenClient::new(&config.image_generation)),
        composer: Arc::new(Compositor::new(kit)),
        host: Arc::new(HostingClient::new(&config.hosting)),
        webhook: Arc::new(WebhookClient::new(&config.webhook)),
    };

    let orchestrator = Orchestrator::new(Arc::clone(&config), collaborators, Arc::clone(&log));
    orchestrator.run_batch().await;

    for task in orchestrator.tasks().snapshot() {
        match task.error {
            Some(ref message) => info!("{}: {} ({})", task.category_name, task.status, message),
            None => info!("{}: {}", task.category_name, task.status),
        }
    }

    if orchestrator.completed() == 0 {
        error!("No category produced a post");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
