//! Test harness with scripted collaborators for batch pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use image::DynamicImage;

use brandpost::analysis::{Analysis, ArticleAnalyst, Selection};
use brandpost::batch::{Collaborators, Orchestrator};
use brandpost::config::{
    AnalysisConfig, BrandingConfig, Category, Config, FeedConfig, HostingConfig, ImageGenConfig,
    WebhookConfig,
};
use brandpost::delivery::{ImageHost, WebhookPayload, WorkflowWebhook};
use brandpost::error::{AnalyzeError, DeliveryError, FeedError, ImagingError, RenderError};
use brandpost::feed::{Article, NewsFeed};
use brandpost::imaging::{ImageGenerator, ImageLoader};
use brandpost::render::PostComposer;
use brandpost::status::StatusLog;

// ── Builders ────────────────────────────────────────────────────────────────

pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap()
}

pub fn article(link: &str) -> Article {
    Article {
        title: format!("Story at {}", link),
        link: link.to_string(),
        published: Some(date(1)),
        source_id: "example-news".to_string(),
        image_url: Some(format!("{}/image.jpg", link)),
        description: Some("A test story.".to_string()),
        content: None,
    }
}

pub fn article_dated(link: &str, day: u32) -> Article {
    let mut article = article(link);
    article.published = Some(date(day));
    article
}

pub fn article_without_image(link: &str) -> Article {
    let mut article = article(link);
    article.image_url = None;
    article
}

pub fn test_config(categories: Vec<Category>, aggregate: Option<Category>) -> Config {
    Config {
        version: "1.0".to_string(),
        categories,
        aggregate,
        gather_delay_seconds: 0,
        feed: FeedConfig {
            base_url: "http://feed.invalid".to_string(),
            api_key: None,
        },
        analysis: AnalysisConfig {
            base_url: "http://analysis.invalid".to_string(),
            api_key: None,
        },
        image_generation: ImageGenConfig {
            base_url: "http://imagegen.invalid".to_string(),
            api_key: None,
        },
        hosting: HostingConfig {
            upload_url: "http://host.invalid/upload".to_string(),
            api_key: None,
        },
        webhook: WebhookConfig {
            url: "http://hooks.invalid/post".to_string(),
            auth_token: None,
        },
        monitor: None,
        branding: BrandingConfig {
            logo_path: "logo.png".to_string(),
            overlay_path: "overlay.png".to_string(),
            font_path: "brand.ttf".to_string(),
            brand_text: "Example News".to_string(),
            background_color: "#101629".to_string(),
            highlight_color: "#e8b40f".to_string(),
            text_color: "#ffffff".to_string(),
        },
    }
}

/// Small valid PNG for generator stubs.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([200, 100, 50, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

// ── Feed stubs ──────────────────────────────────────────────────────────────

/// Feed answering from a fixed per-category script. Unknown categories get an
/// empty list.
pub struct ScriptedFeed {
    responses: HashMap<String, Vec<Article>>,
    pub calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedFeed {
    pub fn new(responses: Vec<(&str, Vec<Article>)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(id, articles)| (id.to_string(), articles))
                .collect(),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Delays every fetch, to hold a batch open while a test pokes at it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl NewsFeed for ScriptedFeed {
    async fn fetch_category(&self, category: &str) -> Result<Vec<Article>, FeedError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(category.to_string());
        Ok(self.responses.get(category).cloned().unwrap_or_default())
    }
}

// ── Analyst stubs ───────────────────────────────────────────────────────────

/// Picks the first candidate and derives the analysis from it. Records the
/// candidate-list size of every call.
pub struct SelectFirstAnalyst {
    pub candidate_counts: Mutex<Vec<usize>>,
}

impl SelectFirstAnalyst {
    pub fn new() -> Self {
        Self {
            candidate_counts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ArticleAnalyst for SelectFirstAnalyst {
    async fn analyze(&self, articles: &[Article]) -> Result<Option<Selection>, AnalyzeError> {
        self.candidate_counts.lock().unwrap().push(articles.len());
        let Some(article) = articles.first().cloned() else {
            return Ok(None);
        };
        let analysis = Analysis {
            headline: article.title.clone(),
            highlights: Vec::new(),
            caption: article
                .description
                .clone()
                .unwrap_or_else(|| "No caption".to_string()),
            source_name: article.source_id.clone(),
            image_prompt: format!("photo illustrating {}", article.title),
        };
        Ok(Some(Selection { analysis, article }))
    }
}

/// Finds nothing relevant, ever.
pub struct NothingRelevantAnalyst;

#[async_trait]
impl ArticleAnalyst for NothingRelevantAnalyst {
    async fn analyze(&self, _articles: &[Article]) -> Result<Option<Selection>, AnalyzeError> {
        Ok(None)
    }
}

// ── Imaging stubs ───────────────────────────────────────────────────────────

pub struct StubLoader {
    pub fail: bool,
    pub loads: AtomicUsize,
}

impl StubLoader {
    pub fn ok() -> Self {
        Self {
            fail: false,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            loads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageLoader for StubLoader {
    async fn load(&self, _url: &str) -> Result<DynamicImage, ImagingError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ImagingError::Decode("scripted load failure".to_string()));
        }
        Ok(DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            640,
            480,
            image::Rgba([5, 5, 5, 255]),
        )))
    }
}

pub struct StubGenerator {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, ImagingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ImagingError::GenerateStatus {
                status: 500,
                body: "scripted generation failure".to_string(),
            });
        }
        Ok(png_bytes())
    }
}

// ── Composition / delivery stubs ────────────────────────────────────────────

pub struct RecordingComposer {
    pub calls: AtomicUsize,
}

impl RecordingComposer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl PostComposer for RecordingComposer {
    fn compose(
        &self,
        _source: &DynamicImage,
        _headline: &str,
        _highlights: &[String],
    ) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(png_bytes())
    }
}

pub struct StubHost {
    pub uploads: AtomicUsize,
}

impl StubHost {
    pub fn new() -> Self {
        Self {
            uploads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageHost for StubHost {
    async fn upload(&self, _image: &[u8]) -> Result<String, DeliveryError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://cdn.example.com/post-{}.png", n))
    }
}

pub struct RecordingWebhook {
    pub payloads: Mutex<Vec<WebhookPayload>>,
    pub unauthorized: bool,
}

impl RecordingWebhook {
    pub fn ok() -> Self {
        Self {
            payloads: Mutex::new(Vec::new()),
            unauthorized: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            payloads: Mutex::new(Vec::new()),
            unauthorized: true,
        }
    }
}

#[async_trait]
impl WorkflowWebhook for RecordingWebhook {
    async fn dispatch(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        if self.unauthorized {
            return Err(DeliveryError::Unauthorized { status: 401 });
        }
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

// ── Harness ─────────────────────────────────────────────────────────────────

/// Builds an orchestrator over scripted collaborators, defaulting every seam
/// to a benign stub.
pub struct HarnessBuilder {
    config: Config,
    feed: Option<Arc<dyn NewsFeed>>,
    analyst: Option<Arc<dyn ArticleAnalyst>>,
    loader: Option<Arc<dyn ImageLoader>>,
    generator: Option<Arc<dyn ImageGenerator>>,
    composer: Option<Arc<dyn PostComposer>>,
    host: Option<Arc<dyn ImageHost>>,
    webhook: Option<Arc<dyn WorkflowWebhook>>,
}

impl HarnessBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            feed: None,
            analyst: None,
            loader: None,
            generator: None,
            composer: None,
            host: None,
            webhook: None,
        }
    }

    pub fn feed(mut self, feed: Arc<dyn NewsFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn analyst(mut self, analyst: Arc<dyn ArticleAnalyst>) -> Self {
        self.analyst = Some(analyst);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn composer(mut self, composer: Arc<dyn PostComposer>) -> Self {
        self.composer = Some(composer);
        self
    }

    pub fn host(mut self, host: Arc<dyn ImageHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn webhook(mut self, webhook: Arc<dyn WorkflowWebhook>) -> Self {
        self.webhook = Some(webhook);
        self
    }

    pub fn build(self) -> (Arc<Orchestrator>, Arc<StatusLog>) {
        let log = Arc::new(StatusLog::new(256));
        let collaborators = Collaborators {
            feed: self
                .feed
                .unwrap_or_else(|| Arc::new(ScriptedFeed::new(vec![]))),
            analyst: self
                .analyst
                .unwrap_or_else(|| Arc::new(SelectFirstAnalyst::new())),
            loader: self.loader.unwrap_or_else(|| Arc::new(StubLoader::ok())),
            generator: self
                .generator
                .unwrap_or_else(|| Arc::new(StubGenerator::ok())),
            composer: self
                .composer
                .unwrap_or_else(|| Arc::new(RecordingComposer::new())),
            host: self.host.unwrap_or_else(|| Arc::new(StubHost::new())),
            webhook: self
                .webhook
                .unwrap_or_else(|| Arc::new(RecordingWebhook::ok())),
        };
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(self.config),
            collaborators,
            Arc::clone(&log),
        ));
        (orchestrator, log)
    }
}
