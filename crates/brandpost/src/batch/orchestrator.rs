//! Batch orchestrator: drives every category task through the two-phase
//! gather/process pipeline.
//!
//! One logical thread of control owns all task mutation. Phase 1 walks the
//! categories sequentially (only the aggregate category fans out sub-fetches
//! concurrently, joined before merging); Phase 2 walks the gathered bundles
//! sequentially. A failure is always task-scoped: the failing category or
//! bundle is parked in `Error` and the batch moves on.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future;
use image::DynamicImage;
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::{ArticleAnalyst, Selection};
use crate::batch::store::TaskStore;
use crate::batch::task::{Bundle, PostResult, TaskStatus};
use crate::config::{Category, Config};
use crate::delivery::{ImageHost, WebhookPayload, WorkflowWebhook};
use crate::error::{AnalyzeError, DeliveryError, FeedError, ImagingError, RenderError};
use crate::feed::{Article, NewsFeed};
use crate::imaging::{ImageGenerator, ImageLoader};
use crate::render::PostComposer;
use crate::status::{DetailValue, StatusLog};

/// The aggregate category keeps this many of the most recent merged articles.
const AGGREGATE_TAKE: usize = 10;

#[derive(Debug, Error)]
enum GatherError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error("No merged articles available for the aggregate category")]
    EmptyAggregate,

    #[error("No new articles available for this category")]
    NoEligibleArticles,

    #[error("Analysis found no relevant article among {0} candidates")]
    NoRelevantArticle(usize),
}

#[derive(Debug, Error)]
enum ProcessError {
    // The generated fallback failing is worse than the article image
    // failing: at that point the task has nothing left to draw.
    #[error("critical: fallback image unusable: {0}")]
    FallbackImage(#[source] ImagingError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// External collaborators injected into the orchestrator.
pub struct Collaborators {
    pub feed: Arc<dyn NewsFeed>,
    pub analyst: Arc<dyn ArticleAnalyst>,
    pub loader: Arc<dyn ImageLoader>,
    pub generator: Arc<dyn ImageGenerator>,
    pub composer: Arc<dyn PostComposer>,
    pub host: Arc<dyn ImageHost>,
    pub webhook: Arc<dyn WorkflowWebhook>,
}

pub struct Orchestrator {
    config: Arc<Config>,
    feed: Arc<dyn NewsFeed>,
    analyst: Arc<dyn ArticleAnalyst>,
    loader: Arc<dyn ImageLoader>,
    generator: Arc<dyn ImageGenerator>,
    composer: Arc<dyn PostComposer>,
    host: Arc<dyn ImageHost>,
    webhook: Arc<dyn WorkflowWebhook>,
    tasks: Arc<TaskStore>,
    log: Arc<StatusLog>,
    running: AtomicBool,
    completed: AtomicUsize,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, collaborators: Collaborators, log: Arc<StatusLog>) -> Self {
        Self {
            config,
            feed: collaborators.feed,
            analyst: collaborators.analyst,
            loader: collaborators.loader,
            generator: collaborators.generator,
            composer: collaborators.composer,
            host: collaborators.host,
            webhook: collaborators.webhook,
            tasks: Arc::new(TaskStore::default()),
            log,
            running: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn tasks(&self) -> Arc<TaskStore> {
        Arc::clone(&self.tasks)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Tasks that reached `Done` in the current or most recent batch.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// The batch's category list: the synthetic aggregate (when configured)
    /// runs first, then the configured categories in order.
    fn batch_categories(&self) -> Vec<Category> {
        let mut categories = Vec::with_capacity(self.config.categories.len() + 1);
        if let Some(ref aggregate) = self.config.aggregate {
            categories.push(aggregate.clone());
        }
        categories.extend(self.config.categories.iter().cloned());
        categories
    }

    /// Runs one full batch. A start request while a batch is in flight is
    /// ignored.
    pub async fn run_batch(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            self.log
                .info(None, "Batch already running; start request ignored");
            return;
        }

        let batch_id = Uuid::new_v4().to_string();
        let categories = self.batch_categories();
        self.completed.store(0, Ordering::SeqCst);
        self.tasks.reset(&categories);

        let mut detail = HashMap::new();
        detail.insert("batchId".to_string(), DetailValue::from(batch_id.as_str()));
        detail.insert(
            "categories".to_string(),
            DetailValue::from(categories.len()),
        );
        self.log
            .info_with_detail(None, "Batch started", detail);
        tracing::info!(%batch_id, categories = categories.len(), "Batch started");

        let bundles = self.gather_phase(&categories).await;
        self.log.info(
            None,
            &format!(
                "Gather phase complete: {} of {} categories ready",
                bundles.len(),
                categories.len()
            ),
        );

        self.process_phase(&bundles).await;

        let (done, failed, _) = self.tasks.counts();
        let mut detail = HashMap::new();
        detail.insert("done".to_string(), DetailValue::from(done));
        detail.insert("failed".to_string(), DetailValue::from(failed));
        self.log.info_with_detail(None, "Batch finished", detail);
        tracing::info!(%batch_id, done, failed, "Batch finished");

        self.running.store(false, Ordering::SeqCst);
    }

    async fn gather_phase(&self, categories: &[Category]) -> Vec<Bundle> {
        let mut used_links: HashSet<String> = HashSet::new();
        let mut bundles = Vec::new();
        let delay = Duration::from_secs(self.config.gather_delay_seconds);

        for (index, category) in categories.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            self.tasks.set_status(&category.id, TaskStatus::Gathering);
            self.log
                .info(Some(&category.id), "Gathering candidate articles");

            match self.gather_category(category, &used_links).await {
                Ok(selection) => {
                    used_links.insert(selection.article.link.clone());
                    self.tasks.set_status(&category.id, TaskStatus::Gathered);
                    self.log.success(
                        Some(&category.id),
                        &format!(
                            "Selected '{}' from {}",
                            selection.analysis.headline, selection.analysis.source_name
                        ),
                    );
                    bundles.push(Bundle {
                        task_id: category.id.clone(),
                        analysis: selection.analysis,
                        article: selection.article,
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    self.tasks.fail(&category.id, &message);
                    self.log.error(Some(&category.id), &message);
                }
            }
        }

        bundles
    }

    async fn gather_category(
        &self,
        category: &Category,
        used_links: &HashSet<String>,
    ) -> Result<Selection, GatherError> {
        let is_aggregate = self
            .config
            .aggregate
            .as_ref()
            .is_some_and(|aggregate| aggregate.id == category.id);

        let articles = if is_aggregate {
            self.fetch_aggregate(&category.id).await?
        } else {
            self.feed.fetch_category(&category.id).await?
        };

        let eligible: Vec<Article> = articles
            .into_iter()
            .filter(|article| !used_links.contains(&article.link))
            .collect();
        if eligible.is_empty() {
            return Err(GatherError::NoEligibleArticles);
        }

        match self.analyst.analyze(&eligible).await? {
            Some(selection) => Ok(selection),
            None => Err(GatherError::NoRelevantArticle(eligible.len())),
        }
    }

    /// Fetches every other configured category concurrently, joins all
    /// sub-fetches, merges by link and keeps the most recent articles.
    async fn fetch_aggregate(&self, aggregate_id: &str) -> Result<Vec<Article>, GatherError> {
        let fetches = self.config.categories.iter().map(|category| {
            let feed = Arc::clone(&self.feed);
            let id = category.id.clone();
            async move {
                let result = feed.fetch_category(&id).await;
                (id, result)
            }
        });

        let mut merged = Vec::new();
        for (id, result) in future::join_all(fetches).await {
            match result {
                Ok(articles) => merged.extend(articles),
                Err(e) => {
                    self.log.error(
                        Some(aggregate_id),
                        &format!("Sub-fetch for '{}' failed: {}", id, e),
                    );
                }
            }
        }

        if merged.is_empty() {
            return Err(GatherError::EmptyAggregate);
        }

        Ok(rank_recent(dedupe_by_link(merged), AGGREGATE_TAKE))
    }

    async fn process_phase(&self, bundles: &[Bundle]) {
        for bundle in bundles {
            match self.process_bundle(bundle).await {
                Ok(result) => {
                    let url = result.image_url.clone();
                    self.tasks.complete(&bundle.task_id, result);
                    self.completed.fetch_add(1, Ordering::SeqCst);
                    self.log
                        .success(Some(&bundle.task_id), &format!("Post published: {}", url));
                }
                Err(e) => {
                    let message = e.to_string();
                    self.tasks.fail(&bundle.task_id, &message);
                    self.log.error(Some(&bundle.task_id), &message);
                }
            }
        }
    }

    async fn process_bundle(&self, bundle: &Bundle) -> Result<PostResult, ProcessError> {
        let task_id = &bundle.task_id;
        self.tasks.set_status(task_id, TaskStatus::Processing);
        self.log.info(
            Some(task_id),
            &format!("Processing '{}'", bundle.analysis.headline),
        );

        let source = match self.load_article_image(&bundle.article).await {
            Ok(image) => image,
            Err(e) => {
                self.tasks.set_status(task_id, TaskStatus::GeneratingImage);
                self.log.info(
                    Some(task_id),
                    &format!("Article image unusable ({}); generating a replacement", e),
                );
                self.generate_fallback_image(&bundle.analysis.image_prompt)
                    .await?
            }
        };

        self.tasks.set_status(task_id, TaskStatus::Composing);
        self.log.info(Some(task_id), "Composing post image");
        let encoded = self.composer.compose(
            &source,
            &bundle.analysis.headline,
            &bundle.analysis.highlights,
        )?;

        self.tasks.set_status(task_id, TaskStatus::Uploading);
        self.log.info(Some(task_id), "Uploading composed image");
        let image_url = self.host.upload(&encoded).await?;

        self.tasks.set_status(task_id, TaskStatus::SendingWebhook);
        self.log.info(Some(task_id), "Dispatching workflow webhook");
        let payload = WebhookPayload::new(&bundle.analysis, &bundle.article, &image_url);
        self.webhook.dispatch(&payload).await?;

        Ok(PostResult {
            headline: bundle.analysis.headline.clone(),
            image_url,
            caption: bundle.analysis.caption.clone(),
            source_link: bundle.article.link.clone(),
            source_name: bundle.analysis.source_name.clone(),
        })
    }

    async fn load_article_image(&self, article: &Article) -> Result<DynamicImage, ImagingError> {
        let url = article
            .image_url
            .as_deref()
            .ok_or(ImagingError::NoImageUrl)?;
        self.loader.load(url).await
    }

    async fn generate_fallback_image(&self, prompt: &str) -> Result<DynamicImage, ProcessError> {
        let bytes = self
            .generator
            .generate(prompt)
            .await
            .map_err(ProcessError::FallbackImage)?;
        image::load_from_memory(&bytes)
            .map_err(|e| ProcessError::FallbackImage(ImagingError::Decode(e.to_string())))
    }
}

/// De-duplicates by link: the last-seen article wins the slot, the slot keeps
/// its first-seen position.
fn dedupe_by_link(articles: Vec<Article>) -> Vec<Article> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<Article> = Vec::with_capacity(articles.len());
    for article in articles {
        match positions.get(&article.link) {
            Some(&position) => deduped[position] = article,
            None => {
                positions.insert(article.link.clone(), deduped.len());
                deduped.push(article);
            }
        }
    }
    deduped
}

/// Stable sort by publish date descending; undated entries compare equal to
/// each other, keep their relative order and rank after dated ones. Keeps at
/// most `take` articles.
fn rank_recent(mut articles: Vec<Article>, take: usize) -> Vec<Article> {
    use std::cmp::Ordering;
    articles.sort_by(|a, b| match (&a.published, &b.published) {
        (Some(a_date), Some(b_date)) => b_date.cmp(a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    articles.truncate(take);
    articles
}
