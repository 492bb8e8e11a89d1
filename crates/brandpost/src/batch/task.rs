//! Per-category task records and their state machine.

use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::config::Category;
use crate::feed::Article;

/// Status of a category task. The success path is a total order; `Error` is
/// reachable from every non-terminal state. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Gathering,
    Gathered,
    Processing,
    GeneratingImage,
    Composing,
    Uploading,
    SendingWebhook,
    Done,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Gathering => write!(f, "Gathering"),
            TaskStatus::Gathered => write!(f, "Gathered"),
            TaskStatus::Processing => write!(f, "Processing"),
            TaskStatus::GeneratingImage => write!(f, "Generating image"),
            TaskStatus::Composing => write!(f, "Composing"),
            TaskStatus::Uploading => write!(f, "Uploading"),
            TaskStatus::SendingWebhook => write!(f, "Sending webhook"),
            TaskStatus::Done => write!(f, "Done"),
            TaskStatus::Error => write!(f, "Error"),
        }
    }
}

/// Final artifact of a successful task.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostResult {
    pub headline: String,
    pub image_url: String,
    pub caption: String,
    pub source_link: String,
    pub source_name: String,
}

/// One category's task within the current batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTask {
    pub id: String,
    pub category_name: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PostResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoryTask {
    pub fn new(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            category_name: category.name.clone(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Phase-1 output carried into Phase 2: the analysis paired with the chosen
/// article, owned by one task.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub task_id: String,
    pub analysis: Analysis,
    pub article: Article,
}
