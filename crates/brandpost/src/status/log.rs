//! Append-only batch status log with broadcast fan-out and a best-effort
//! mirror to an external monitoring endpoint.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::status::mirror::StatusMirror;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Error,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Success => write!(f, "SUCCESS"),
        }
    }
}

/// Detail payloads allow a narrow set of value kinds rather than arbitrary
/// JSON.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DetailValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Map(HashMap<String, DetailValue>),
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Text(value)
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        DetailValue::Number(value)
    }
}

impl From<usize> for DetailValue {
    fn from(value: usize) -> Self {
        DetailValue::Number(value as f64)
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        DetailValue::Flag(value)
    }
}

pub type DetailMap = HashMap<String, DetailValue>;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailMap>,
}

impl LogEntry {
    pub fn new(severity: Severity, category: Option<&str>, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.to_string(),
            category: category.map(|s| s.to_string()),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: DetailMap) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Ordered, append-only status log. Entries are never removed or reordered;
/// insertion order is display order.
pub struct StatusLog {
    entries: RwLock<Vec<LogEntry>>,
    sender: broadcast::Sender<LogEntry>,
    mirror: Option<Arc<dyn StatusMirror>>,
}

impl StatusLog {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            entries: RwLock::new(Vec::new()),
            sender,
            mirror: None,
        }
    }

    /// Mirrors every appended entry to the monitoring endpoint. The mirror
    /// send is detached and its failure never reaches the pipeline.
    pub fn with_mirror(capacity: usize, mirror: Arc<dyn StatusMirror>) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            entries: RwLock::new(Vec::new()),
            sender,
            mirror: Some(mirror),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        match self.entries.write() {
            Ok(mut entries) => entries.push(entry.clone()),
            Err(poisoned) => {
                log::warn!("Status log lock was poisoned, recovering");
                poisoned.into_inner().push(entry.clone());
            }
        }

        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(entry.clone());

        if let Some(ref mirror) = self.mirror {
            let mirror = Arc::clone(mirror);
            tokio::spawn(async move {
                if let Err(e) = mirror.send(&entry).await {
                    tracing::warn!(error = %e, "Status mirror send failed");
                }
            });
        }
    }

    pub fn info(&self, category: Option<&str>, message: &str) {
        self.push(LogEntry::new(Severity::Info, category, message));
    }

    pub fn error(&self, category: Option<&str>, message: &str) {
        self.push(LogEntry::new(Severity::Error, category, message));
    }

    pub fn success(&self, category: Option<&str>, message: &str) {
        self.push(LogEntry::new(Severity::Success, category, message));
    }

    pub fn info_with_detail(&self, category: Option<&str>, message: &str, detail: DetailMap) {
        self.push(LogEntry::new(Severity::Info, category, message).with_detail(detail));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    /// Read-only snapshot for the rendering layer.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        match self.entries.read() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => {
                log::warn!("Status log lock was poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new(256)
    }
}
