//! In-memory task store for the current batch.
//!
//! Tasks live only for one batch: a new batch replaces the whole set. Every
//! mutation is published on a broadcast channel for streaming consumers; the
//! rendering layer reads ordered snapshots and never mutates.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::batch::task::{CategoryTask, PostResult, TaskStatus};
use crate::config::Category;

pub struct TaskStore {
    tasks: RwLock<HashMap<String, CategoryTask>>,
    /// Configured display order of task ids.
    order: RwLock<Vec<String>>,
    sender: broadcast::Sender<CategoryTask>,
}

impl TaskStore {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            tasks: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Replaces the previous batch's tasks with fresh `Pending` tasks, one
    /// per category, in the given order.
    pub fn reset(&self, categories: &[Category]) {
        let mut tasks = HashMap::with_capacity(categories.len());
        let mut order = Vec::with_capacity(categories.len());
        for category in categories {
            tasks.insert(category.id.clone(), CategoryTask::new(category));
            order.push(category.id.clone());
        }

        match self.tasks.write() {
            Ok(mut guard) => *guard = tasks,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                *poisoned.into_inner() = tasks;
            }
        }
        match self.order.write() {
            Ok(mut guard) => *guard = order,
            Err(poisoned) => *poisoned.into_inner() = order,
        }
    }

    fn mutate<F>(&self, id: &str, apply: F)
    where
        F: FnOnce(&mut CategoryTask),
    {
        let mut guard = match self.tasks.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        let Some(task) = guard.get_mut(id) else {
            log::warn!("Ignoring update for unknown task '{}'", id);
            return;
        };
        // Terminal states never mutate again.
        if task.status.is_terminal() {
            log::warn!(
                "Ignoring update for task '{}' already in terminal state {}",
                id,
                task.status
            );
            return;
        }

        apply(task);

        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(task.clone());
    }

    pub fn set_status(&self, id: &str, status: TaskStatus) {
        self.mutate(id, |task| task.status = status);
    }

    pub fn complete(&self, id: &str, result: PostResult) {
        self.mutate(id, |task| {
            task.status = TaskStatus::Done;
            task.result = Some(result);
            task.error = None;
        });
    }

    pub fn fail(&self, id: &str, error: &str) {
        self.mutate(id, |task| {
            task.status = TaskStatus::Error;
            task.error = Some(error.to_string());
            task.result = None;
        });
    }

    pub fn get(&self, id: &str) -> Option<CategoryTask> {
        let guard = match self.tasks.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.get(id).cloned()
    }

    /// Read-only snapshot in configured order for the rendering layer.
    pub fn snapshot(&self) -> Vec<CategoryTask> {
        let order = match self.order.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let tasks = match self.tasks.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        order
            .iter()
            .filter_map(|id| tasks.get(id).cloned())
            .collect()
    }

    /// Returns (done, failed, unfinished) counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        let tasks = match self.tasks.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut done = 0;
        let mut failed = 0;
        let mut unfinished = 0;
        for task in tasks.values() {
            match task.status {
                TaskStatus::Done => done += 1,
                TaskStatus::Error => failed += 1,
                _ => unfinished += 1,
            }
        }
        (done, failed, unfinished)
    }

    /// Batch completion is observable as "no task is in a non-terminal state".
    pub fn all_terminal(&self) -> bool {
        let (_, _, unfinished) = self.counts();
        unfinished == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CategoryTask> {
        self.sender.subscribe()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: "world".to_string(),
                name: "World".to_string(),
            },
            Category {
                id: "tech".to_string(),
                name: "Technology".to_string(),
            },
        ]
    }

    fn sample_result() -> PostResult {
        PostResult {
            headline: "h".to_string(),
            image_url: "https://cdn.example.com/a.png".to_string(),
            caption: "c".to_string(),
            source_link: "https://news.example.com/a".to_string(),
            source_name: "Example Wire".to_string(),
        }
    }

    #[test]
    fn test_reset_creates_pending_tasks_in_order() {
        let store = TaskStore::new(16);
        store.reset(&categories());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "world");
        assert_eq!(snapshot[1].id, "tech");
        assert!(snapshot.iter().all(|t| t.status == TaskStatus::Pending));
    }

    #[test]
    fn test_reset_replaces_previous_batch() {
        let store = TaskStore::new(16);
        store.reset(&categories());
        store.fail("world", "boom");

        store.reset(&categories());
        let task = store.get("world").unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.error.is_none());
    }

    #[test]
    fn test_status_progression() {
        let store = TaskStore::new(16);
        store.reset(&categories());

        store.set_status("world", TaskStatus::Gathering);
        store.set_status("world", TaskStatus::Gathered);
        assert_eq!(store.get("world").unwrap().status, TaskStatus::Gathered);
    }

    #[test]
    fn test_complete_sets_result() {
        let store = TaskStore::new(16);
        store.reset(&categories());

        store.complete("world", sample_result());
        let task = store.get("world").unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.result.is_some());
        assert!(task.error.is_none());
    }

    #[test]
    fn test_fail_sets_error() {
        let store = TaskStore::new(16);
        store.reset(&categories());

        store.fail("tech", "feed unreachable");
        let task = store.get("tech").unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error.as_deref(), Some("feed unreachable"));
    }

    #[test]
    fn test_terminal_state_never_mutates_again() {
        let store = TaskStore::new(16);
        store.reset(&categories());

        store.complete("world", sample_result());
        store.set_status("world", TaskStatus::Processing);
        store.fail("world", "late failure");

        let task = store.get("world").unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.result.is_some());
        assert!(task.error.is_none());

        store.fail("tech", "boom");
        store.complete("tech", sample_result());
        let task = store.get("tech").unwrap();
        assert_eq!(task.status, TaskStatus::Error);
        assert!(task.result.is_none());
    }

    #[test]
    fn test_unknown_task_update_is_ignored() {
        let store = TaskStore::new(16);
        store.reset(&categories());
        store.set_status("nonexistent", TaskStatus::Gathering);
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_counts_and_all_terminal() {
        let store = TaskStore::new(16);
        store.reset(&categories());
        assert!(!store.all_terminal());

        store.complete("world", sample_result());
        assert_eq!(store.counts(), (1, 0, 1));
        assert!(!store.all_terminal());

        store.fail("tech", "boom");
        assert_eq!(store.counts(), (1, 1, 0));
        assert!(store.all_terminal());
    }

    #[test]
    fn test_mutations_are_broadcast() {
        let store = TaskStore::new(16);
        store.reset(&categories());
        let mut rx = store.subscribe();

        store.set_status("world", TaskStatus::Gathering);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.id, "world");
        assert_eq!(event.status, TaskStatus::Gathering);
    }
}
