//! Persistence collaborators.
//!
//! A submission is never destructive: the viewer keeps its in-memory store
//! whether or not the sink accepts the data, so a failed save can be retried.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

use super::wire::Submission;

/// Where saved task annotations go.
pub trait PersistenceSink {
    /// Store (or overwrite) the draft annotations for a task.
    fn submit(&self, submission: &Submission) -> impl Future<Output = Result<(), PersistenceError>>;

    /// Mark a previously submitted task as finished.
    fn complete_task(&self, task_id: &str) -> impl Future<Output = Result<(), PersistenceError>>;

    /// Previously submitted work for a task, if any.
    fn fetch(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<Option<Submission>, PersistenceError>>;
}

/// Lifecycle of a stored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Draft,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTask {
    status: TaskStatus,
    submission: Submission,
}

fn check_task_id(task_id: &str) -> Result<(), PersistenceError> {
    let valid = !task_id.is_empty()
        && task_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !task_id.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::Rejected {
            task_id: task_id.to_string(),
            reason: "task id must be non-empty and contain only [A-Za-z0-9._-]".to_string(),
        })
    }
}

/// Stores one JSON document per task in a directory.
#[derive(Debug, Clone)]
pub struct JsonDirectorySink {
    root: PathBuf,
}

impl JsonDirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn task_path(&self, task_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", task_id))
    }

    fn read_task(&self, task_id: &str) -> Result<Option<StoredTask>, PersistenceError> {
        let path = self.task_path(task_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Write via a temporary file so a failed write never truncates an existing document.
    fn write_task(&self, task_id: &str, task: &StoredTask) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(task)?;
        let path = self.task_path(task_id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Current status of a stored task.
    pub fn status(&self, task_id: &str) -> Result<Option<TaskStatus>, PersistenceError> {
        check_task_id(task_id)?;
        Ok(self.read_task(task_id)?.map(|t| t.status))
    }
}

impl PersistenceSink for JsonDirectorySink {
    async fn submit(&self, submission: &Submission) -> Result<(), PersistenceError> {
        check_task_id(&submission.task_id)?;
        let status = self
            .read_task(&submission.task_id)?
            .map(|t| t.status)
            .unwrap_or_default();
        let task = StoredTask {
            status,
            submission: submission.clone(),
        };
        self.write_task(&submission.task_id, &task)?;
        log::info!(
            "💾 Saved {} annotations for task {} to {:?}",
            submission.items.len(),
            submission.task_id,
            self.root
        );
        Ok(())
    }

    async fn complete_task(&self, task_id: &str) -> Result<(), PersistenceError> {
        check_task_id(task_id)?;
        let mut task = self
            .read_task(task_id)?
            .ok_or_else(|| PersistenceError::TaskNotFound(task_id.to_string()))?;
        task.status = TaskStatus::Completed;
        self.write_task(task_id, &task)?;
        log::info!("🏁 Task {} completed", task_id);
        Ok(())
    }

    async fn fetch(&self, task_id: &str) -> Result<Option<Submission>, PersistenceError> {
        check_task_id(task_id)?;
        Ok(self.read_task(task_id)?.map(|t| t.submission))
    }
}

/// In-memory sink for hosts without storage and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    tasks: RefCell<HashMap<String, StoredTask>>,
    /// When set, every call fails with this reason
    fail_with: RefCell<Option<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail (or succeed again with `None`).
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.fail_with.borrow_mut() = reason.map(str::to_string);
    }

    pub fn status(&self, task_id: &str) -> Option<TaskStatus> {
        self.tasks.borrow().get(task_id).map(|t| t.status)
    }

    fn check(&self, task_id: &str) -> Result<(), PersistenceError> {
        check_task_id(task_id)?;
        match self.fail_with.borrow().as_ref() {
            Some(reason) => Err(PersistenceError::Rejected {
                task_id: task_id.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl PersistenceSink for MemorySink {
    async fn submit(&self, submission: &Submission) -> Result<(), PersistenceError> {
        self.check(&submission.task_id)?;
        let mut tasks = self.tasks.borrow_mut();
        let status = tasks
            .get(&submission.task_id)
            .map(|t| t.status)
            .unwrap_or_default();
        tasks.insert(
            submission.task_id.clone(),
            StoredTask {
                status,
                submission: submission.clone(),
            },
        );
        Ok(())
    }

    async fn complete_task(&self, task_id: &str) -> Result<(), PersistenceError> {
        self.check(task_id)?;
        let mut tasks = self.tasks.borrow_mut();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| PersistenceError::TaskNotFound(task_id.to_string()))?;
        task.status = TaskStatus::Completed;
        Ok(())
    }

    async fn fetch(&self, task_id: &str) -> Result<Option<Submission>, PersistenceError> {
        self.check(task_id)?;
        Ok(self.tasks.borrow().get(task_id).map(|t| t.submission.clone()))
    }
}
