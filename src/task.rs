//! Tasks and the task board.
//!
//! [`TaskBoard`] is the registry for tasks: it caches the ordered task list
//! from the local store, applies every mutation as a full-record replace
//! through the store and republishes the reloaded list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::deadline::{self, Deadline, DeadlineForm, Weekday};
use crate::error::{Error, Result};
use crate::filter::{self, TaskFilter};
use crate::storage::LocalStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Manual sort position
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Deadline>,
}

impl Task {
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }
}

/// Quick-add input
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub category: Option<String>,
    pub assignee_id: Option<u64>,
    pub weekday: Option<Weekday>,
    /// `HH:MM`; the configured default is used when a weekday comes alone
    pub time: Option<String>,
}

/// Rules applied by the board, taken from configuration
#[derive(Debug, Clone)]
pub struct TaskRules {
    pub per_task_limit: usize,
    pub require_category: bool,
    pub require_assignee: bool,
    pub require_schedule: bool,
    pub default_time: String,
}

impl TaskRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            per_task_limit: config.categories.per_task_limit,
            require_category: config.tasks.require_category,
            require_assignee: config.tasks.require_assignee,
            require_schedule: config.tasks.require_schedule,
            default_time: config.tasks.default_time.clone(),
        }
    }
}

impl Default for TaskRules {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of a best-effort reorder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReorderReport {
    pub persisted: usize,
    pub failed: usize,
}

/// Move `from` to `to` and renumber `order` to match positions.
///
/// Returns the indices (after the move) whose `order` changed. Moving an
/// item onto itself changes nothing.
pub fn reorder_tasks(tasks: &mut Vec<Task>, from: usize, to: usize) -> Result<Vec<usize>> {
    let len = tasks.len();
    if from >= len || to >= len {
        return Err(Error::InvalidArgument(format!(
            "cannot move position {from} to {to} in a list of {len}"
        )));
    }
    if from == to {
        return Ok(Vec::new());
    }

    let moved = tasks.remove(from);
    tasks.insert(to, moved);

    let mut changed = Vec::new();
    for (index, task) in tasks.iter_mut().enumerate() {
        let order = index as i64;
        if task.order != order {
            task.order = order;
            changed.push(index);
        }
    }
    Ok(changed)
}

/// Trim, drop blanks and duplicates (first occurrence wins), then enforce
/// `1..=limit`.
pub fn normalize_categories(categories: &[String], limit: usize) -> Result<Vec<String>> {
    let mut unique: Vec<String> = Vec::new();
    for name in categories {
        let name = name.trim();
        if !name.is_empty() && !unique.iter().any(|c| c == name) {
            unique.push(name.to_string());
        }
    }
    if unique.is_empty() || unique.len() > limit {
        return Err(Error::CategoryLimit {
            limit,
            count: unique.len(),
        });
    }
    Ok(unique)
}

pub struct TaskBoard {
    store: LocalStore,
    rules: TaskRules,
    tasks: watch::Sender<Vec<Task>>,
}

impl TaskBoard {
    pub async fn load(store: LocalStore, rules: TaskRules) -> Result<Self> {
        let tasks = store.get_tasks().await?;
        let (tx, _) = watch::channel(tasks);
        Ok(Self {
            store,
            rules,
            tasks: tx,
        })
    }

    pub fn rules(&self) -> &TaskRules {
        &self.rules
    }

    /// Current tasks in `order`
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.tasks.subscribe()
    }

    pub fn find(&self, id: u64) -> Option<Task> {
        self.tasks
            .borrow()
            .iter()
            .find(|task| task.id == Some(id))
            .cloned()
    }

    pub fn filtered(&self, filter: &TaskFilter, defaults: &[String]) -> Vec<Task> {
        filter::filter_tasks(&self.tasks.borrow(), filter, defaults)
    }

    pub async fn reload(&self) -> Result<()> {
        let tasks = self.store.get_tasks().await?;
        debug!(count = tasks.len(), "task board reloaded");
        self.tasks.send_replace(tasks);
        Ok(())
    }

    /// Validate and store a quick-add task.
    ///
    /// Returns the store-assigned id, or `None` when the store is unavailable
    /// and the task was accepted without being kept.
    pub async fn add(&self, new: NewTask) -> Result<Option<u64>> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        let category = new
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if category.is_none() && self.rules.require_category {
            return Err(Error::MissingCategory);
        }
        if new.assignee_id.is_none() && self.rules.require_assignee {
            return Err(Error::MissingAssignee);
        }

        let slot = match (new.weekday, new.time) {
            (Some(weekday), time) => {
                let time = time.unwrap_or_else(|| self.rules.default_time.clone());
                if deadline::parse_time(&time).is_none() {
                    return Err(Error::InvalidArgument(format!(
                        "time '{time}' is not HH:MM"
                    )));
                }
                Some(Deadline::slot(weekday, time))
            }
            (None, Some(_)) => {
                return Err(if self.rules.require_schedule {
                    Error::MissingSchedule
                } else {
                    Error::InvalidArgument("a time needs a weekday".to_string())
                });
            }
            (None, None) => None,
        };
        if slot.is_none() && self.rules.require_schedule {
            return Err(Error::MissingSchedule);
        }

        let task = Task {
            id: None,
            title: title.to_string(),
            categories: category.into_iter().collect(),
            completed: false,
            created_at: Utc::now(),
            order: self.tasks.borrow().len() as i64,
            assignee_id: new.assignee_id,
            deadline: slot,
        };
        let id = self.store.add_task(&task).await?;
        self.reload().await?;
        Ok(id)
    }

    fn require(&self, id: u64) -> Result<Task> {
        self.find(id).ok_or(Error::TaskNotFound(id))
    }

    async fn replace(&self, task: Task) -> Result<()> {
        self.store.update_task(&task).await?;
        self.reload().await
    }

    /// Flip completion; returns the new state.
    pub async fn toggle_completed(&self, id: u64) -> Result<bool> {
        let mut task = self.require(id)?;
        task.completed = !task.completed;
        let completed = task.completed;
        self.replace(task).await?;
        Ok(completed)
    }

    pub async fn rename(&self, id: u64, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }
        let mut task = self.require(id)?;
        task.title = title.to_string();
        self.replace(task).await
    }

    pub async fn set_categories(&self, id: u64, categories: &[String]) -> Result<()> {
        let categories = normalize_categories(categories, self.rules.per_task_limit)?;
        let mut task = self.require(id)?;
        task.categories = categories;
        self.replace(task).await
    }

    pub async fn set_deadline(&self, id: u64, form: &DeadlineForm) -> Result<()> {
        let deadline = form.validate()?;
        let mut task = self.require(id)?;
        task.deadline = Some(deadline);
        self.replace(task).await
    }

    pub async fn clear_deadline(&self, id: u64) -> Result<()> {
        let mut task = self.require(id)?;
        task.deadline = None;
        self.replace(task).await
    }

    pub async fn assign(&self, id: u64, user_id: Option<u64>) -> Result<()> {
        let mut task = self.require(id)?;
        task.assignee_id = user_id;
        self.replace(task).await
    }

    pub async fn remove(&self, id: u64) -> Result<()> {
        self.require(id)?;
        self.store.remove_task(id).await?;
        self.reload().await
    }

    /// Move a task and persist every task whose position changed.
    ///
    /// Writes are independent: a failed one is logged and the rest still go
    /// through.
    pub async fn reorder(&self, from: usize, to: usize) -> Result<ReorderReport> {
        let mut tasks = self.snapshot();
        let changed = reorder_tasks(&mut tasks, from, to)?;

        let mut report = ReorderReport::default();
        for index in changed {
            let task = &tasks[index];
            match self.store.update_task(task).await {
                Ok(()) => report.persisted += 1,
                Err(err) => {
                    error!(task_id = ?task.id, order = task.order, error = %err, "failed to persist task order");
                    report.failed += 1;
                }
            }
        }

        self.reload().await?;
        Ok(report)
    }

    /// Delete every task, one at a time. Stops at the first failure.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for task in self.snapshot() {
            let Some(id) = task.id else { continue };
            if let Err(err) = self.store.remove_task(id).await {
                error!(task_id = id, removed, error = %err, "task sweep stopped");
                if let Err(reload_err) = self.reload().await {
                    warn!(error = %reload_err, "task board reload failed after sweep error");
                }
                return Err(err);
            }
            removed += 1;
        }
        self.reload().await?;
        Ok(removed)
    }
}
