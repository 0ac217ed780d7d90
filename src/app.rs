//! Application facade
//!
//! Opens the local store once and wires the registries that front ends
//! talk to.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::category::CategoryRegistry;
use crate::config::Config;
use crate::deadline::{self, Deadline};
use crate::error::{Error, Result};
use crate::filter::{CategoryFilter, TaskFilter};
use crate::flags::{FlagStore, DISPLAY_NAME};
use crate::reset::WeeklyReset;
use crate::storage::LocalStore;
use crate::task::{Task, TaskBoard, TaskRules};
use crate::user::UserRegistry;

pub struct App {
    config: Config,
    data_dir: Option<PathBuf>,
    store: LocalStore,
    flags: FlagStore,
    categories: CategoryRegistry,
    users: UserRegistry,
    tasks: TaskBoard,
}

impl App {
    /// Open the store under `data_dir` and load every registry.
    pub async fn open(data_dir: &Path, config: Config) -> Result<Self> {
        let store = LocalStore::with_lock_timeout(data_dir, config.store.lock_timeout_ms);
        store.open().await;
        let flags = FlagStore::new(data_dir);
        Self::assemble(Some(data_dir.to_path_buf()), config, store, flags).await
    }

    /// App backed by nothing: registries start from defaults and writes are
    /// dropped.
    pub async fn detached(config: Config) -> Result<Self> {
        Self::assemble(
            None,
            config,
            LocalStore::unavailable(),
            FlagStore::memory_less(),
        )
        .await
    }

    async fn assemble(
        data_dir: Option<PathBuf>,
        config: Config,
        store: LocalStore,
        flags: FlagStore,
    ) -> Result<Self> {
        let categories =
            CategoryRegistry::load(store.clone(), config.categories.defaults.clone()).await?;
        let users = UserRegistry::load(store.clone()).await?;
        let tasks = TaskBoard::load(store.clone(), TaskRules::from_config(&config)).await?;
        debug!(
            persistent = data_dir.is_some(),
            tasks = tasks.snapshot().len(),
            "app ready"
        );
        Ok(Self {
            config,
            data_dir,
            store,
            flags,
            categories,
            users,
            tasks,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn weekly_reset(&self) -> WeeklyReset {
        WeeklyReset::new(self.flags.clone())
    }

    pub fn display_name(&self) -> Option<String> {
        self.flags
            .get(DISPLAY_NAME)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Store a trimmed, non-empty display name and return it.
    pub fn set_display_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "display name cannot be empty".to_string(),
            ));
        }
        self.flags.set(DISPLAY_NAME, name)?;
        Ok(name.to_string())
    }

    pub fn category_filter(&self, label: &str) -> CategoryFilter {
        CategoryFilter::parse(label, &self.config.categories.other_label)
    }

    pub fn filtered_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks.filtered(filter, self.categories.defaults())
    }

    /// Assign a task to a known user, or clear the assignee.
    pub async fn assign(&self, task_id: u64, user_id: Option<u64>) -> Result<()> {
        if let Some(user_id) = user_id {
            if self.users.find(user_id).is_none() {
                return Err(Error::UserNotFound(user_id));
            }
        }
        self.tasks.assign(task_id, user_id).await
    }

    /// Display text for a deadline, using the configured fallback.
    pub fn describe_deadline(&self, deadline: &Deadline) -> String {
        deadline::describe_or(deadline, &self.config.deadline.invalid_label)
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::{Interval, Weekday};
    use crate::task::NewTask;
    use tempfile::tempdir;

    #[tokio::test]
    async fn display_name_is_trimmed_and_required() {
        let dir = tempdir().expect("tempdir");
        let app = App::open(dir.path(), Config::default()).await.expect("open");

        assert_eq!(app.display_name(), None);
        assert_eq!(app.set_display_name("  Joana ").expect("set"), "Joana");
        assert_eq!(app.display_name().as_deref(), Some("Joana"));
        assert!(app.set_display_name("  ").expect_err("blank").is_validation());
        assert_eq!(app.display_name().as_deref(), Some("Joana"));
    }

    #[tokio::test]
    async fn assign_requires_known_user() {
        let dir = tempdir().expect("tempdir");
        let app = App::open(dir.path(), Config::default()).await.expect("open");
        app.tasks()
            .add(NewTask {
                title: "water plants".to_string(),
                category: Some("Home".to_string()),
                weekday: Some(Weekday::Saturday),
                ..NewTask::default()
            })
            .await
            .expect("add");
        let task_id = app.tasks().snapshot()[0].id.expect("id");

        let err = app.assign(task_id, Some(9)).await.expect_err("unknown user");
        assert!(matches!(err, Error::UserNotFound(9)));

        app.users().add("Rui").await.expect("user");
        app.assign(task_id, Some(1)).await.expect("assign");
        assert_eq!(app.tasks().find(task_id).and_then(|t| t.assignee_id), Some(1));
        app.assign(task_id, None).await.expect("unassign");
        assert_eq!(app.tasks().find(task_id).and_then(|t| t.assignee_id), None);
    }

    #[tokio::test]
    async fn detached_app_serves_defaults() {
        let app = App::detached(Config::default()).await.expect("detached");
        assert!(!app.store().is_available().await);
        assert_eq!(app.categories().snapshot().len(), 5);
        assert!(app.tasks().snapshot().is_empty());
        assert!(app.data_dir().is_none());
    }

    #[tokio::test]
    async fn invalid_deadline_uses_configured_label() {
        let mut config = Config::default();
        config.deadline.invalid_label = "??".to_string();
        let app = App::detached(config).await.expect("detached");
        let broken = Deadline::Interval(Interval {
            start_date: "nope".to_string(),
            start_time: String::new(),
            end_date: String::new(),
            end_time: String::new(),
            weekday: None,
        });
        assert_eq!(app.describe_deadline(&broken), "??");
        assert_eq!(app.category_filter("Other"), CategoryFilter::Other);
    }
}
