//! Configuration loading and management
//!
//! Handles parsing of `weekdo.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::deadline;

/// Config file name looked up inside the data directory
pub const CONFIG_FILE: &str = "weekdo.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory override (CLI flag and env var take precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Category configuration
    #[serde(default)]
    pub categories: CategoriesConfig,

    /// Task creation rules
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Weekly reset timer
    #[serde(default)]
    pub reset: ResetConfig,

    /// Deadline display
    #[serde(default)]
    pub deadline: DeadlineConfig,

    /// Local store tuning
    #[serde(default)]
    pub store: StoreConfig,
}

/// Category-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesConfig {
    /// Categories seeded into an empty store and restored on every load
    #[serde(default = "default_categories")]
    pub defaults: Vec<String>,

    /// Label of the synthetic filter matching non-default categories
    #[serde(default = "default_other_label")]
    pub other_label: String,

    /// Maximum categories one task may carry
    #[serde(default = "default_per_task_limit")]
    pub per_task_limit: usize,
}

fn default_categories() -> Vec<String> {
    ["Home", "Study", "Work", "Personal", "Health"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_other_label() -> String {
    "Other".to_string()
}

fn default_per_task_limit() -> usize {
    3
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            defaults: default_categories(),
            other_label: default_other_label(),
            per_task_limit: default_per_task_limit(),
        }
    }
}

/// Rules applied when a task is added
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_true")]
    pub require_category: bool,

    #[serde(default)]
    pub require_assignee: bool,

    /// Require a weekday for the quick-add slot
    #[serde(default = "default_true")]
    pub require_schedule: bool,

    /// Slot time used when a weekday is given without one
    #[serde(default = "default_time")]
    pub default_time: String,
}

fn default_true() -> bool {
    true
}

fn default_time() -> String {
    "12:00".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            require_category: true,
            require_assignee: false,
            require_schedule: true,
            default_time: default_time(),
        }
    }
}

/// Weekly reset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between checkpoint checks in watch mode
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

fn default_check_interval_secs() -> u64 {
    60
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineConfig {
    /// Shown when a stored deadline cannot be interpreted
    #[serde(default = "default_invalid_label")]
    pub invalid_label: String,
}

fn default_invalid_label() -> String {
    deadline::INVALID_DEADLINE.to_string()
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            invalid_label: default_invalid_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How long a collection write waits for another writer's lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `weekdo.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `weekdo.toml` from `dir`, or return defaults when it is absent
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.categories.validate()?;
        self.tasks.validate()?;
        self.reset.validate()?;
        if self.deadline.invalid_label.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "deadline.invalid_label cannot be empty".to_string(),
            ));
        }
        if self.store.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "store.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl CategoriesConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.per_task_limit == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "categories.per_task_limit must be >= 1".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for name in &self.defaults {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "categories.defaults cannot include empty entries".to_string(),
                ));
            }
            if !seen.insert(trimmed) {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "categories.defaults has duplicate entry '{trimmed}'"
                )));
            }
        }

        let other = self.other_label.trim();
        if other.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "categories.other_label cannot be empty".to_string(),
            ));
        }
        if seen.contains(other) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "categories.other_label '{other}' collides with a default category"
            )));
        }

        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if deadline::parse_time(&self.default_time).is_none() {
            return Err(crate::error::Error::InvalidConfig(format!(
                "tasks.default_time '{}' is not HH:MM",
                self.default_time
            )));
        }
        Ok(())
    }
}

impl ResetConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.check_interval_secs == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "reset.check_interval_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert!(cfg.data_dir.is_none());
        assert_eq!(
            cfg.categories.defaults,
            vec!["Home", "Study", "Work", "Personal", "Health"]
        );
        assert_eq!(cfg.categories.other_label, "Other");
        assert_eq!(cfg.categories.per_task_limit, 3);
        assert!(cfg.tasks.require_category);
        assert!(!cfg.tasks.require_assignee);
        assert!(cfg.tasks.require_schedule);
        assert_eq!(cfg.tasks.default_time, "12:00");
        assert!(cfg.reset.enabled);
        assert_eq!(cfg.reset.check_interval_secs, 60);
        assert_eq!(cfg.deadline.invalid_label, "Invalid deadline");
        cfg.validate().expect("defaults validate");
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[categories]
defaults = ["Casa", "Trabalho"]
per_task_limit = 2

[tasks]
require_assignee = true
require_schedule = false
default_time = "08:30"

[reset]
enabled = false
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.categories.defaults, vec!["Casa", "Trabalho"]);
        assert_eq!(cfg.categories.per_task_limit, 2);
        assert_eq!(cfg.categories.other_label, "Other");
        assert!(cfg.tasks.require_category);
        assert!(cfg.tasks.require_assignee);
        assert!(!cfg.tasks.require_schedule);
        assert_eq!(cfg.tasks.default_time, "08:30");
        assert!(!cfg.reset.enabled);
        assert_eq!(cfg.reset.check_interval_secs, 60);
    }

    #[test]
    fn zero_category_limit_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[categories]\nper_task_limit = 0").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(message) => {
                assert!(message.contains("per_task_limit"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_label_cannot_shadow_default() {
        let mut cfg = Config::default();
        cfg.categories.other_label = "Work".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(crate::error::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn bad_default_time_rejected() {
        let mut cfg = Config::default();
        cfg.tasks.default_time = "noon".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("defaults");
        assert_eq!(cfg.categories.per_task_limit, 3);
    }

    #[test]
    fn lock_timeout_reads_from_store_section() {
        let cfg: Config = toml::from_str("[store]\nlock_timeout_ms = 250").expect("parse");
        assert_eq!(cfg.store.lock_timeout_ms, 250);
        assert!(cfg.validate().is_ok());

        let zero: Config = toml::from_str("[store]\nlock_timeout_ms = 0").expect("parse");
        assert!(zero.validate().is_err());
    }
}
