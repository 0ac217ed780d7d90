#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;
use weekdo::config::Config;
use weekdo::lock::StoreLock;
use weekdo::storage::LocalStore;
use weekdo::task::{Task, TaskBoard, TaskRules};

pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> LocalStore {
        LocalStore::new(self.dir.path())
    }

    pub async fn board(&self) -> TaskBoard {
        TaskBoard::load(self.store(), TaskRules::from_config(&Config::default()))
            .await
            .expect("load board")
    }

    /// Board over a store whose writes give up quickly on a held lock.
    pub async fn impatient_board(&self) -> TaskBoard {
        let store = LocalStore::with_lock_timeout(self.dir.path(), 50);
        TaskBoard::load(store, TaskRules::from_config(&Config::default()))
            .await
            .expect("load board")
    }

    /// Hold the `tasks.json` write lock until the guard drops.
    pub fn hold_tasks_lock(&self) -> StoreLock {
        StoreLock::acquire(self.dir.path().join("tasks.lock"), 1000).expect("hold tasks lock")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file("weekdo.toml", contents)
    }

    pub fn read_json(&self, rel_path: &str) -> Result<Value, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.dir.path().join(rel_path))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// weekdo binary pointed at `dir`, with tracing silenced.
pub fn weekdo_cmd(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("weekdo").expect("binary");
    cmd.env_remove("RUST_LOG")
        .env_remove("WEEKDO_CONFIG")
        .arg("--data-dir")
        .arg(dir.path());
    cmd
}

/// Run a command with `--json` and return the `data` field.
pub fn json_data(dir: &TestDir, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
    let output = weekdo_cmd(dir).args(args).arg("--json").output()?;
    if !output.status.success() {
        return Err(format!(
            "weekdo {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        )
        .into());
    }
    let value: Value = serde_json::from_slice(&output.stdout)?;
    Ok(value["data"].clone())
}

pub fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.title.as_str()).collect()
}
