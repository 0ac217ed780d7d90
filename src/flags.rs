//! Small string flags kept beside the store
//!
//! One file per key under `<data dir>/flags/`, holding the raw value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::lock;

pub const FLAGS_DIR: &str = "flags";

/// User display name
pub const DISPLAY_NAME: &str = "display_name";

/// Next weekly reset instant, epoch milliseconds
pub const RESET_CHECKPOINT: &str = "weekly_reset_checkpoint";

#[derive(Debug, Clone)]
pub struct FlagStore {
    dir: Option<PathBuf>,
}

impl FlagStore {
    /// Flags stored under `<data_dir>/flags/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: Some(data_dir.join(FLAGS_DIR)),
        }
    }

    /// Flags that are never persisted; reads miss and writes succeed.
    pub fn memory_less() -> Self {
        Self { dir: None }
    }

    fn path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(key))
    }

    /// Read a flag. Unreadable flags are treated as missing.
    pub fn get(&self, key: &str) -> Option<String> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                debug!(key, error = %err, "flag unreadable; treating as missing");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        match self.path(key) {
            Some(path) => lock::write_atomic(path, value.as_bytes()),
            None => Ok(()),
        }
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let Some(path) = self.path(key) else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
