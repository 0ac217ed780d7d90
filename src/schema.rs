//! Store schema versions and additive upgrades
//!
//! The store directory carries a `schema.json` manifest next to one JSON
//! file per collection. Each schema version only ever adds a collection;
//! upgrades never drop or rewrite data.
//!
//! ```text
//! <data dir>/
//!   schema.json        # { version, collections, upgraded_at }
//!   tasks.json         # v1
//!   categories.json    # v2
//!   users.json         # v3
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::lock::{self, StoreLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::CollectionFile;

/// Schema version this build writes
pub const SCHEMA_VERSION: u32 = 3;

/// Manifest file name inside the store directory
pub const MANIFEST_FILE: &str = "schema.json";

/// Named record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Tasks,
    Categories,
    Users,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Categories => "categories",
            Collection::Users => "users",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }
}

/// One additive schema step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version reached once this step is applied
    pub version: u32,
    pub creates: Collection,
}

/// Ordered upgrade steps, keyed by target version
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        creates: Collection::Tasks,
    },
    Migration {
        version: 2,
        creates: Collection::Categories,
    },
    Migration {
        version: 3,
        creates: Collection::Users,
    },
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaManifest {
    pub version: u32,
    #[serde(default)]
    pub collections: Vec<Collection>,
    pub upgraded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub from: u32,
    pub to: u32,
    pub created: Vec<Collection>,
}

impl UpgradeReport {
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.created.is_empty()
    }
}

fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn read_manifest(root: &Path) -> Result<Option<SchemaManifest>> {
    let path = manifest_path(root);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn write_manifest(root: &Path, version: u32) -> Result<()> {
    let collections = MIGRATIONS
        .iter()
        .filter(|step| step.version <= version)
        .map(|step| step.creates)
        .collect();
    let manifest = SchemaManifest {
        version,
        collections,
        upgraded_at: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    lock::write_atomic(manifest_path(root), json.as_bytes())
}

fn create_collection(root: &Path, collection: Collection) -> Result<bool> {
    let path = root.join(collection.file_name());
    if path.exists() {
        return Ok(false);
    }
    let empty = CollectionFile::<serde_json::Value>::default();
    lock::write_atomic(&path, serde_json::to_string_pretty(&empty)?.as_bytes())?;
    Ok(true)
}

/// Apply every step with `from < version <= to`.
///
/// Steps at or below `from` whose file has gone missing are recreated as
/// well. Running this against a current schema changes nothing.
pub fn upgrade(root: &Path, from: u32, to: u32) -> Result<UpgradeReport> {
    let mut created = Vec::new();
    for step in MIGRATIONS.iter().filter(|step| step.version <= to) {
        if create_collection(root, step.creates)? {
            if step.version <= from {
                warn!(
                    collection = step.creates.name(),
                    "collection file missing; recreated empty"
                );
            } else {
                debug!(
                    collection = step.creates.name(),
                    version = step.version,
                    "created collection"
                );
            }
            created.push(step.creates);
        }
    }

    let reached = from.max(to);
    if reached != from || !created.is_empty() {
        write_manifest(root, reached)?;
    }

    Ok(UpgradeReport {
        from,
        to: reached,
        created,
    })
}

/// Bring the store directory up to [`SCHEMA_VERSION`].
pub fn ensure_schema(root: &Path) -> Result<UpgradeReport> {
    fs::create_dir_all(root)?;
    let _lock = StoreLock::acquire(root.join("schema.lock"), DEFAULT_LOCK_TIMEOUT_MS)?;

    let from = read_manifest(root)?.map(|m| m.version).unwrap_or(0);
    if from > SCHEMA_VERSION {
        warn!(
            found = from,
            supported = SCHEMA_VERSION,
            "store schema is newer than this build; opening without upgrade"
        );
    }

    let report = upgrade(root, from, SCHEMA_VERSION)?;
    if !report.is_noop() {
        info!(from = report.from, to = report.to, "store schema upgraded");
    }
    Ok(report)
}
