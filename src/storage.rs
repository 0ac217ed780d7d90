//! Local store for tasks, categories and users
//!
//! All persistent records live under one data directory:
//!
//! ```text
//! <data dir>/
//!   schema.json           # schema manifest (see `schema`)
//!   tasks.json            # { next_id, records: { id: Task } }
//!   categories.json       # single row (id 1) holding the ordered name list
//!   users.json            # { next_id, records: { id: User } }
//!   *.lock                # per-collection write locks
//!   flags/                # small key/value flags (see `flags`)
//! ```
//!
//! [`LocalStore`] opens lazily and at most once. If the directory cannot be
//! prepared the store degrades to "unavailable": reads return empty results
//! and writes become no-ops, so the rest of the app keeps working in memory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::lock::{self, StoreLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::schema::{self, Collection};
use crate::task::Task;
use crate::user::User;

/// Key of the single row in the categories collection
pub const CATEGORY_ROW_ID: u64 = 1;

/// On-disk shape of one collection file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFile<T> {
    pub next_id: u64,
    #[serde(default = "BTreeMap::new")]
    pub records: BTreeMap<u64, T>,
}

impl<T> Default for CollectionFile<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: BTreeMap::new(),
        }
    }
}

impl<T> CollectionFile<T> {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Keep `next_id` ahead of an explicitly chosen key.
    fn reserve(&mut self, id: u64) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryRow {
    id: u64,
    categories: Vec<String>,
}

/// Handle to the local store
///
/// Cloning is cheap; clones share the same lazily opened backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    root: Option<PathBuf>,
    lock_timeout_ms: u64,
    backend: OnceCell<Option<Backend>>,
}

impl LocalStore {
    /// Store rooted at `root`. Nothing touches the disk until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                root: Some(root.into()),
                lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
                backend: OnceCell::new(),
            }),
        }
    }

    /// Store with no backing directory; every operation is a no-op.
    pub fn unavailable() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                root: None,
                lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
                backend: OnceCell::new_with(Some(None)),
            }),
        }
    }

    /// Store rooted at `root` whose collection writes give up after
    /// `timeout_ms` when another writer holds the lock.
    pub fn with_lock_timeout(root: impl Into<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                root: Some(root.into()),
                lock_timeout_ms: timeout_ms,
                backend: OnceCell::new(),
            }),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.inner.root.as_deref()
    }

    /// Open the store and apply pending schema upgrades.
    ///
    /// Safe to call repeatedly and concurrently; initialization runs once.
    pub async fn open(&self) {
        self.backend().await;
    }

    pub async fn is_available(&self) -> bool {
        self.backend().await.is_some()
    }

    async fn backend(&self) -> Option<Backend> {
        self.inner
            .backend
            .get_or_init(|| initialize(self.inner.root.clone(), self.inner.lock_timeout_ms))
            .await
            .clone()
    }

    /// Run `f` against the backend on the blocking pool.
    ///
    /// Returns `Ok(None)` without running `f` when the store is unavailable.
    async fn with_backend<T, F>(&self, op: &'static str, f: F) -> Result<Option<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Backend) -> Result<T> + Send + 'static,
    {
        let Some(backend) = self.backend().await else {
            debug!(op, "store unavailable; skipping");
            return Ok(None);
        };

        let result = tokio::task::spawn_blocking(move || f(&backend)).await?;
        match &result {
            Ok(_) => debug!(op, "store operation committed"),
            Err(err) => error!(op, error = %err, "store operation failed"),
        }
        result.map(Some)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Insert `task` under a freshly assigned id, ignoring any id it carries.
    ///
    /// Returns the new id, or `None` when the store is unavailable.
    pub async fn add_task(&self, task: &Task) -> Result<Option<u64>> {
        let task = task.clone();
        self.with_backend("add_task", move |backend| backend.insert_task(task))
            .await
    }

    /// Every stored task, ordered by `order` (ties keep key order).
    pub async fn get_tasks(&self) -> Result<Vec<Task>> {
        self.with_backend("get_tasks", |backend| backend.tasks())
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn remove_task(&self, id: u64) -> Result<()> {
        self.with_backend("remove_task", move |backend| backend.delete_task(id))
            .await
            .map(|_| ())
    }

    /// Upsert: replace the record under `task.id`, or insert when it has none.
    pub async fn update_task(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        self.with_backend("update_task", move |backend| backend.put_task(task))
            .await
            .map(|_| ())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Replace the stored category list.
    pub async fn save_categories(&self, categories: &[String]) -> Result<()> {
        let categories = categories.to_vec();
        self.with_backend("save_categories", move |backend| {
            backend.put_categories(categories)
        })
        .await
        .map(|_| ())
    }

    /// Stored category list; empty if nothing was ever saved.
    pub async fn get_categories(&self) -> Result<Vec<String>> {
        self.with_backend("get_categories", |backend| backend.categories())
            .await
            .map(Option::unwrap_or_default)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Returns the new id, or `None` when the store is unavailable.
    pub async fn add_user(&self, user: &User) -> Result<Option<u64>> {
        let user = user.clone();
        self.with_backend("add_user", move |backend| backend.insert_user(user))
            .await
    }

    pub async fn get_users(&self) -> Result<Vec<User>> {
        self.with_backend("get_users", |backend| backend.users())
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn remove_user(&self, id: u64) -> Result<()> {
        self.with_backend("remove_user", move |backend| backend.delete_user(id))
            .await
            .map(|_| ())
    }
}

async fn initialize(root: Option<PathBuf>, lock_timeout_ms: u64) -> Option<Backend> {
    let root = root?;
    let shown = root.display().to_string();
    match tokio::task::spawn_blocking(move || Backend::initialize(root, lock_timeout_ms)).await {
        Ok(Ok(backend)) => Some(backend),
        Ok(Err(err)) => {
            warn!(root = %shown, error = %err, "local store unavailable; continuing without persistence");
            None
        }
        Err(err) => {
            warn!(root = %shown, error = %err, "local store open aborted; continuing without persistence");
            None
        }
    }
}

/// Synchronous file backend; every call runs on the blocking pool.
#[derive(Debug, Clone)]
struct Backend {
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl Backend {
    fn initialize(root: PathBuf, lock_timeout_ms: u64) -> Result<Self> {
        fs::create_dir_all(&root)?;
        schema::ensure_schema(&root)?;
        debug!(root = %root.display(), "local store opened");
        Ok(Self {
            root,
            lock_timeout_ms,
        })
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.file_name())
    }

    fn read<T: DeserializeOwned>(&self, collection: Collection) -> Result<CollectionFile<T>> {
        let path = self.path(collection);
        if !path.exists() {
            return Ok(CollectionFile::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read-modify-write one collection under its lock.
    fn update<T, R, F>(&self, collection: Collection, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut CollectionFile<T>) -> R,
    {
        let path = self.path(collection);
        let _lock = StoreLock::acquire(lock::lock_path_for(&path), self.lock_timeout_ms)?;

        let mut file = self.read(collection)?;
        let result = f(&mut file);

        let json = serde_json::to_string_pretty(&file)?;
        lock::write_atomic(&path, json.as_bytes())?;
        Ok(result)
    }

    fn insert_task(&self, mut task: Task) -> Result<u64> {
        self.update(Collection::Tasks, move |file: &mut CollectionFile<Task>| {
            let id = file.allocate();
            task.id = Some(id);
            file.records.insert(id, task);
            id
        })
    }

    fn put_task(&self, mut task: Task) -> Result<u64> {
        self.update(Collection::Tasks, move |file: &mut CollectionFile<Task>| {
            let id = match task.id {
                Some(id) => {
                    file.reserve(id);
                    id
                }
                None => file.allocate(),
            };
            task.id = Some(id);
            file.records.insert(id, task);
            id
        })
    }

    fn delete_task(&self, id: u64) -> Result<bool> {
        self.update(Collection::Tasks, |file: &mut CollectionFile<Task>| {
            file.records.remove(&id).is_some()
        })
    }

    fn tasks(&self) -> Result<Vec<Task>> {
        let file: CollectionFile<Task> = self.read(Collection::Tasks)?;
        let mut tasks: Vec<Task> = file
            .records
            .into_iter()
            .map(|(id, mut task)| {
                task.id = Some(id);
                task
            })
            .collect();
        tasks.sort_by_key(|task| task.order);
        Ok(tasks)
    }

    fn put_categories(&self, categories: Vec<String>) -> Result<()> {
        self.update(
            Collection::Categories,
            move |file: &mut CollectionFile<CategoryRow>| {
                file.reserve(CATEGORY_ROW_ID);
                file.records.insert(
                    CATEGORY_ROW_ID,
                    CategoryRow {
                        id: CATEGORY_ROW_ID,
                        categories,
                    },
                );
            },
        )
    }

    fn categories(&self) -> Result<Vec<String>> {
        let mut file: CollectionFile<CategoryRow> = self.read(Collection::Categories)?;
        Ok(file
            .records
            .remove(&CATEGORY_ROW_ID)
            .map(|row| row.categories)
            .unwrap_or_default())
    }

    fn insert_user(&self, mut user: User) -> Result<u64> {
        self.update(Collection::Users, move |file: &mut CollectionFile<User>| {
            let id = file.allocate();
            user.id = Some(id);
            file.records.insert(id, user);
            id
        })
    }

    fn delete_user(&self, id: u64) -> Result<bool> {
        self.update(Collection::Users, |file: &mut CollectionFile<User>| {
            file.records.remove(&id).is_some()
        })
    }

    fn users(&self) -> Result<Vec<User>> {
        let file: CollectionFile<User> = self.read(Collection::Users)?;
        Ok(file
            .records
            .into_iter()
            .map(|(id, mut user)| {
                user.id = Some(id);
                user
            })
            .collect())
    }
}
