//! User registry
//!
//! Cached list of users mirrored from the local store. Every mutation goes
//! through the store and then reloads, so the cache always carries the ids
//! the store assigned.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::LocalStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

pub struct UserRegistry {
    store: LocalStore,
    users: watch::Sender<Vec<User>>,
}

impl UserRegistry {
    pub async fn load(store: LocalStore) -> Result<Self> {
        let users = store.get_users().await?;
        let (tx, _) = watch::channel(users);
        Ok(Self { store, users: tx })
    }

    pub fn snapshot(&self) -> Vec<User> {
        self.users.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<User>> {
        self.users.subscribe()
    }

    pub fn find(&self, id: u64) -> Option<User> {
        self.users
            .borrow()
            .iter()
            .find(|user| user.id == Some(id))
            .cloned()
    }

    /// Add a user. Names are not deduplicated.
    ///
    /// Returns the new id, or `None` when the store is unavailable.
    pub async fn add(&self, name: &str) -> Result<Option<u64>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "user name cannot be empty".to_string(),
            ));
        }
        let id = self.store.add_user(&User::new(name)).await?;
        self.reload().await?;
        Ok(id)
    }

    pub async fn remove(&self, id: u64) -> Result<()> {
        self.store.remove_user(id).await?;
        self.reload().await
    }

    pub async fn reload(&self) -> Result<()> {
        let users = self.store.get_users().await?;
        debug!(count = users.len(), "user registry reloaded");
        self.users.send_replace(users);
        Ok(())
    }
}
