//! Category registry
//!
//! Ordered, duplicate-free category names cached from the local store and
//! republished over a `watch` channel after every change.
//!
//! Load policy: an empty store is seeded with the defaults. Otherwise the
//! stored list comes first and any missing default is appended to the cache
//! (not written back), so a removed default reappears on the next load while
//! a removed custom category stays gone.

use tokio::sync::watch;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::LocalStore;

pub struct CategoryRegistry {
    store: LocalStore,
    defaults: Vec<String>,
    categories: watch::Sender<Vec<String>>,
}

impl CategoryRegistry {
    pub async fn load(store: LocalStore, defaults: Vec<String>) -> Result<Self> {
        let categories = load_with_defaults(&store, &defaults).await?;
        let (tx, _) = watch::channel(categories);
        Ok(Self {
            store,
            defaults,
            categories: tx,
        })
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.categories.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.categories.subscribe()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.borrow().iter().any(|c| c == name)
    }

    /// Append a category. Returns `false` without writing when it already
    /// exists.
    pub async fn add(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "category name cannot be empty".to_string(),
            ));
        }
        if self.contains(name) {
            return Ok(false);
        }

        let mut next = self.snapshot();
        next.push(name.to_string());
        self.commit(next).await?;
        Ok(true)
    }

    /// Remove a category, defaults included. Tasks keep their tags.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let current = self.snapshot();
        if !current.iter().any(|c| c == name) {
            return Ok(false);
        }
        let next = current.into_iter().filter(|c| c != name).collect();
        self.commit(next).await?;
        Ok(true)
    }

    /// Replace the whole ordering as given.
    pub async fn reorder(&self, ordered: Vec<String>) -> Result<()> {
        self.commit(ordered).await
    }

    pub async fn reload(&self) -> Result<()> {
        let categories = load_with_defaults(&self.store, &self.defaults).await?;
        self.categories.send_replace(categories);
        Ok(())
    }

    async fn commit(&self, next: Vec<String>) -> Result<()> {
        self.store.save_categories(&next).await?;
        debug!(count = next.len(), "categories saved");
        self.categories.send_replace(next);
        Ok(())
    }
}

async fn load_with_defaults(store: &LocalStore, defaults: &[String]) -> Result<Vec<String>> {
    let stored = store.get_categories().await?;
    if stored.is_empty() {
        store.save_categories(defaults).await?;
        debug!("seeded default categories");
        return Ok(defaults.to_vec());
    }

    let mut merged = Vec::with_capacity(stored.len() + defaults.len());
    for name in stored.into_iter().chain(defaults.iter().cloned()) {
        if !merged.contains(&name) {
            merged.push(name);
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoriesConfig;
    use tempfile::tempdir;

    fn defaults() -> Vec<String> {
        CategoriesConfig::default().defaults
    }

    #[tokio::test]
    async fn empty_store_is_seeded_and_persisted() {
        let dir = tempdir().expect("tempdir");
        let store = LocalStore::new(dir.path());
        let registry = CategoryRegistry::load(store.clone(), defaults())
            .await
            .expect("load");

        assert_eq!(registry.snapshot(), defaults());
        assert_eq!(store.get_categories().await.expect("stored"), defaults());
    }

    #[tokio::test]
    async fn adding_existing_name_is_noop() {
        let dir = tempdir().expect("tempdir");
        let registry = CategoryRegistry::load(LocalStore::new(dir.path()), defaults())
            .await
            .expect("load");
        let rx = registry.subscribe();

        assert!(!registry.add("Home").await.expect("add"));
        assert!(!rx.has_changed().expect("sender alive"));
        assert_eq!(registry.snapshot().iter().filter(|c| *c == "Home").count(), 1);

        assert!(registry.add(" Garden ").await.expect("add"));
        assert_eq!(registry.snapshot().last().map(String::as_str), Some("Garden"));
    }

    #[tokio::test]
    async fn removed_default_returns_on_reload() {
        let dir = tempdir().expect("tempdir");
        let registry = CategoryRegistry::load(LocalStore::new(dir.path()), defaults())
            .await
            .expect("load");

        registry.add("Garden").await.expect("add");
        assert!(registry.remove("Home").await.expect("remove default"));
        assert!(registry.remove("Garden").await.expect("remove custom"));
        assert!(!registry.contains("Home"));

        registry.reload().await.expect("reload");
        assert!(registry.contains("Home"));
        assert!(!registry.contains("Garden"));
        assert_eq!(registry.snapshot().last().map(String::as_str), Some("Home"));
    }

    #[tokio::test]
    async fn reorder_is_trusted_verbatim() {
        let dir = tempdir().expect("tempdir");
        let store = LocalStore::new(dir.path());
        let registry = CategoryRegistry::load(store.clone(), defaults())
            .await
            .expect("load");

        let reversed: Vec<String> = defaults().into_iter().rev().collect();
        registry.reorder(reversed.clone()).await.expect("reorder");
        assert_eq!(registry.snapshot(), reversed);
        assert_eq!(store.get_categories().await.expect("stored"), reversed);
    }

    #[tokio::test]
    async fn unavailable_store_still_serves_defaults() {
        let registry = CategoryRegistry::load(LocalStore::unavailable(), defaults())
            .await
            .expect("load");
        assert_eq!(registry.snapshot(), defaults());
        assert!(registry.add("Garden").await.expect("add"));
        assert!(registry.contains("Garden"));
    }
}
