use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{insert_unique, remove_key, CatalogStore, UserStore};
use crate::{
    error::AppResult,
    models::{FoodItem, FoodKey},
};

/// Catalog held fully in memory, loaded once at startup
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    items: Arc<Vec<FoodItem>>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<FoodItem>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn items(&self) -> AppResult<Arc<Vec<FoodItem>>> {
        Ok(self.items.clone())
    }

    async fn find(&self, key: &FoodKey) -> AppResult<Option<FoodItem>> {
        Ok(self.items.iter().find(|item| item.matches(key)).cloned())
    }

    async fn states(&self) -> AppResult<Vec<String>> {
        let states: BTreeSet<&str> = self
            .items
            .iter()
            .map(|item| item.state.as_str())
            .filter(|state| !state.is_empty())
            .collect();
        Ok(states.into_iter().map(str::to_string).collect())
    }
}

/// Saved items kept in process memory; lost on restart
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    saved: Arc<RwLock<HashMap<String, Vec<FoodItem>>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn saved_items(&self, user_id: &str) -> AppResult<Vec<FoodItem>> {
        let saved = self.saved.read().await;
        Ok(saved.get(user_id).cloned().unwrap_or_default())
    }

    async fn save_item(&self, user_id: &str, item: FoodItem) -> AppResult<bool> {
        let mut saved = self.saved.write().await;
        Ok(insert_unique(saved.entry(user_id.to_string()).or_default(), item))
    }

    async fn remove_item(&self, user_id: &str, key: &FoodKey) -> AppResult<bool> {
        let mut saved = self.saved.write().await;
        Ok(saved
            .get_mut(user_id)
            .map(|items| remove_key(items, key))
            .unwrap_or(false))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
