//! Storage seams for the catalog and per-user saved items
//!
//! Both are injected into the application state as trait objects so handlers
//! never reach for shared globals.
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{FoodItem, FoodKey},
};

pub mod memory;
pub mod redis;

pub use self::memory::{InMemoryCatalog, InMemoryUserStore};
pub use self::redis::{create_redis_client, RedisUserStore, StoreKey};

/// Read access to the food catalog
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every catalog item, in dataset order
    async fn items(&self) -> AppResult<Arc<Vec<FoodItem>>>;

    /// Looks up a single item by `(name, restaurant)`
    async fn find(&self, key: &FoodKey) -> AppResult<Option<FoodItem>>;

    /// Distinct non-empty states, sorted
    async fn states(&self) -> AppResult<Vec<String>>;
}

/// Saved items ("Eat-List") per user
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Saved items in the order they were saved
    async fn saved_items(&self, user_id: &str) -> AppResult<Vec<FoodItem>>;

    /// Appends `item` unless its key is already saved. Returns whether it was added.
    async fn save_item(&self, user_id: &str, item: FoodItem) -> AppResult<bool>;

    /// Removes the item with `key`. Returns whether anything was removed.
    async fn remove_item(&self, user_id: &str, key: &FoodKey) -> AppResult<bool>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

/// Adds `item` to `saved` unless an item with the same key is present
pub(crate) fn insert_unique(saved: &mut Vec<FoodItem>, item: FoodItem) -> bool {
    let key = item.key();
    if saved.iter().any(|existing| existing.matches(&key)) {
        return false;
    }
    saved.push(item);
    true
}

/// Drops every item with `key` from `saved`
pub(crate) fn remove_key(saved: &mut Vec<FoodItem>, key: &FoodKey) -> bool {
    let before = saved.len();
    saved.retain(|item| !item.matches(key));
    saved.len() != before
}
