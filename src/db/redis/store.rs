use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::db::{insert_unique, remove_key, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{FoodItem, FoodKey};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    SavedItems(String),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::SavedItems(user_id) => write!(f, "saved:{}", user_id),
        }
    }
}

/// Creates a Redis client for the saved-items store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Saved items persisted in Redis as one JSON list per user
///
/// Updates are read-modify-write without a transaction, so two concurrent
/// writes for the same user may race; the last write wins.
#[derive(Clone)]
pub struct RedisUserStore {
    connection: ConnectionManager,
}

impl RedisUserStore {
    /// Connects through a reconnecting connection manager
    pub async fn new(client: Client) -> AppResult<Self> {
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis saved-items store");
        Ok(Self { connection })
    }

    async fn load(&self, key: &StoreKey) -> AppResult<Vec<FoodItem>> {
        let mut conn = self.connection.clone();
        let stored: Option<String> = conn.get(key.to_string()).await?;

        match stored {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                AppError::Internal(format!("Saved items deserialization error: {}", e))
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn store(&self, key: &StoreKey, items: &[FoodItem]) -> AppResult<()> {
        let json = serde_json::to_string(items)
            .map_err(|e| AppError::Internal(format!("Saved items serialization error: {}", e)))?;

        let mut conn = self.connection.clone();
        let _: () = conn.set(key.to_string(), json).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserStore for RedisUserStore {
    async fn saved_items(&self, user_id: &str) -> AppResult<Vec<FoodItem>> {
        self.load(&StoreKey::SavedItems(user_id.to_string())).await
    }

    async fn save_item(&self, user_id: &str, item: FoodItem) -> AppResult<bool> {
        let key = StoreKey::SavedItems(user_id.to_string());
        let mut saved = self.load(&key).await?;

        if !insert_unique(&mut saved, item) {
            return Ok(false);
        }

        self.store(&key, &saved).await?;
        Ok(true)
    }

    async fn remove_item(&self, user_id: &str, food: &FoodKey) -> AppResult<bool> {
        let key = StoreKey::SavedItems(user_id.to_string());
        let mut saved = self.load(&key).await?;

        if !remove_key(&mut saved, food) {
            return Ok(false);
        }

        if saved.is_empty() {
            let mut conn = self.connection.clone();
            let _: () = conn.del(key.to_string()).await?;
        } else {
            self.store(&key, &saved).await?;
        }
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::dessert_catalog;

    #[test]
    fn test_store_key_display() {
        let key = StoreKey::SavedItems("alice".to_string());
        assert_eq!(format!("{}", key), "saved:alice");
    }

    async fn connect() -> RedisUserStore {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let client = create_redis_client(&redis_url).unwrap();
        RedisUserStore::new(client).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_save_list_remove() {
        let store = connect().await;
        let user = "redis_store_test_user";
        let catalog = dessert_catalog();

        assert!(store.save_item(user, catalog[0].clone()).await.unwrap());
        assert!(!store.save_item(user, catalog[0].clone()).await.unwrap());
        assert!(store.save_item(user, catalog[1].clone()).await.unwrap());

        let saved = store.saved_items(user).await.unwrap();
        assert_eq!(saved, vec![catalog[0].clone(), catalog[1].clone()]);

        // Clean up
        assert!(store.remove_item(user, &catalog[0].key()).await.unwrap());
        assert!(store.remove_item(user, &catalog[1].key()).await.unwrap());
        assert!(store.saved_items(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_unknown_user_has_no_items() {
        let store = connect().await;
        let saved = store.saved_items("redis_store_nobody").await.unwrap();
        assert!(saved.is_empty());
    }
}
