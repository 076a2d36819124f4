use std::sync::Arc;

use crate::{
    db::{CatalogStore, InMemoryCatalog, InMemoryUserStore, UserStore},
    error::{AppError, AppResult},
    middleware::RateLimiter,
    models::FoodItem,
    services::{chat::ChatProvider, Recommender},
};

/// Bounds applied to the `k` requested by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationLimits {
    pub default_k: usize,
    pub max_k: usize,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            default_k: 5,
            max_k: 50,
        }
    }
}

impl RecommendationLimits {
    /// Applies the default and rejects values above the maximum
    pub fn resolve(&self, requested: Option<usize>) -> AppResult<usize> {
        let k = requested.unwrap_or(self.default_k);
        if k > self.max_k {
            return Err(AppError::InvalidInput(format!(
                "k must be at most {}",
                self.max_k
            )));
        }
        Ok(k)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub users: Arc<dyn UserStore>,
    pub chat: Option<Arc<dyn ChatProvider>>,
    pub recommender: Arc<Recommender>,
    pub limits: RecommendationLimits,
    /// Per-client request limit; unlimited when `None`
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    /// Creates state over the given stores with the built-in encoder and no chat
    pub fn new(catalog: Arc<dyn CatalogStore>, users: Arc<dyn UserStore>) -> Self {
        Self {
            catalog,
            users,
            chat: None,
            recommender: Arc::new(Recommender::default()),
            limits: RecommendationLimits::default(),
            rate_limiter: None,
        }
    }

    /// In-memory catalog and saved-items store
    pub fn in_memory(items: Vec<FoodItem>) -> Self {
        Self::new(
            Arc::new(InMemoryCatalog::new(items)),
            Arc::new(InMemoryUserStore::new()),
        )
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatProvider>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn with_recommender(mut self, recommender: Recommender) -> Self {
        self.recommender = Arc::new(recommender);
        self
    }

    pub fn with_limits(mut self, limits: RecommendationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(Arc::new(limiter));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_default() {
        let limits = RecommendationLimits::default();
        assert_eq!(limits.resolve(None).unwrap(), 5);
        assert_eq!(limits.resolve(Some(0)).unwrap(), 0);
        assert_eq!(limits.resolve(Some(50)).unwrap(), 50);
    }

    #[test]
    fn test_limits_reject_large_k() {
        let limits = RecommendationLimits {
            default_k: 3,
            max_k: 10,
        };
        assert!(matches!(limits.resolve(Some(11)), Err(AppError::InvalidInput(_))));
    }
}
