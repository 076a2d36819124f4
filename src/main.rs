use std::{net::SocketAddr, sync::Arc, time::Duration};

use swipe_n_bite::{
    api::{create_router, AppState, RecommendationLimits},
    config::Config,
    db::{create_redis_client, CatalogStore, InMemoryCatalog, InMemoryUserStore, RedisUserStore, UserStore},
    middleware::RateLimiter,
    services::{
        catalog_loader,
        chat::{ChatProvider, GeminiProvider},
        EncoderTables, FeatureEncoder, Recommender,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Catalog
    let items = catalog_loader::load_catalog(&config.catalog_path)
        .map_err(|e| anyhow::anyhow!("Failed to load catalog {}: {}", config.catalog_path, e))?;
    let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalog::new(items));

    // Encoder tables
    let tables = match &config.category_tables_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading category tables");
            EncoderTables::from_path(path)?
        }
        None => EncoderTables::default(),
    };
    let recommender = Recommender::new(FeatureEncoder::new(tables));

    // Saved items
    let users: Arc<dyn UserStore> = match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            Arc::new(RedisUserStore::new(client).await?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, saved items are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let mut state = AppState::new(catalog, users)
        .with_recommender(recommender)
        .with_limits(RecommendationLimits {
            default_k: config.default_recommendations,
            max_k: config.max_recommendations,
        });

    match &config.gemini_api_key {
        Some(api_key) => {
            let provider: Arc<dyn ChatProvider> = Arc::new(GeminiProvider::new(
                api_key.clone(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            ));
            tracing::info!(model = %config.gemini_model, "Chat provider initialized");
            state = state.with_chat(provider);
        }
        None => tracing::warn!("GEMINI_API_KEY not set, chat endpoint disabled"),
    }

    if config.rate_limit_requests > 0 {
        tracing::info!(
            requests = config.rate_limit_requests,
            window_secs = config.rate_limit_window_secs,
            "Per-client rate limit enabled"
        );
        state = state.with_rate_limiter(RateLimiter::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        ));
    }

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
