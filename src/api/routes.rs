use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, rate_limit_middleware, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes());

    // Runs inside the request-id and trace layers
    let router = match state.rate_limiter.clone() {
        Some(limiter) => router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware)),
        None => router,
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/foods", get(handlers::list_foods))
        .route("/foods/similar", get(handlers::similar_items))
        .route("/states", get(handlers::list_states))
        // Stateless recommendations
        .route("/recommendations", post(handlers::recommend))
        // Per-user saved items
        .route(
            "/users/:user_id/saved",
            get(handlers::get_saved)
                .post(handlers::save_item)
                .delete(handlers::remove_saved),
        )
        .route(
            "/users/:user_id/recommendations",
            get(handlers::user_recommendations),
        )
        .route("/users/:user_id/feed", get(handlers::user_feed))
        // Assistant
        .route("/chat", post(handlers::ask_assistant))
}
