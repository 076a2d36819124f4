use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{ChatMessage, ChatReply, FoodItem, FoodKey},
    services::chat,
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct StateFilter {
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub name: String,
    pub restaurant: String,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TopKQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub saved: Vec<FoodItem>,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

fn in_state(item: &FoodItem, filter: &StateFilter) -> bool {
    match filter.state.as_deref() {
        Some(state) => item.state == state,
        None => true,
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let catalog = state.catalog.items().await?;
    Ok(Json(json!({
        "status": "healthy",
        "catalog_size": catalog.len(),
    })))
}

/// Catalog items, optionally restricted to one state
pub async fn list_foods(
    State(state): State<AppState>,
    Query(filter): Query<StateFilter>,
) -> AppResult<Json<Vec<FoodItem>>> {
    let catalog = state.catalog.items().await?;
    let items = catalog
        .iter()
        .filter(|item| in_state(item, &filter))
        .cloned()
        .collect();
    Ok(Json(items))
}

/// Distinct states present in the catalog
pub async fn list_states(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.catalog.states().await?))
}

/// Items most similar to one catalog item
pub async fn similar_items(
    State(state): State<AppState>,
    Query(query): Query<SimilarQuery>,
) -> AppResult<Json<Vec<FoodItem>>> {
    let k = state.limits.resolve(query.k)?;
    let key = FoodKey {
        name: query.name,
        restaurant: query.restaurant,
    };

    let target = state
        .catalog
        .find(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food item {} not in catalog", key)))?;

    let catalog = state.catalog.items().await?;
    Ok(Json(state.recommender.find_similar_items(&target, &catalog, k)))
}

/// Recommendations for a saved list supplied by the caller
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<FoodItem>>> {
    let k = state.limits.resolve(request.k)?;
    let catalog = state.catalog.items().await?;

    let recommendations = state
        .recommender
        .get_recommendations(&request.saved, &catalog, k);

    tracing::info!(
        request_id = %request_id,
        saved_count = request.saved.len(),
        k,
        returned = recommendations.len(),
        "Recommendations computed"
    );

    Ok(Json(recommendations))
}

/// A user's saved items
pub async fn get_saved(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<FoodItem>>> {
    Ok(Json(state.users.saved_items(&user_id).await?))
}

/// Saves a catalog item to a user's list
pub async fn save_item(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(key): Json<FoodKey>,
) -> AppResult<(StatusCode, Json<FoodItem>)> {
    let item = state
        .catalog
        .find(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Food item {} not in catalog", key)))?;

    if !state.users.save_item(&user_id, item.clone()).await? {
        return Err(AppError::Conflict(format!("{} is already saved", key)));
    }

    tracing::info!(
        user_id = %user_id,
        item = %key,
        store = state.users.name(),
        "Food item saved"
    );

    Ok((StatusCode::CREATED, Json(item)))
}

/// Removes an item from a user's list
pub async fn remove_saved(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(key): Query<FoodKey>,
) -> AppResult<StatusCode> {
    if !state.users.remove_item(&user_id, &key).await? {
        return Err(AppError::NotFound(format!("{} is not saved", key)));
    }

    tracing::info!(user_id = %user_id, item = %key, "Food item removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Recommendations from a user's saved list, minus what is already saved
pub async fn user_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(query): Query<TopKQuery>,
) -> AppResult<Json<Vec<FoodItem>>> {
    let k = state.limits.resolve(query.k)?;
    let saved = state.users.saved_items(&user_id).await?;
    let catalog = state.catalog.items().await?;

    let saved_keys: HashSet<FoodKey> = saved.iter().map(FoodItem::key).collect();
    let recommendations: Vec<FoodItem> = state
        .recommender
        .get_recommendations(&saved, &catalog, k)
        .into_iter()
        .filter(|item| !saved_keys.contains(&item.key()))
        .collect();

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        saved_count = saved.len(),
        returned = recommendations.len(),
        "User recommendations computed"
    );

    Ok(Json(recommendations))
}

/// Catalog items the user has not saved yet, optionally restricted to one state
pub async fn user_feed(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(filter): Query<StateFilter>,
) -> AppResult<Json<Vec<FoodItem>>> {
    let saved = state.users.saved_items(&user_id).await?;
    let catalog = state.catalog.items().await?;

    // Saved dishes are hidden by name, across restaurants
    let saved_names: HashSet<&str> = saved.iter().map(|item| item.name.as_str()).collect();
    let feed = catalog
        .iter()
        .filter(|item| in_state(item, &filter))
        .filter(|item| !saved_names.contains(item.name.as_str()))
        .cloned()
        .collect();

    Ok(Json(feed))
}

/// Forwards a conversation to the food assistant
pub async fn ask_assistant(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    let provider = state
        .chat
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("AI model not initialized".to_string()))?;

    let reply = chat::reply(provider.as_ref(), &request.messages).await?;
    Ok(Json(reply))
}
