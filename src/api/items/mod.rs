//! Item CRUD endpoints, all behind the API key gate

use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Deserializer};

use crate::api::middleware::require_api_key;
use crate::api::state::ItemState;
use crate::api::types::{ApiError, Json};
use crate::domain::{Item, ItemId, KeyValidator};
use crate::infrastructure::services::{CreateItemRequest, UpdateItemRequest, ITEM_NOT_FOUND};

/// Item routes, gated by `validator`
///
/// The gate is a route layer, so unknown paths still answer 404 without a key.
pub fn routes<S>(validator: Arc<dyn KeyValidator>) -> Router<S>
where
    ItemState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route_layer(middleware::from_fn_with_state(validator, require_api_key))
}

#[derive(Debug, Deserialize)]
pub struct CreateItemBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Absent fields are left alone; `"value": null` clears the value
#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_id(raw: &str) -> Result<ItemId, ApiError> {
    ItemId::parse(raw).ok_or_else(|| ApiError::not_found(ITEM_NOT_FOUND))
}

/// POST /items
pub async fn create_item(
    State(state): State<ItemState>,
    Json(body): Json<CreateItemBody>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state
        .item_service
        .create(CreateItemRequest {
            name: body.name.unwrap_or_default(),
            value: body.value,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items
pub async fn list_items(State(state): State<ItemState>) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.item_service.list().await?))
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<ItemState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.item_service.get(&id).await?))
}

/// PUT /items/{id}
pub async fn update_item(
    State(state): State<ItemState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&id)?;
    let item = state
        .item_service
        .update(
            &id,
            UpdateItemRequest {
                name: body.name,
                value: body.value,
            },
        )
        .await?;

    Ok(Json(item))
}

/// DELETE /items/{id}
pub async fn delete_item(
    State(state): State<ItemState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.item_service.delete(&id).await?))
}
