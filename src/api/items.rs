//! Item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::item::{CreateItem, Item, ItemQuery, UpdateItem},
};

use super::AuthenticatedUser;

/// List items
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    params(ItemQuery),
    responses(
        (status = 200, description = "Items matching the filter", body = Vec<Item>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.items.list(&query).await?;
    Ok(Json(items))
}

/// Get item details by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item details", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Item>> {
    let item = state.services.items.get(id).await?;
    Ok(Json(item))
}

/// Register a new item owned by the caller
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not a member of the neighborhood")
    )
)]
pub async fn create_item(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(data): Json<CreateItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let created = state.services.items.create(user.user_id(), data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an item (owner only)
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateItem>,
) -> AppResult<Json<Item>> {
    let updated = state.services.items.update(id, user.user_id(), data).await?;
    Ok(Json(updated))
}

/// Delete an item with its windows, slots, requests and loans (owner only)
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn delete_item(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.items.delete(id, user.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
