//! Availability window endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{
        availability::{AvailabilityCheck, CreateAvailability, ItemAvailability, UpdateAvailability},
        interval::DateRange,
    },
};

use super::AuthenticatedUser;

/// Availability check query
#[derive(Debug, Deserialize, IntoParams)]
pub struct CheckQuery {
    /// First day (YYYY-MM-DD)
    pub start_date: NaiveDate,
    /// First day after the range (YYYY-MM-DD)
    pub end_date: NaiveDate,
}

/// List the availability windows of an item
#[utoipa::path(
    get,
    path = "/items/{id}/availabilities",
    tag = "availabilities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Windows ordered by start date", body = Vec<ItemAvailability>),
        (status = 404, description = "Item not found")
    )
)]
pub async fn list_availabilities(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> AppResult<Json<Vec<ItemAvailability>>> {
    let windows = state.services.availability.list_by_item(item_id).await?;
    Ok(Json(windows))
}

/// Publish an availability window (item owner only)
#[utoipa::path(
    post,
    path = "/items/{id}/availabilities",
    tag = "availabilities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body = CreateAvailability,
    responses(
        (status = 201, description = "Window published", body = ItemAvailability),
        (status = 400, description = "Invalid or past dates"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn create_availability(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(item_id): Path<i32>,
    Json(data): Json<CreateAvailability>,
) -> AppResult<(StatusCode, Json<ItemAvailability>)> {
    let window = state
        .services
        .availability
        .create(item_id, user.user_id(), data)
        .await?;
    Ok((StatusCode::CREATED, Json(window)))
}

/// Is the item free for a date range?
#[utoipa::path(
    get,
    path = "/items/{id}/availability-check",
    tag = "availabilities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID"),
        CheckQuery
    ),
    responses(
        (status = 200, description = "Availability verdict", body = AvailabilityCheck),
        (status = 400, description = "Invalid dates"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn check_availability(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(item_id): Path<i32>,
    Query(query): Query<CheckQuery>,
) -> AppResult<Json<AvailabilityCheck>> {
    let range = DateRange::new(query.start_date, query.end_date)?;
    let check = state.services.availability.check(item_id, range).await?;
    Ok(Json(check))
}

/// Get an availability window
#[utoipa::path(
    get,
    path = "/availabilities/{id}",
    tag = "availabilities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Availability ID")
    ),
    responses(
        (status = 200, description = "Window", body = ItemAvailability),
        (status = 404, description = "Availability not found")
    )
)]
pub async fn get_availability(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ItemAvailability>> {
    let window = state.services.availability.get(id).await?;
    Ok(Json(window))
}

/// Move or re-status a window (item owner only)
#[utoipa::path(
    put,
    path = "/availabilities/{id}",
    tag = "availabilities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Availability ID")
    ),
    request_body = UpdateAvailability,
    responses(
        (status = 200, description = "Window updated", body = ItemAvailability),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Availability not found"),
        (status = 409, description = "Existing slots would fall outside")
    )
)]
pub async fn update_availability(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateAvailability>,
) -> AppResult<Json<ItemAvailability>> {
    let window = state.services.availability.update(id, user.user_id(), data).await?;
    Ok(Json(window))
}

/// Withdraw a window and its slots (item owner only)
#[utoipa::path(
    delete,
    path = "/availabilities/{id}",
    tag = "availabilities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Availability ID")
    ),
    responses(
        (status = 204, description = "Window deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Availability not found"),
        (status = 409, description = "Window backs an outstanding loan")
    )
)]
pub async fn delete_availability(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.availability.delete(id, user.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
