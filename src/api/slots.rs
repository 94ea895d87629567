//! Slot endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        availability::RangeQuery,
        slot::{CreateSlot, ItemAvailabilitySlot, SlotConflictQuery, SlotFilter, UpdateSlot},
    },
};

use super::AuthenticatedUser;

/// List the slots of a window
#[utoipa::path(
    get,
    path = "/availabilities/{id}/slots",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Availability ID")
    ),
    responses(
        (status = 200, description = "Slots ordered by start date", body = Vec<ItemAvailabilitySlot>),
        (status = 404, description = "Availability not found")
    )
)]
pub async fn list_availability_slots(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(availability_id): Path<i32>,
) -> AppResult<Json<Vec<ItemAvailabilitySlot>>> {
    let slots = state.services.slots.list_by_availability(availability_id).await?;
    Ok(Json(slots))
}

/// Create a slot in a window (item owner only)
#[utoipa::path(
    post,
    path = "/availabilities/{id}/slots",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Availability ID")
    ),
    request_body = CreateSlot,
    responses(
        (status = 201, description = "Slot created", body = ItemAvailabilitySlot),
        (status = 400, description = "Invalid dates"),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Overlapping slot or outside the window")
    )
)]
pub async fn create_slot(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(availability_id): Path<i32>,
    Json(data): Json<CreateSlot>,
) -> AppResult<(StatusCode, Json<ItemAvailabilitySlot>)> {
    let slot = state
        .services
        .slots
        .create(availability_id, user.user_id(), data)
        .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// AVAILABLE slots of a window, optionally overlapping a range
#[utoipa::path(
    get,
    path = "/availabilities/{id}/slots/available",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Availability ID"),
        RangeQuery
    ),
    responses(
        (status = 200, description = "Available slots", body = Vec<ItemAvailabilitySlot>),
        (status = 400, description = "Only one range bound given"),
        (status = 404, description = "Availability not found")
    )
)]
pub async fn available_slots(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(availability_id): Path<i32>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<ItemAvailabilitySlot>>> {
    let slots = state
        .services
        .scheduler
        .get_available_slots(availability_id, query.start_date, query.end_date)
        .await?;
    Ok(Json(slots))
}

/// Slots of a window that overlap a candidate range
#[utoipa::path(
    get,
    path = "/availabilities/{id}/slots/conflicts",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Availability ID"),
        SlotConflictQuery
    ),
    responses(
        (status = 200, description = "Conflicting slots (empty when free)", body = Vec<ItemAvailabilitySlot>),
        (status = 400, description = "Invalid dates"),
        (status = 404, description = "Availability not found")
    )
)]
pub async fn slot_conflicts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(availability_id): Path<i32>,
    Query(query): Query<SlotConflictQuery>,
) -> AppResult<Json<Vec<ItemAvailabilitySlot>>> {
    let slots = state
        .services
        .scheduler
        .check_slot_conflicts(availability_id, query.start_date, query.end_date, query.exclude_slot_id)
        .await?;
    Ok(Json(slots))
}

/// Slots by filter set
#[utoipa::path(
    get,
    path = "/slots",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(SlotFilter),
    responses(
        (status = 200, description = "Matching slots", body = Vec<ItemAvailabilitySlot>)
    )
)]
pub async fn list_slots(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(filter): Query<SlotFilter>,
) -> AppResult<Json<Vec<ItemAvailabilitySlot>>> {
    let slots = state.services.slots.list(&filter).await?;
    Ok(Json(slots))
}

#[utoipa::path(
    get,
    path = "/slots/{id}",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Slot ID")
    ),
    responses(
        (status = 200, description = "Slot", body = ItemAvailabilitySlot),
        (status = 404, description = "Slot not found")
    )
)]
pub async fn get_slot(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ItemAvailabilitySlot>> {
    let slot = state.services.slots.get(id).await?;
    Ok(Json(slot))
}

/// Edit a slot (item owner only; occupied slots are locked)
#[utoipa::path(
    put,
    path = "/slots/{id}",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Slot ID")
    ),
    request_body = UpdateSlot,
    responses(
        (status = 200, description = "Slot updated", body = ItemAvailabilitySlot),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Occupied, overlapping or outside the window")
    )
)]
pub async fn update_slot(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateSlot>,
) -> AppResult<Json<ItemAvailabilitySlot>> {
    let slot = state.services.slots.update(id, user.user_id(), data).await?;
    Ok(Json(slot))
}

#[utoipa::path(
    delete,
    path = "/slots/{id}",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Slot ID")
    ),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Slot is occupied")
    )
)]
pub async fn delete_slot(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.slots.delete(id, user.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Release a reserved slot
#[utoipa::path(
    post,
    path = "/slots/{id}/cancel",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Slot ID")
    ),
    responses(
        (status = 200, description = "Slot released", body = ItemAvailabilitySlot),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Slot is not reserved")
    )
)]
pub async fn cancel_slot(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ItemAvailabilitySlot>> {
    let slot = state.services.slots.cancel(id, user.user_id()).await?;
    Ok(Json(slot))
}

/// Slots produced by a loan request (borrower or owner)
#[utoipa::path(
    get,
    path = "/loan-requests/{id}/slots",
    tag = "slots",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    responses(
        (status = 200, description = "Slots linked to the request", body = Vec<ItemAvailabilitySlot>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Loan request not found")
    )
)]
pub async fn list_request_slots(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(request_id): Path<i32>,
) -> AppResult<Json<Vec<ItemAvailabilitySlot>>> {
    let slots = state
        .services
        .slots
        .list_by_loan_request(request_id, user.user_id())
        .await?;
    Ok(Json(slots))
}
