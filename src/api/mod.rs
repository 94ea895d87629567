//! API handlers for Lendhood REST endpoints

pub mod availabilities;
pub mod health;
pub mod items;
pub mod loan_requests;
pub mod loans;
pub mod openapi;
pub mod slots;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{AppError, ErrorCode, ErrorResponse},
    models::user::UserClaims,
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i32 {
        self.0.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            code: ErrorCode::RouteNotFound,
            error: "NotFound".to_string(),
            message: "No such route".to_string(),
        }),
    )
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:id",
            get(items::get_item).put(items::update_item).delete(items::delete_item),
        )
        .route(
            "/items/:id/availabilities",
            get(availabilities::list_availabilities).post(availabilities::create_availability),
        )
        .route("/items/:id/availability-check", get(availabilities::check_availability))
        .route("/items/:id/loan-requests", get(loan_requests::list_item_requests))
        // Availability windows
        .route(
            "/availabilities/:id",
            get(availabilities::get_availability)
                .put(availabilities::update_availability)
                .delete(availabilities::delete_availability),
        )
        .route(
            "/availabilities/:id/slots",
            get(slots::list_availability_slots).post(slots::create_slot),
        )
        .route("/availabilities/:id/slots/available", get(slots::available_slots))
        .route("/availabilities/:id/slots/conflicts", get(slots::slot_conflicts))
        // Slots
        .route("/slots", get(slots::list_slots))
        .route(
            "/slots/:id",
            get(slots::get_slot).put(slots::update_slot).delete(slots::delete_slot),
        )
        .route("/slots/:id/cancel", post(slots::cancel_slot))
        // Loan requests
        .route(
            "/loan-requests",
            get(loan_requests::list_my_requests).post(loan_requests::create_request),
        )
        .route("/loan-requests/:id", get(loan_requests::get_request))
        .route("/loan-requests/:id/slots", get(slots::list_request_slots))
        .route("/loan-requests/:id/accept", post(loan_requests::accept_request))
        .route("/loan-requests/:id/reject", post(loan_requests::reject_request))
        .route("/loan-requests/:id/cancel", post(loan_requests::cancel_request))
        // Loans
        .route("/loans", get(loans::list_my_loans))
        .route("/loans/overdue", get(loans::list_overdue))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        .route("/loans/:id/request-return", post(loans::request_return))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
