//! Loan request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{
        enums::LoanRequestStatus,
        loan::Loan,
        loan_request::{CreateLoanRequest, LoanRequest},
    },
};

use super::AuthenticatedUser;

/// Status filter for request listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RequestStatusQuery {
    pub status: Option<LoanRequestStatus>,
}

/// Ask to borrow an item
#[utoipa::path(
    post,
    path = "/loan-requests",
    tag = "loan-requests",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Request created", body = LoanRequest),
        (status = 400, description = "Invalid or past dates"),
        (status = 403, description = "Own item or not a neighborhood member"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item not available for these dates")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(data): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanRequest>)> {
    let request = state
        .services
        .scheduler
        .create_loan_request(data.item_id, user.user_id(), data.start_date, data.end_date, data.message)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Requests sent by the caller
#[utoipa::path(
    get,
    path = "/loan-requests",
    tag = "loan-requests",
    security(("bearer_auth" = [])),
    params(RequestStatusQuery),
    responses(
        (status = 200, description = "Outgoing requests, newest first", body = Vec<LoanRequest>)
    )
)]
pub async fn list_my_requests(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Query(query): Query<RequestStatusQuery>,
) -> AppResult<Json<Vec<LoanRequest>>> {
    let requests = state
        .services
        .loan_requests
        .list_for_borrower(user.user_id(), query.status)
        .await?;
    Ok(Json(requests))
}

/// Requests received for one of the caller's items
#[utoipa::path(
    get,
    path = "/items/{id}/loan-requests",
    tag = "loan-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID"),
        RequestStatusQuery
    ),
    responses(
        (status = 200, description = "Incoming requests, newest first", body = Vec<LoanRequest>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn list_item_requests(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(item_id): Path<i32>,
    Query(query): Query<RequestStatusQuery>,
) -> AppResult<Json<Vec<LoanRequest>>> {
    let requests = state
        .services
        .loan_requests
        .list_for_item(item_id, user.user_id(), query.status)
        .await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/loan-requests/{id}",
    tag = "loan-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    responses(
        (status = 200, description = "Request", body = LoanRequest),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Loan request not found")
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanRequest>> {
    let request = state.services.loan_requests.get(id, user.user_id()).await?;
    Ok(Json(request))
}

/// Accept a pending request and open the loan (item owner only)
#[utoipa::path(
    post,
    path = "/loan-requests/{id}/accept",
    tag = "loan-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    responses(
        (status = 201, description = "Loan opened", body = Loan),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Loan request not found"),
        (status = 409, description = "Not pending, or dates taken meanwhile")
    )
)]
pub async fn accept_request(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state
        .services
        .scheduler
        .accept_loan_request(id, user.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Reject a pending request (item owner only)
#[utoipa::path(
    post,
    path = "/loan-requests/{id}/reject",
    tag = "loan-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    responses(
        (status = 200, description = "Request rejected", body = LoanRequest),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Not pending")
    )
)]
pub async fn reject_request(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanRequest>> {
    let request = state
        .services
        .scheduler
        .reject_loan_request(id, user.user_id())
        .await?;
    Ok(Json(request))
}

/// Withdraw a pending request (borrower only)
#[utoipa::path(
    post,
    path = "/loan-requests/{id}/cancel",
    tag = "loan-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = LoanRequest),
        (status = 403, description = "Not the borrower"),
        (status = 409, description = "Not pending")
    )
)]
pub async fn cancel_request(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanRequest>> {
    let request = state
        .services
        .scheduler
        .cancel_loan_request(id, user.user_id())
        .await?;
    Ok(Json(request))
}
