//! Loan endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanStatus,
        loan::{Loan, ReturnLoan},
    },
};

use super::AuthenticatedUser;

/// Status filter for loan listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LoanStatusQuery {
    pub status: Option<LoanStatus>,
}

/// Loans where the caller is borrower or item owner
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanStatusQuery),
    responses(
        (status = 200, description = "Loans ordered by due date", body = Vec<Loan>)
    )
)]
pub async fn list_my_loans(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Query(query): Query<LoanStatusQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_for_user(user.user_id(), query.status).await?;
    Ok(Json(loans))
}

/// Overdue loans of the caller; past-due loans are marked first
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue loans", body = Vec<Loan>)
    )
)]
pub async fn list_overdue(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.scheduler.list_overdue_loans(user.user_id()).await?;
    Ok(Json(loans))
}

#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get(id, user.user_id()).await?;
    Ok(Json(loan))
}

/// Close a loan (borrower or item owner)
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 400, description = "Malformed body or return date before the loan start"),
        (status = 403, description = "Not a participant"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<Loan>> {
    let data = parse_return_body(&body)?;
    let loan = state
        .services
        .scheduler
        .return_loan(id, user.user_id(), data.actual_return_date)
        .await?;
    Ok(Json(loan))
}

/// An empty body means "returned today"; anything else must be a valid `ReturnLoan`
fn parse_return_body(body: &[u8]) -> AppResult<ReturnLoan> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReturnLoan::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::invalid_input(format!("Invalid return body: {}", e)))
}

/// Borrower reports the item handed back
#[utoipa::path(
    post,
    path = "/loans/{id}/request-return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Return pending owner confirmation", body = Loan),
        (status = 403, description = "Not the borrower"),
        (status = 409, description = "Loan is not active or overdue")
    )
)]
pub async fn request_return(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.request_return(id, user.user_id()).await?;
    Ok(Json(loan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    #[test]
    fn test_return_body_parsing() {
        assert!(parse_return_body(b"").unwrap().actual_return_date.is_none());
        assert!(parse_return_body(b"  \n").unwrap().actual_return_date.is_none());
        assert!(parse_return_body(b"{}").unwrap().actual_return_date.is_none());
        assert_eq!(
            parse_return_body(br#"{"actual_return_date":"2024-06-05"}"#)
                .unwrap()
                .actual_return_date,
            NaiveDate::from_ymd_opt(2024, 6, 5)
        );

        let err = parse_return_body(br#"{"actual_return_date":"2024-13-45"}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(parse_return_body(b"not json").is_err());
    }
}
