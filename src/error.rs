//! Error types for Lendhood server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable error codes returned to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    ItemNotFound,
    Forbidden,
    CannotBorrowOwnItem,
    NotMemberOfNeighborhood,
    InvalidDates,
    PastDate,
    InvalidInput,
    ItemNotAvailable,
    ItemNoLongerAvailable,
    SlotOverlap,
    SlotOutsideAvailability,
    RequestNotPending,
    CannotCancelNonPending,
    LoanNotActive,
    SlotOccupied,
    SlotNotReserved,
    Unauthenticated,
    RouteNotFound,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::ItemNotFound => "item_not_found",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::CannotBorrowOwnItem => "cannot_borrow_own_item",
            ErrorCode::NotMemberOfNeighborhood => "not_member_of_neighborhood",
            ErrorCode::InvalidDates => "invalid_dates",
            ErrorCode::PastDate => "past_date",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::ItemNotAvailable => "item_not_available",
            ErrorCode::ItemNoLongerAvailable => "item_no_longer_available",
            ErrorCode::SlotOverlap => "slot_overlap",
            ErrorCode::SlotOutsideAvailability => "slot_outside_availability",
            ErrorCode::RequestNotPending => "request_not_pending",
            ErrorCode::CannotCancelNonPending => "cannot_cancel_non_pending",
            ErrorCode::LoanNotActive => "loan_not_active",
            ErrorCode::SlotOccupied => "slot_occupied",
            ErrorCode::SlotNotReserved => "slot_not_reserved",
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::RouteNotFound => "route_not_found",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main application error type.
///
/// Every domain variant carries an [`ErrorCode`] and a human message. Only
/// `Database` and `Internal` are system faults; their details are logged and
/// never sent to the client.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found ({0}): {1}")]
    NotFound(ErrorCode, String),

    #[error("Forbidden ({0}): {1}")]
    Forbidden(ErrorCode, String),

    #[error("Invalid input ({0}): {1}")]
    InvalidInput(ErrorCode, String),

    #[error("Conflict ({0}): {1}")]
    Conflict(ErrorCode, String),

    #[error("Invalid transition ({0}): {1}")]
    InvalidTransition(ErrorCode, String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: i32) -> Self {
        AppError::NotFound(ErrorCode::NotFound, format!("{} with id {} not found", entity, id))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(ErrorCode::Forbidden, message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(ErrorCode::InvalidInput, message.into())
    }

    /// Machine-readable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) => ErrorCode::Unauthenticated,
            AppError::NotFound(code, _)
            | AppError::Forbidden(code, _)
            | AppError::InvalidInput(code, _)
            | AppError::Conflict(code, _)
            | AppError::InvalidTransition(code, _) => *code,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "Unauthenticated",
            AppError::NotFound(..) => "NotFound",
            AppError::Forbidden(..) => "Forbidden",
            AppError::InvalidInput(..) => "InvalidInput",
            AppError::Conflict(..) => "Conflict",
            AppError::InvalidTransition(..) => "InvalidTransition",
            AppError::Database(_) | AppError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Forbidden(..) => StatusCode::FORBIDDEN,
            AppError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            AppError::Conflict(..) | AppError::InvalidTransition(..) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::invalid_input(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Authentication(msg) => msg.clone(),
            AppError::NotFound(_, msg)
            | AppError::Forbidden(_, msg)
            | AppError::InvalidInput(_, msg)
            | AppError::Conflict(_, msg)
            | AppError::InvalidTransition(_, msg) => msg.clone(),
        };

        let body = Json(ErrorResponse {
            code: self.code(),
            error: self.kind().to_string(),
            message,
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_http_status() {
        let err = AppError::Conflict(ErrorCode::ItemNotAvailable, "taken".to_string());
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), ErrorCode::ItemNotAvailable);

        let err = AppError::InvalidTransition(ErrorCode::RequestNotPending, "done".to_string());
        assert_eq!(err.status(), StatusCode::CONFLICT);

        assert_eq!(AppError::forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("Loan", 3).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Internal("boom".to_string()).code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_error_code_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCode::ItemNoLongerAvailable).unwrap();
        assert_eq!(json, "\"item_no_longer_available\"");
        assert_eq!(ErrorCode::CannotBorrowOwnItem.as_str(), "cannot_borrow_own_item");
    }
}
