//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{availabilities, health, items, loan_requests, loans, slots};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lendhood API",
        version = "0.3.0",
        description = "Neighborhood item lending: availability windows, slots, loan requests and loans"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        // Availability windows
        availabilities::list_availabilities,
        availabilities::create_availability,
        availabilities::check_availability,
        availabilities::get_availability,
        availabilities::update_availability,
        availabilities::delete_availability,
        // Slots
        slots::list_availability_slots,
        slots::create_slot,
        slots::available_slots,
        slots::slot_conflicts,
        slots::list_slots,
        slots::get_slot,
        slots::update_slot,
        slots::delete_slot,
        slots::cancel_slot,
        slots::list_request_slots,
        // Loan requests
        loan_requests::create_request,
        loan_requests::list_my_requests,
        loan_requests::list_item_requests,
        loan_requests::get_request,
        loan_requests::accept_request,
        loan_requests::reject_request,
        loan_requests::cancel_request,
        // Loans
        loans::list_my_loans,
        loans::list_overdue,
        loans::get_loan,
        loans::return_loan,
        loans::request_return,
    ),
    components(
        schemas(
            // Items
            crate::models::item::Item,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItem,
            // Availability
            crate::models::availability::ItemAvailability,
            crate::models::availability::CreateAvailability,
            crate::models::availability::UpdateAvailability,
            crate::models::availability::AvailabilityCheck,
            crate::models::enums::AvailabilityStatus,
            // Slots
            crate::models::slot::ItemAvailabilitySlot,
            crate::models::slot::CreateSlot,
            crate::models::slot::UpdateSlot,
            crate::models::enums::SlotStatus,
            // Loan requests
            crate::models::loan_request::LoanRequest,
            crate::models::loan_request::CreateLoanRequest,
            crate::models::enums::LoanRequestStatus,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::ReturnLoan,
            crate::models::enums::LoanStatus,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorCode,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "items", description = "Lendable items"),
        (name = "availabilities", description = "Availability windows"),
        (name = "slots", description = "Slots inside availability windows"),
        (name = "loan-requests", description = "Borrow requests and owner decisions"),
        (name = "loans", description = "Loans, returns and overdue tracking")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
