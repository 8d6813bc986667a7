//! Loan type management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use kopa_core::loan::LoanTypeInput;
use kopa_shared::types::{LoanTypeId, PageRequest};

use crate::{AppState, error::loan_error_response};

/// Creates the loan type routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loan-types", get(list_loan_types).post(create_loan_type))
        .route(
            "/loan-types/{id}",
            get(get_loan_type)
                .put(update_loan_type)
                .delete(delete_loan_type),
        )
        .route("/loan-types/{id}/attributes", get(list_attributes))
}

/// POST `/loan-types` - Create a loan type.
async fn create_loan_type(
    State(state): State<AppState>,
    Json(payload): Json<LoanTypeInput>,
) -> Response {
    match state.loan_types.create(payload).await {
        Ok(loan_type) => (StatusCode::CREATED, Json(loan_type)).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// GET `/loan-types` - List loan types.
async fn list_loan_types(State(state): State<AppState>, Query(page): Query<PageRequest>) -> Response {
    match state.loan_types.list(page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// GET `/loan-types/{id}` - Get a loan type.
async fn get_loan_type(State(state): State<AppState>, Path(id): Path<LoanTypeId>) -> Response {
    match state.loan_types.get(id).await {
        Ok(loan_type) => (StatusCode::OK, Json(loan_type)).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// PUT `/loan-types/{id}` - Replace a loan type.
async fn update_loan_type(
    State(state): State<AppState>,
    Path(id): Path<LoanTypeId>,
    Json(payload): Json<LoanTypeInput>,
) -> Response {
    match state.loan_types.update(id, payload).await {
        Ok(loan_type) => (StatusCode::OK, Json(loan_type)).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// DELETE `/loan-types/{id}` - Delete an unused loan type.
async fn delete_loan_type(State(state): State<AppState>, Path(id): Path<LoanTypeId>) -> Response {
    match state.loan_types.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// GET `/loan-types/{id}/attributes` - The loan type's fee templates.
async fn list_attributes(State(state): State<AppState>, Path(id): Path<LoanTypeId>) -> Response {
    match state.loan_types.attributes(id).await {
        Ok(attributes) => (StatusCode::OK, Json(json!({ "data": attributes }))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}
