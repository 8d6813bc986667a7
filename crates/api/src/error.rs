//! Error responses.
//!
//! Every error is rendered as `{"error": CODE, "message": text}` with the
//! status code of its kind.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use kopa_core::loan::LoanError;
use kopa_shared::AppError;

/// Build an error response.
pub fn error_response(status: u16, code: &str, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

/// Render a loan error, keeping its specific error code.
pub fn loan_error_response(e: &LoanError) -> Response {
    let status = e.status_code();
    if status >= 500 {
        error!(error = %e, code = e.error_code(), "Loan operation failed");
    } else {
        warn!(error = %e, code = e.error_code(), "Loan operation refused");
    }
    error_response(status, e.error_code(), &e.to_string())
}

/// Render an application error.
pub fn app_error_response(e: &AppError) -> Response {
    error_response(e.status_code(), e.error_code(), &e.to_string())
}
