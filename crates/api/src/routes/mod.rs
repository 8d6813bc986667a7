//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod approvals;
pub mod health;
pub mod loan_types;
pub mod loans;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(loan_types::routes())
        .merge(loans::routes())
        .merge(approvals::routes())
}
