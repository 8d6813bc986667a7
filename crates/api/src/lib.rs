//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Error rendering for the loan error taxonomy
//! - Request and response types

pub mod error;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use kopa_accounting::AccountingClient;
use kopa_core::loan::{HookChain, LoanService, LoanTypeService};
use kopa_db::{ClientRepository, LoanRepository, LoanTypeRepository};

/// The loan service wired to Postgres and the accounting service.
pub type Loans = LoanService<LoanRepository, LoanTypeRepository, ClientRepository, AccountingClient>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loan lifecycle controller.
    pub loans: Loans,
    /// Loan type management.
    pub loan_types: LoanTypeService<LoanTypeRepository>,
}

impl AppState {
    /// Wire the services over a database pool and an accounting client.
    #[must_use]
    pub fn new(db: DatabaseConnection, accounting: AccountingClient, hooks: HookChain) -> Self {
        let catalog = Arc::new(LoanTypeRepository::new(db.clone()));
        let loans = LoanService::new(
            Arc::new(LoanRepository::new(db.clone())),
            Arc::clone(&catalog),
            Arc::new(ClientRepository::new(db)),
            Arc::new(accounting),
        )
        .with_hooks(hooks);

        Self {
            loans,
            loan_types: LoanTypeService::new(catalog),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
