//! Loan origination, maintenance and disbursement routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use kopa_core::approval::ApprovalStatus;
use kopa_core::loan::{CreateLoanInput, Loan, LoanFilter, UpdateLoanInput};
use kopa_shared::AppError;
use kopa_shared::types::{AccountId, LoanId, PageRequest};

use crate::{
    AppState,
    error::{app_error_response, loan_error_response},
};

/// Creates the loan routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(list_loans).post(create_loan))
        .route(
            "/loans/{id}",
            get(get_loan).patch(update_loan).delete(delete_loan),
        )
        .route("/loans/{id}/rebuild", post(rebuild_loan))
        .route("/loans/{id}/disburse", post(disburse_loan))
        .route("/disbursement-queue", get(disbursement_queue))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing loans.
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    /// Approval status filter, e.g. `PENDING`.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl ListLoansQuery {
    fn filter(&self) -> Result<LoanFilter, AppError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(ApprovalStatus::parse(&raw.to_uppercase()).ok_or_else(|| {
                AppError::Validation(format!("Unknown loan status '{raw}'"))
            })?),
        };
        Ok(LoanFilter { status })
    }

    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Request body for disbursing a loan.
#[derive(Debug, Deserialize)]
pub struct DisburseRequest {
    /// The institution account the principal is paid from.
    pub paying_account: AccountId,
}

/// A loan together with its derived approval status.
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    /// Current approval status.
    pub status: ApprovalStatus,
    /// The loan aggregate.
    #[serde(flatten)]
    pub loan: Loan,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            status: loan.status(),
            loan,
        }
    }
}

/// Render a list of loans as `{"data": [...]}`.
pub(crate) fn loan_list_response(loans: Vec<Loan>) -> Response {
    let items: Vec<LoanResponse> = loans.into_iter().map(LoanResponse::from).collect();
    (StatusCode::OK, Json(json!({ "data": items }))).into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/loans` - Originate a loan.
async fn create_loan(State(state): State<AppState>, Json(payload): Json<CreateLoanInput>) -> Response {
    match state.loans.create_loan(payload).await {
        Ok(loan) => (StatusCode::CREATED, Json(LoanResponse::from(loan))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// GET `/loans` - List loans, newest first.
async fn list_loans(State(state): State<AppState>, Query(query): Query<ListLoansQuery>) -> Response {
    let filter = match query.filter() {
        Ok(filter) => filter,
        Err(e) => return app_error_response(&e),
    };

    match state.loans.list_loans(filter, query.page()).await {
        Ok(page) => (StatusCode::OK, Json(page.map(LoanResponse::from))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// GET `/loans/{id}` - Get a loan.
async fn get_loan(State(state): State<AppState>, Path(id): Path<LoanId>) -> Response {
    match state.loans.get_loan(id).await {
        Ok(loan) => (StatusCode::OK, Json(LoanResponse::from(loan))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// PATCH `/loans/{id}` - Change loan terms.
///
/// Principal and term lock once the first approval decision is recorded.
async fn update_loan(
    State(state): State<AppState>,
    Path(id): Path<LoanId>,
    Json(payload): Json<UpdateLoanInput>,
) -> Response {
    match state.loans.update_loan(id, payload).await {
        Ok(loan) => (StatusCode::OK, Json(LoanResponse::from(loan))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// DELETE `/loans/{id}` - Delete an undisbursed loan.
async fn delete_loan(State(state): State<AppState>, Path(id): Path<LoanId>) -> Response {
    match state.loans.delete_loan(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// POST `/loans/{id}/rebuild` - Re-derive fees and restart approval.
async fn rebuild_loan(State(state): State<AppState>, Path(id): Path<LoanId>) -> Response {
    match state.loans.rebuild_loan(id).await {
        Ok(loan) => (StatusCode::OK, Json(LoanResponse::from(loan))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// POST `/loans/{id}/disburse` - Disburse an approved loan.
async fn disburse_loan(
    State(state): State<AppState>,
    Path(id): Path<LoanId>,
    Json(payload): Json<DisburseRequest>,
) -> Response {
    match state.loans.disburse(id, payload.paying_account).await {
        Ok(loan) => (StatusCode::OK, Json(LoanResponse::from(loan))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// GET `/disbursement-queue` - Fully approved loans.
async fn disbursement_queue(State(state): State<AppState>) -> Response {
    match state.loans.fully_approved().await {
        Ok(loans) => loan_list_response(loans),
        Err(e) => loan_error_response(&e),
    }
}
