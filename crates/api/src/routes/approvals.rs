//! Approval routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use kopa_core::loan::ApprovalAction;
use kopa_shared::types::{LoanId, UserId};

use super::loans::{LoanResponse, loan_list_response};
use crate::{AppState, error::loan_error_response};

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans/{id}/approvals", post(record_approval))
        .route("/approvers/{approver_id}/pending-loans", get(pending_loans))
}

/// POST `/loans/{id}/approvals` - Approve or reject the approver's step.
///
/// Body: `{"approver": uuid, "decision": "APPROVE" | "REJECT", "remarks": ..., "step_order": n}`.
/// Without `step_order` the approver's earliest pending step is used.
async fn record_approval(
    State(state): State<AppState>,
    Path(id): Path<LoanId>,
    Json(payload): Json<ApprovalAction>,
) -> Response {
    match state.loans.record_approval_action(id, payload).await {
        Ok(loan) => (StatusCode::OK, Json(LoanResponse::from(loan))).into_response(),
        Err(e) => loan_error_response(&e),
    }
}

/// GET `/approvers/{approver_id}/pending-loans` - Loans waiting on this approver.
async fn pending_loans(State(state): State<AppState>, Path(approver_id): Path<UserId>) -> Response {
    match state.loans.pending_for_approver(approver_id).await {
        Ok(loans) => loan_list_response(loans),
        Err(e) => loan_error_response(&e),
    }
}
