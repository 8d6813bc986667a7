//! Loan lifecycle error types.

use thiserror::Error;

use kopa_shared::AppError;
use kopa_shared::types::{ClientId, LoanId, LoanTypeId, PostingId};

use crate::approval::error::ApprovalError;
use crate::approval::types::ApprovalStatus;
use crate::error::ErrorKind;
use crate::fees::error::FeeError;

/// Failures reported by the external accounting service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The service answered but refused the request.
    #[error("Accounting service rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status returned.
        status: u16,
        /// Error message returned.
        message: String,
    },

    /// The service could not be reached or answered garbage.
    #[error("Accounting service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during loan lifecycle operations.
#[derive(Debug, Error)]
pub enum LoanError {
    /// Fee validation or materialization failed.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// The approval state machine refused the action.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// The ledger or account lookup failed.
    #[error("Ledger failure: {0}")]
    Ledger(#[from] LedgerError),

    /// Input violates a loan-type or field rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Loan not found.
    #[error("Loan {0} not found")]
    LoanNotFound(LoanId),

    /// Loan type not found.
    #[error("Loan type {0} not found")]
    LoanTypeNotFound(LoanTypeId),

    /// Client not found.
    #[error("Client {0} not found")]
    ClientNotFound(ClientId),

    /// The loan type still has loans referencing it.
    #[error("Loan type {0} is referenced by existing loans")]
    LoanTypeInUse(LoanTypeId),

    /// The loan is disbursed and can no longer change.
    #[error("Loan {0} is disbursed and can no longer be modified")]
    LoanDisbursed(LoanId),

    /// Rebuild requested for a loan that is not pending or rejected.
    #[error("Loan {id} cannot be rebuilt while {status}")]
    NotRebuildable {
        /// The loan.
        id: LoanId,
        /// Its current status.
        status: ApprovalStatus,
    },

    /// Principal or term change requested after approval began.
    #[error("Loan {id} is {status} with recorded decisions; principal and term only change through rebuild")]
    TermsLocked {
        /// The loan.
        id: LoanId,
        /// Its current status.
        status: ApprovalStatus,
    },

    /// The disbursement was posted but could not be saved, and the
    /// compensating reversal also failed. Needs manual reconciliation.
    #[error("Posting {posting_id} for loan {loan_id} could not be saved or reversed: {reason}")]
    UnreconciledPosting {
        /// The loan.
        loan_id: LoanId,
        /// The orphaned posting.
        posting_id: PostingId,
        /// Both failures.
        reason: String,
    },

    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl LoanError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fee(e) => e.kind(),
            Self::Approval(e) => e.kind(),
            Self::Ledger(_) => ErrorKind::LedgerFailure,
            Self::Validation(_) => ErrorKind::Validation,
            Self::LoanNotFound(_) | Self::LoanTypeNotFound(_) | Self::ClientNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::LoanTypeInUse(_)
            | Self::LoanDisbursed(_)
            | Self::NotRebuildable { .. }
            | Self::TermsLocked { .. } => ErrorKind::StateConflict,
            Self::UnreconciledPosting { .. } | Self::Repository(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Fee(e) => e.error_code(),
            Self::Approval(e) => e.error_code(),
            Self::Ledger(_) => "LEDGER_FAILURE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::LoanNotFound(_) => "LOAN_NOT_FOUND",
            Self::LoanTypeNotFound(_) => "LOAN_TYPE_NOT_FOUND",
            Self::ClientNotFound(_) => "CLIENT_NOT_FOUND",
            Self::LoanTypeInUse(_) => "LOAN_TYPE_IN_USE",
            Self::LoanDisbursed(_) => "LOAN_DISBURSED",
            Self::NotRebuildable { .. } => "LOAN_NOT_REBUILDABLE",
            Self::TermsLocked { .. } => "LOAN_TERMS_LOCKED",
            Self::UnreconciledPosting { .. } => "UNRECONCILED_POSTING",
            Self::Repository(_) => "REPOSITORY_ERROR",
        }
    }

    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<LoanError> for AppError {
    fn from(err: LoanError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => AppError::Validation(message),
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::OrderingViolation => AppError::BusinessRule(message),
            ErrorKind::StateConflict => AppError::Conflict(message),
            ErrorKind::LedgerFailure => AppError::ExternalService(message),
            ErrorKind::Internal => match err {
                LoanError::Repository(_) => AppError::Database(message),
                _ => AppError::Internal(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case(LoanError::Fee(FeeError::NonPositivePrincipal(Decimal::ZERO)), 400, "NON_POSITIVE_PRINCIPAL")]
    #[case(LoanError::LoanNotFound(LoanId::new()), 404, "LOAN_NOT_FOUND")]
    #[case(LoanError::Approval(ApprovalError::OutOfOrder { step_order: 2, blocking_step: 1 }), 422, "APPROVAL_OUT_OF_ORDER")]
    #[case(LoanError::Approval(ApprovalError::AlreadyDisbursed), 409, "LOAN_ALREADY_DISBURSED")]
    #[case(LoanError::TermsLocked { id: LoanId::new(), status: ApprovalStatus::Approved }, 409, "LOAN_TERMS_LOCKED")]
    #[case(LoanError::Ledger(LedgerError::Unavailable("timeout".into())), 502, "LEDGER_FAILURE")]
    #[case(LoanError::Repository("connection reset".into()), 500, "REPOSITORY_ERROR")]
    fn test_status_and_code(
        #[case] err: LoanError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[rstest]
    #[case(LoanError::validation("too large"), 400)]
    #[case(LoanError::ClientNotFound(ClientId::new()), 404)]
    #[case(LoanError::Approval(ApprovalError::OutOfOrder { step_order: 3, blocking_step: 1 }), 422)]
    #[case(LoanError::LoanDisbursed(LoanId::new()), 409)]
    #[case(LoanError::Ledger(LedgerError::Rejected { status: 400, message: "unbalanced".into() }), 502)]
    #[case(LoanError::Repository("boom".into()), 500)]
    fn test_app_error_preserves_status(#[case] err: LoanError, #[case] status: u16) {
        let app: AppError = err.into();
        assert_eq!(app.status_code(), status);
    }
}
