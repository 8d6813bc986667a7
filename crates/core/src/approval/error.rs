//! Approval workflow error types.

use thiserror::Error;

use kopa_shared::types::UserId;

use crate::approval::types::{ApprovalStatus, StepStatus};
use crate::error::ErrorKind;

/// Errors that can occur while acting on an approval request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// The request is no longer accepting decisions.
    #[error("Approval request is {status} and no longer accepts decisions")]
    RequestClosed {
        /// The current request status.
        status: ApprovalStatus,
    },

    /// No step with the given order exists on the request.
    #[error("Approval step {step_order} not found")]
    StepNotFound {
        /// The requested step order.
        step_order: u32,
    },

    /// The approver holds no step on the request.
    #[error("User {approver} is not an approver on this request")]
    ApproverNotAssigned {
        /// The acting user.
        approver: UserId,
    },

    /// The acting user is not the approver assigned to the step.
    #[error("User {approver} is not assigned to approval step {step_order}")]
    NotStepApprover {
        /// The step order.
        step_order: u32,
        /// The acting user.
        approver: UserId,
    },

    /// The step already carries a decision.
    #[error("Approval step {step_order} is already {status}")]
    StepAlreadyActioned {
        /// The step order.
        step_order: u32,
        /// The decision already recorded.
        status: StepStatus,
    },

    /// An earlier step has not been approved yet.
    #[error("Approval step {step_order} cannot be actioned before step {blocking_step} is approved")]
    OutOfOrder {
        /// The step the caller tried to act on.
        step_order: u32,
        /// The lowest earlier step that is not approved.
        blocking_step: u32,
    },

    /// Disbursement requires a fully approved request.
    #[error("Loan is not fully approved (status {status})")]
    NotApproved {
        /// The current request status.
        status: ApprovalStatus,
    },

    /// The loan has already been disbursed.
    #[error("Loan has already been disbursed")]
    AlreadyDisbursed,
}

impl ApprovalError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StepNotFound { .. }
            | Self::ApproverNotAssigned { .. }
            | Self::NotStepApprover { .. } => ErrorKind::NotFound,
            Self::OutOfOrder { .. } => ErrorKind::OrderingViolation,
            Self::RequestClosed { .. }
            | Self::StepAlreadyActioned { .. }
            | Self::NotApproved { .. }
            | Self::AlreadyDisbursed => ErrorKind::StateConflict,
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
            Self::RequestClosed { .. } => "APPROVAL_REQUEST_CLOSED",
            Self::StepNotFound { .. } => "APPROVAL_STEP_NOT_FOUND",
            Self::ApproverNotAssigned { .. } => "APPROVER_NOT_ASSIGNED",
            Self::NotStepApprover { .. } => "NOT_STEP_APPROVER",
            Self::StepAlreadyActioned { .. } => "STEP_ALREADY_ACTIONED",
            Self::OutOfOrder { .. } => "APPROVAL_OUT_OF_ORDER",
            Self::NotApproved { .. } => "LOAN_NOT_APPROVED",
            Self::AlreadyDisbursed => "LOAN_ALREADY_DISBURSED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_is_ordering_violation() {
        let err = ApprovalError::OutOfOrder {
            step_order: 3,
            blocking_step: 2,
        };
        assert_eq!(err.kind(), ErrorKind::OrderingViolation);
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "APPROVAL_OUT_OF_ORDER");
        assert!(err.to_string().contains("step 2"));
    }

    #[test]
    fn test_state_conflicts() {
        assert_eq!(
            ApprovalError::AlreadyDisbursed.kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            ApprovalError::RequestClosed {
                status: ApprovalStatus::Rejected
            }
            .status_code(),
            409
        );
    }

    #[test]
    fn test_unknown_approver_is_not_found() {
        let err = ApprovalError::ApproverNotAssigned {
            approver: UserId::new(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
    }
}
