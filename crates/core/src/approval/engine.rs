//! Sequential approval state machine.
//!
//! Steps are decided strictly in ascending order. A rejection at any step
//! closes the request; approving the last step makes it disbursable.

use chrono::{DateTime, Utc};

use kopa_shared::types::{ApprovalRequestId, ApprovalStepId, UserId};

use crate::approval::error::ApprovalError;
use crate::approval::types::{
    ApprovalDecision, ApprovalRequest, ApprovalStatus, ApprovalStep, StepStatus,
};

/// Result of a recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalOutcome {
    /// The step that was decided.
    pub step_order: u32,
    /// The decision recorded on it.
    pub decision: ApprovalDecision,
    /// Request status after the decision.
    pub request_status: ApprovalStatus,
}

/// Stateless service for building and advancing approval requests.
///
/// Every mutating function validates fully before touching the request, so
/// an `Err` leaves the request unchanged.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Build a request with one pending step per approver, ordered 1..=n.
    ///
    /// An empty approver list yields a request that is already approved.
    #[must_use]
    pub fn build_request(
        title: impl Into<String>,
        description: impl Into<String>,
        requested_by: UserId,
        approvers: &[UserId],
        at: DateTime<Utc>,
    ) -> ApprovalRequest {
        let id = ApprovalRequestId::new();
        let steps: Vec<ApprovalStep> = approvers
            .iter()
            .zip(1u32..)
            .map(|(approver, step_order)| ApprovalStep {
                id: ApprovalStepId::new(),
                request_id: id,
                approver: *approver,
                step_order,
                status: StepStatus::Pending,
                action_date: None,
                remarks: None,
            })
            .collect();

        let status = if steps.is_empty() {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        };

        ApprovalRequest {
            id,
            title: title.into(),
            description: description.into(),
            requested_by,
            status,
            steps,
            created_at: at,
        }
    }

    /// Record a decision on a specific step.
    ///
    /// # Errors
    ///
    /// * `RequestClosed` if the request is not pending
    /// * `StepNotFound` if no step has `step_order`
    /// * `NotStepApprover` if `approver` is not assigned to the step
    /// * `StepAlreadyActioned` if the step is already decided
    /// * `OutOfOrder` if an earlier step is not approved
    pub fn act_on_step(
        request: &mut ApprovalRequest,
        step_order: u32,
        approver: UserId,
        decision: ApprovalDecision,
        remarks: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        if request.status != ApprovalStatus::Pending {
            return Err(ApprovalError::RequestClosed {
                status: request.status,
            });
        }

        let step = request
            .step(step_order)
            .ok_or(ApprovalError::StepNotFound { step_order })?;

        if step.approver != approver {
            return Err(ApprovalError::NotStepApprover {
                step_order,
                approver,
            });
        }

        if step.status != StepStatus::Pending {
            return Err(ApprovalError::StepAlreadyActioned {
                step_order,
                status: step.status,
            });
        }

        if let Some(blocking_step) = Self::blocking_step(request, step_order) {
            return Err(ApprovalError::OutOfOrder {
                step_order,
                blocking_step,
            });
        }

        Ok(Self::apply(request, step_order, decision, remarks, at))
    }

    /// Record a decision on the approver's earliest pending step.
    ///
    /// # Errors
    ///
    /// * `RequestClosed` if the request is not pending
    /// * `ApproverNotAssigned` if the approver holds no step
    /// * `StepAlreadyActioned` if every step the approver holds is decided
    /// * `OutOfOrder` if an earlier step is not approved
    pub fn act(
        request: &mut ApprovalRequest,
        approver: UserId,
        decision: ApprovalDecision,
        remarks: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        if request.status != ApprovalStatus::Pending {
            return Err(ApprovalError::RequestClosed {
                status: request.status,
            });
        }

        let held: Vec<&ApprovalStep> = request
            .steps_in_order()
            .filter(|step| step.approver == approver)
            .collect();

        let Some(last_held) = held.last() else {
            return Err(ApprovalError::ApproverNotAssigned { approver });
        };

        let step_order = match held.iter().find(|step| step.status == StepStatus::Pending) {
            Some(step) => step.step_order,
            None => {
                return Err(ApprovalError::StepAlreadyActioned {
                    step_order: last_held.step_order,
                    status: last_held.status,
                });
            }
        };

        Self::act_on_step(request, step_order, approver, decision, remarks, at)
    }

    /// Returns the step the approver can act on right now.
    ///
    /// Only the head of the chain is actionable, so this is `Some` only when
    /// the first pending step belongs to `approver`.
    #[must_use]
    pub fn pending_step_for(request: &ApprovalRequest, approver: UserId) -> Option<&ApprovalStep> {
        request
            .head_step()
            .filter(|step| step.approver == approver)
    }

    /// True while the request is pending and no step has been decided.
    #[must_use]
    pub fn is_undecided(request: &ApprovalRequest) -> bool {
        request.status == ApprovalStatus::Pending
            && request
                .steps
                .iter()
                .all(|step| step.status == StepStatus::Pending)
    }

    /// Check that the request may be disbursed.
    ///
    /// # Errors
    ///
    /// * `AlreadyDisbursed` if the request is already disbursed
    /// * `NotApproved` for any other non-approved status
    pub fn ensure_disbursable(request: &ApprovalRequest) -> Result<(), ApprovalError> {
        match request.status {
            ApprovalStatus::Approved => Ok(()),
            ApprovalStatus::Disbursed => Err(ApprovalError::AlreadyDisbursed),
            status => Err(ApprovalError::NotApproved { status }),
        }
    }

    /// Move an approved request to disbursed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_disbursable`].
    pub fn mark_disbursed(request: &mut ApprovalRequest) -> Result<(), ApprovalError> {
        Self::ensure_disbursable(request)?;
        request.status = ApprovalStatus::Disbursed;
        Ok(())
    }

    /// Lowest earlier step that is not approved.
    fn blocking_step(request: &ApprovalRequest, step_order: u32) -> Option<u32> {
        request
            .steps
            .iter()
            .filter(|step| step.step_order < step_order && step.status != StepStatus::Approved)
            .map(|step| step.step_order)
            .min()
    }

    fn apply(
        request: &mut ApprovalRequest,
        step_order: u32,
        decision: ApprovalDecision,
        remarks: Option<String>,
        at: DateTime<Utc>,
    ) -> ApprovalOutcome {
        if let Some(step) = request
            .steps
            .iter_mut()
            .find(|step| step.step_order == step_order)
        {
            step.status = decision.step_status();
            step.action_date = Some(at);
            step.remarks = remarks;
        }

        request.status = match decision {
            ApprovalDecision::Reject => ApprovalStatus::Rejected,
            ApprovalDecision::Approve
                if request
                    .steps
                    .iter()
                    .all(|step| step.status == StepStatus::Approved) =>
            {
                ApprovalStatus::Approved
            }
            ApprovalDecision::Approve => ApprovalStatus::Pending,
        };

        ApprovalOutcome {
            step_order,
            decision,
            request_status: request.status,
        }
    }
}
