//! Approval workflow domain types.
//!
//! An approval request is an ordered chain of steps, one per approver.
//! Request status is driven by the steps, except for the final
//! disbursement transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use kopa_shared::types::{ApprovalRequestId, ApprovalStepId, UserId};

/// Status of an approval request.
///
/// The valid transitions are:
/// - Pending → Approved (last step approved)
/// - Pending → Rejected (any step rejected)
/// - Approved → Disbursed (loan disbursed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Waiting on at least one approver.
    Pending,
    /// Every step approved; ready for disbursement.
    Approved,
    /// Rejected at some step (terminal).
    Rejected,
    /// Disbursed and posted to the ledger (terminal).
    Disbursed,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Disbursed => "DISBURSED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "DISBURSED" => Some(Self::Disbursed),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Disbursed)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Not acted on yet.
    Pending,
    /// Approved by the step's approver.
    Approved,
    /// Rejected by the step's approver.
    Rejected,
}

impl StepStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An approver's decision on their step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    /// Approve and pass to the next step.
    Approve,
    /// Reject the whole request.
    Reject,
}

impl ApprovalDecision {
    /// The step status this decision produces.
    #[must_use]
    pub fn step_status(self) -> StepStatus {
        match self {
            Self::Approve => StepStatus::Approved,
            Self::Reject => StepStatus::Rejected,
        }
    }
}

/// One approver's slot in an ordered review chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Step identifier.
    pub id: ApprovalStepId,
    /// The owning request.
    pub request_id: ApprovalRequestId,
    /// The user who must act on this step.
    pub approver: UserId,
    /// 1-based position in the chain; unique within the request.
    pub step_order: u32,
    /// Current status.
    pub status: StepStatus,
    /// When the approver acted.
    pub action_date: Option<DateTime<Utc>>,
    /// Optional notes from the approver.
    pub remarks: Option<String>,
}

/// An ordered approval chain attached 1:1 to a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Request identifier.
    pub id: ApprovalRequestId,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// The user who originated the request.
    pub requested_by: UserId,
    /// Overall status.
    pub status: ApprovalStatus,
    /// Steps in ascending `step_order`.
    pub steps: Vec<ApprovalStep>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Returns the step that is currently actionable, if any.
    ///
    /// That is the first pending step in ascending order, and only while the
    /// request itself is still pending.
    #[must_use]
    pub fn head_step(&self) -> Option<&ApprovalStep> {
        if self.status != ApprovalStatus::Pending {
            return None;
        }
        self.steps_in_order()
            .find(|step| step.status == StepStatus::Pending)
    }

    /// Returns the step with the given order.
    #[must_use]
    pub fn step(&self, step_order: u32) -> Option<&ApprovalStep> {
        self.steps.iter().find(|step| step.step_order == step_order)
    }

    /// Iterates steps in ascending `step_order`.
    pub fn steps_in_order(&self) -> impl Iterator<Item = &ApprovalStep> {
        let mut steps: Vec<&ApprovalStep> = self.steps.iter().collect();
        steps.sort_by_key(|step| step.step_order);
        steps.into_iter()
    }

    /// Number of approved steps.
    #[must_use]
    pub fn approved_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.status == StepStatus::Approved)
            .count()
    }
}
