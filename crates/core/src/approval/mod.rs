//! Multi-party loan approval workflow.
//!
//! # Modules
//!
//! - `types` - Requests, steps, statuses and decisions
//! - `error` - Approval-specific error types
//! - `engine` - The sequential approval state machine

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::{ApprovalEngine, ApprovalOutcome};
pub use error::ApprovalError;
pub use types::{ApprovalDecision, ApprovalRequest, ApprovalStatus, ApprovalStep, StepStatus};
