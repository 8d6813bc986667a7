//! Post-commit hooks for loan events.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::loan::types::LoanEvent;

/// A hook failed; the committed change stands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Hook '{hook}' failed: {message}")]
pub struct HookError {
    /// Name of the failing hook.
    pub hook: &'static str,
    /// What went wrong.
    pub message: String,
}

/// Side effect run after a loan change has been committed.
pub trait PostCommitHook: Send + Sync {
    /// Hook name for logs.
    fn name(&self) -> &'static str;

    /// React to a committed event.
    fn after_commit(&self, event: &LoanEvent) -> Result<(), HookError>;
}

/// Ordered list of hooks.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn PostCommitHook>>,
}

impl HookChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook; hooks run in the order they were added.
    #[must_use]
    pub fn with(mut self, hook: Arc<dyn PostCommitHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Number of hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if there are no hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook. Failures are logged and never stop later hooks.
    pub fn dispatch(&self, event: &LoanEvent) {
        for hook in &self.hooks {
            if let Err(e) = hook.after_commit(event) {
                warn!(
                    hook = hook.name(),
                    event = event.name(),
                    loan_id = %event.loan_id(),
                    error = %e,
                    "Post-commit hook failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|hook| hook.name()))
            .finish()
    }
}

/// Records every loan event in the activity log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActivityLogHook;

impl PostCommitHook for ActivityLogHook {
    fn name(&self) -> &'static str {
        "activity_log"
    }

    fn after_commit(&self, event: &LoanEvent) -> Result<(), HookError> {
        match event {
            LoanEvent::ApprovalRecorded {
                loan_id,
                approver,
                step_order,
                status,
            } => info!(
                event = event.name(),
                loan_id = %loan_id,
                approver = %approver,
                step_order,
                status = %status,
                "Loan activity"
            ),
            LoanEvent::Disbursed {
                loan_id,
                posting_id,
                amount,
            } => info!(
                event = event.name(),
                loan_id = %loan_id,
                posting_id = %posting_id,
                amount = %amount,
                "Loan activity"
            ),
            _ => info!(event = event.name(), loan_id = %event.loan_id(), "Loan activity"),
        }
        Ok(())
    }
}
