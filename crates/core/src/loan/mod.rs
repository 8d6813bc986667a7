//! Loan lifecycle: origination, approval, disbursement and maintenance.
//!
//! # Modules
//!
//! - `types` - Loan aggregate, loan types, inputs and events
//! - `error` - Loan and ledger error types
//! - `ports` - Repository and external-service traits
//! - `service` - The loan lifecycle controller
//! - `catalog` - Loan type management
//! - `locks` - Per-loan serialization
//! - `hooks` - Post-commit hooks

pub mod catalog;
pub mod error;
pub mod hooks;
pub mod locks;
pub mod ports;
pub mod service;
pub mod types;

#[cfg(test)]
mod memory;

pub use catalog::{LoanTypeService, validate_loan_type};
pub use error::{LedgerError, LoanError};
pub use hooks::{ActivityLogHook, HookChain, HookError, PostCommitHook};
pub use locks::{LoanGuard, LoanLocks};
pub use ports::{
    AccountDirectory, ClientDirectory, LedgerGateway, LoanRepository, LoanTransaction,
    LoanTypeCatalog,
};
pub use service::LoanService;
pub use types::{
    AccountCategory, ApprovalAction, BalancedPosting, ClientRef, CreateLoanInput, Disbursement,
    Loan, LoanClassification, LoanEvent, LoanFilter, LoanTerm, LoanType, LoanTypeInput,
    RepaymentFrequency, TermUnit, UpdateLoanInput,
};
