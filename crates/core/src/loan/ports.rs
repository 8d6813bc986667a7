//! Collaborator traits for the loan lifecycle.
//!
//! These traits are implemented by the db and accounting crates.

use std::future::Future;

use kopa_shared::types::{
    AccountId, ClientId, LoanId, LoanTypeId, PageRequest, PageResponse, PostingId, UserId,
};

use crate::approval::types::ApprovalStatus;
use crate::loan::error::{LedgerError, LoanError};
use crate::loan::types::{AccountCategory, BalancedPosting, ClientRef, Loan, LoanFilter, LoanType};

/// A unit of work over loan aggregates.
///
/// Loads taken through `load_for_update` hold the loan exclusively until the
/// transaction ends. Dropping a transaction without calling `commit` discards
/// every staged change.
pub trait LoanTransaction: Send {
    /// Load a loan and lock it for the rest of the transaction.
    fn load_for_update(
        &mut self,
        id: LoanId,
    ) -> impl Future<Output = Result<Option<Loan>, LoanError>> + Send;

    /// Stage a new loan with its fees and approval chain.
    fn insert(&mut self, loan: &Loan) -> impl Future<Output = Result<(), LoanError>> + Send;

    /// Stage the full state of an existing loan.
    fn update(&mut self, loan: &Loan) -> impl Future<Output = Result<(), LoanError>> + Send;

    /// Stage removal of a loan, its fees and its approval chain.
    fn delete(&mut self, id: LoanId) -> impl Future<Output = Result<(), LoanError>> + Send;

    /// Make every staged change durable.
    fn commit(self) -> impl Future<Output = Result<(), LoanError>> + Send;
}

/// Loan persistence.
pub trait LoanRepository: Send + Sync {
    /// Transaction type handed out by `begin`.
    type Tx: LoanTransaction;

    /// Start a unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, LoanError>> + Send;

    /// Find a loan by ID.
    fn find_by_id(&self, id: LoanId) -> impl Future<Output = Result<Option<Loan>, LoanError>> + Send;

    /// List loans, newest first.
    fn list(
        &self,
        filter: LoanFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<PageResponse<Loan>, LoanError>> + Send;

    /// Loans with a pending step assigned to `approver`, whatever its position.
    fn find_with_pending_step_for(
        &self,
        approver: UserId,
    ) -> impl Future<Output = Result<Vec<Loan>, LoanError>> + Send;

    /// All loans in the given status.
    fn find_by_status(
        &self,
        status: ApprovalStatus,
    ) -> impl Future<Output = Result<Vec<Loan>, LoanError>> + Send;
}

/// Loan type storage.
pub trait LoanTypeCatalog: Send + Sync {
    /// Find a loan type by ID.
    fn find_loan_type(
        &self,
        id: LoanTypeId,
    ) -> impl Future<Output = Result<Option<LoanType>, LoanError>> + Send;

    /// List loan types by name.
    fn list_loan_types(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<PageResponse<LoanType>, LoanError>> + Send;

    /// Insert a loan type with its approvers and attributes.
    fn insert_loan_type(
        &self,
        loan_type: &LoanType,
    ) -> impl Future<Output = Result<(), LoanError>> + Send;

    /// Replace a loan type, its approvers and attributes.
    fn update_loan_type(
        &self,
        loan_type: &LoanType,
    ) -> impl Future<Output = Result<(), LoanError>> + Send;

    /// Delete a loan type. Returns false if it did not exist.
    fn delete_loan_type(&self, id: LoanTypeId)
    -> impl Future<Output = Result<bool, LoanError>> + Send;

    /// Whether any loan references the loan type.
    fn is_referenced(&self, id: LoanTypeId) -> impl Future<Output = Result<bool, LoanError>> + Send;
}

/// Read access to borrowers.
pub trait ClientDirectory: Send + Sync {
    /// Find a client by ID.
    fn find_client(
        &self,
        id: ClientId,
    ) -> impl Future<Output = Result<Option<ClientRef>, LoanError>> + Send;
}

/// The external double-entry ledger.
pub trait LedgerGateway: Send + Sync {
    /// Record a balanced two-leg entry and return its posting ID.
    ///
    /// `posting.reference` is unique per loan. Implementations pass it to
    /// the ledger as an idempotency key, so a retried call after an
    /// ambiguous failure returns the original posting. A reversed posting
    /// releases its key.
    fn post_balanced_entry(
        &self,
        posting: &BalancedPosting,
    ) -> impl Future<Output = Result<PostingId, LedgerError>> + Send;

    /// Reverse a posting made earlier.
    fn reverse_posting(
        &self,
        posting_id: PostingId,
        reason: &str,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

/// Account lookup in the chart of accounts.
pub trait AccountDirectory: Send + Sync {
    /// Find the account owned by `owner_name` in `category`, creating it if missing.
    fn get_or_create_account(
        &self,
        owner_name: &str,
        category: AccountCategory,
    ) -> impl Future<Output = Result<AccountId, LedgerError>> + Send;
}
