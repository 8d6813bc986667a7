//! Loan lifecycle controller.
//!
//! Orchestrates origination, approval, updates and disbursement. Every write
//! to an existing loan runs under the per-loan lock and inside one repository
//! transaction; hooks run only after the transaction commits.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use kopa_shared::types::{AccountId, ClientId, LoanId, PageRequest, PageResponse, PostingId, UserId};

use crate::approval::engine::ApprovalEngine;
use crate::approval::types::{ApprovalRequest, ApprovalStatus};
use crate::fees::error::FeeError;
use crate::fees::materializer::{AMOUNT_DECIMAL_PLACES, FeeMaterializer, is_storable_amount};
use crate::loan::error::LoanError;
use crate::loan::hooks::HookChain;
use crate::loan::locks::LoanLocks;
use crate::loan::ports::{
    AccountDirectory, ClientDirectory, LedgerGateway, LoanRepository, LoanTransaction,
    LoanTypeCatalog,
};
use crate::loan::types::{
    AccountCategory, ApprovalAction, BalancedPosting, ClientRef, CreateLoanInput, Disbursement,
    Loan, LoanClassification, LoanEvent, LoanFilter, LoanTerm, LoanType, UpdateLoanInput,
};

const INTEREST_RATE_LIMIT: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Loan lifecycle service.
///
/// `L` is the accounting service, which provides both ledger posting and
/// account lookup.
pub struct LoanService<R, C, D, L> {
    repo: Arc<R>,
    catalog: Arc<C>,
    clients: Arc<D>,
    ledger: Arc<L>,
    locks: Arc<LoanLocks>,
    hooks: HookChain,
}

impl<R, C, D, L> Clone for LoanService<R, C, D, L> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            catalog: Arc::clone(&self.catalog),
            clients: Arc::clone(&self.clients),
            ledger: Arc::clone(&self.ledger),
            locks: Arc::clone(&self.locks),
            hooks: self.hooks.clone(),
        }
    }
}

impl<R, C, D, L> LoanService<R, C, D, L>
where
    R: LoanRepository,
    C: LoanTypeCatalog,
    D: ClientDirectory,
    L: LedgerGateway + AccountDirectory,
{
    /// Create a new loan service with no hooks.
    #[must_use]
    pub fn new(repo: Arc<R>, catalog: Arc<C>, clients: Arc<D>, ledger: Arc<L>) -> Self {
        Self {
            repo,
            catalog,
            clients,
            ledger,
            locks: Arc::new(LoanLocks::new()),
            hooks: HookChain::new(),
        }
    }

    /// Replace the post-commit hook chain.
    #[must_use]
    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    /// Share a lock registry with other service instances.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<LoanLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Originate a loan: validate against its type, materialize fees, build
    /// the approval chain and persist everything in one transaction.
    pub async fn create_loan(&self, input: CreateLoanInput) -> Result<Loan, LoanError> {
        let loan_type = self
            .catalog
            .find_loan_type(input.loan_type_id)
            .await?
            .ok_or(LoanError::LoanTypeNotFound(input.loan_type_id))?;
        let client = self.find_client(input.client_id).await?;

        check_against_type(&loan_type, input.principal, &input.term)?;
        if loan_type.classification == LoanClassification::Product
            && input.selected_product_id.is_none()
        {
            return Err(LoanError::validation(
                "Product loans require a selected product",
            ));
        }
        check_dates(input.start_date, input.end_date)?;
        check_interest_rate(input.interest_rate)?;

        let fees = FeeMaterializer::materialize(&loan_type.attributes, input.principal)?;
        let now = Utc::now();
        let approval = approval_request_for(&loan_type, &client, input.principal, input.requested_by);

        let loan = Loan {
            id: LoanId::new(),
            loan_type_id: loan_type.id,
            client_id: client.id,
            principal: input.principal,
            interest_rate: input.interest_rate,
            term: input.term,
            repayment_frequency: input.repayment_frequency,
            purpose: input.purpose,
            creation_date: now.date_naive(),
            start_date: input.start_date,
            end_date: input.end_date,
            repayment_account: input.repayment_account,
            selected_product_id: input.selected_product_id,
            total_payable: FeeMaterializer::total_payable(input.principal, &fees)?,
            fees,
            approval,
            disbursement: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.repo.begin().await?;
        tx.insert(&loan).await?;
        tx.commit().await?;

        info!(
            loan_id = %loan.id,
            loan_type_id = %loan.loan_type_id,
            principal = %loan.principal,
            fees = loan.fees.len(),
            status = %loan.status(),
            "Loan created"
        );
        self.hooks.dispatch(&LoanEvent::Created {
            loan_id: loan.id,
            status: loan.status(),
        });

        Ok(loan)
    }

    /// Get a loan by ID.
    pub async fn get_loan(&self, id: LoanId) -> Result<Loan, LoanError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(LoanError::LoanNotFound(id))
    }

    /// List loans, optionally filtered by status.
    pub async fn list_loans(
        &self,
        filter: LoanFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Loan>, LoanError> {
        self.repo.list(filter, page.normalized()).await
    }

    /// Loans whose currently actionable step belongs to `approver`.
    pub async fn pending_for_approver(&self, approver: UserId) -> Result<Vec<Loan>, LoanError> {
        let candidates = self.repo.find_with_pending_step_for(approver).await?;
        Ok(candidates
            .into_iter()
            .filter(|loan| ApprovalEngine::pending_step_for(&loan.approval, approver).is_some())
            .collect())
    }

    /// Loans approved and waiting for disbursement.
    pub async fn fully_approved(&self) -> Result<Vec<Loan>, LoanError> {
        self.repo.find_by_status(ApprovalStatus::Approved).await
    }

    /// Record an approver's decision on a loan.
    pub async fn record_approval_action(
        &self,
        id: LoanId,
        action: ApprovalAction,
    ) -> Result<Loan, LoanError> {
        let _guard = self.locks.acquire(id).await;
        let mut tx = self.repo.begin().await?;
        let mut loan = load_locked(&mut tx, id).await?;

        let now = Utc::now();
        let outcome = match action.step_order {
            Some(step_order) => ApprovalEngine::act_on_step(
                &mut loan.approval,
                step_order,
                action.approver,
                action.decision,
                action.remarks,
                now,
            ),
            None => ApprovalEngine::act(
                &mut loan.approval,
                action.approver,
                action.decision,
                action.remarks,
                now,
            ),
        }
        .inspect_err(|e| {
            debug!(loan_id = %id, approver = %action.approver, error = %e, "Approval action refused");
        })?;
        loan.updated_at = now;

        tx.update(&loan).await?;
        tx.commit().await?;

        info!(
            loan_id = %id,
            approver = %action.approver,
            step_order = outcome.step_order,
            decision = ?outcome.decision,
            status = %outcome.request_status,
            "Approval recorded"
        );
        self.hooks.dispatch(&LoanEvent::ApprovalRecorded {
            loan_id: id,
            approver: action.approver,
            step_order: outcome.step_order,
            status: outcome.request_status,
        });

        Ok(loan)
    }

    /// Disburse an approved loan from `paying_account`.
    ///
    /// Posts exactly one balanced entry to the ledger, then marks the loan
    /// DISBURSED. A ledger failure leaves the loan untouched. If the posting
    /// succeeds but the loan cannot be saved, the posting is reversed before
    /// the error is returned.
    pub async fn disburse(&self, id: LoanId, paying_account: AccountId) -> Result<Loan, LoanError> {
        let _guard = self.locks.acquire(id).await;
        let mut tx = self.repo.begin().await?;
        let mut loan = load_locked(&mut tx, id).await?;

        ApprovalEngine::ensure_disbursable(&loan.approval)?;

        let client = self.find_client(loan.client_id).await?;
        let receivable = self
            .ledger
            .get_or_create_account(&client.full_name, AccountCategory::Receivable)
            .await?;

        let posting = BalancedPosting {
            debit_account: paying_account,
            credit_account: receivable,
            amount: loan.principal,
            reference: loan.ledger_reference(),
            date: loan.posting_date(),
        };
        let posting_id = self
            .ledger
            .post_balanced_entry(&posting)
            .await
            .inspect_err(|e| error!(loan_id = %id, error = %e, "Ledger posting failed"))?;

        let now = Utc::now();
        ApprovalEngine::mark_disbursed(&mut loan.approval)?;
        loan.disbursement = Some(Disbursement {
            posting_id,
            paying_account,
            receivable_account: receivable,
            amount: loan.principal,
            disbursed_at: now,
        });
        loan.updated_at = now;

        let saved: Result<(), LoanError> = async {
            tx.update(&loan).await?;
            tx.commit().await
        }
        .await;
        if let Err(e) = saved {
            return Err(self.reverse_unsaved_posting(id, posting_id, e).await);
        }

        info!(
            loan_id = %id,
            posting_id = %posting_id,
            amount = %loan.principal,
            reference = %posting.reference,
            "Loan disbursed"
        );
        self.hooks.dispatch(&LoanEvent::Disbursed {
            loan_id: id,
            posting_id,
            amount: loan.principal,
        });

        Ok(loan)
    }

    /// Change the terms of a loan that has not been disbursed.
    ///
    /// Principal and term can only change while no approval decision has
    /// been recorded; a new principal re-materializes the fees from the loan
    /// type. After the first decision only descriptive fields change, and
    /// `rebuild_loan` is the way to revise principal or term.
    pub async fn update_loan(&self, id: LoanId, input: UpdateLoanInput) -> Result<Loan, LoanError> {
        if input.is_empty() {
            return self.get_loan(id).await;
        }

        let _guard = self.locks.acquire(id).await;
        let mut tx = self.repo.begin().await?;
        let mut loan = load_locked(&mut tx, id).await?;

        if loan.status() == ApprovalStatus::Disbursed {
            return Err(LoanError::LoanDisbursed(id));
        }

        let UpdateLoanInput {
            principal,
            interest_rate,
            term,
            repayment_frequency,
            purpose,
            start_date,
            end_date,
            repayment_account,
        } = input;

        if principal.is_some() || term.is_some() {
            if !ApprovalEngine::is_undecided(&loan.approval) {
                return Err(LoanError::TermsLocked {
                    id,
                    status: loan.status(),
                });
            }

            let loan_type = self
                .catalog
                .find_loan_type(loan.loan_type_id)
                .await?
                .ok_or(LoanError::LoanTypeNotFound(loan.loan_type_id))?;
            let new_principal = principal.unwrap_or(loan.principal);
            let new_term = term.unwrap_or(loan.term);
            check_against_type(&loan_type, new_principal, &new_term)?;

            if new_principal != loan.principal {
                loan.fees = FeeMaterializer::materialize(&loan_type.attributes, new_principal)?;
                loan.approval.description = approval_description(new_principal);
                loan.principal = new_principal;
            }
            loan.term = new_term;
        }

        if interest_rate.is_some() {
            check_interest_rate(interest_rate)?;
            loan.interest_rate = interest_rate;
        }
        if repayment_frequency.is_some() {
            loan.repayment_frequency = repayment_frequency;
        }
        if purpose.is_some() {
            loan.purpose = purpose;
        }
        if start_date.is_some() {
            loan.start_date = start_date;
        }
        if end_date.is_some() {
            loan.end_date = end_date;
        }
        if repayment_account.is_some() {
            loan.repayment_account = repayment_account;
        }
        check_dates(loan.start_date, loan.end_date)?;

        loan.total_payable = FeeMaterializer::total_payable(loan.principal, &loan.fees)?;
        loan.updated_at = Utc::now();

        tx.update(&loan).await?;
        tx.commit().await?;

        info!(loan_id = %id, principal = %loan.principal, "Loan updated");
        self.hooks.dispatch(&LoanEvent::Updated { loan_id: id });

        Ok(loan)
    }

    /// Re-materialize fees and restart approval from the current loan type.
    ///
    /// Only allowed while the loan is pending or rejected.
    pub async fn rebuild_loan(&self, id: LoanId) -> Result<Loan, LoanError> {
        let _guard = self.locks.acquire(id).await;
        let mut tx = self.repo.begin().await?;
        let mut loan = load_locked(&mut tx, id).await?;

        let status = loan.status();
        if !matches!(status, ApprovalStatus::Pending | ApprovalStatus::Rejected) {
            return Err(LoanError::NotRebuildable { id, status });
        }

        let loan_type = self
            .catalog
            .find_loan_type(loan.loan_type_id)
            .await?
            .ok_or(LoanError::LoanTypeNotFound(loan.loan_type_id))?;
        let client = self.find_client(loan.client_id).await?;

        check_against_type(&loan_type, loan.principal, &loan.term)?;
        let fees = FeeMaterializer::materialize(&loan_type.attributes, loan.principal)?;

        loan.approval = approval_request_for(
            &loan_type,
            &client,
            loan.principal,
            loan.approval.requested_by,
        );
        loan.total_payable = FeeMaterializer::total_payable(loan.principal, &fees)?;
        loan.fees = fees;
        loan.updated_at = Utc::now();

        tx.update(&loan).await?;
        tx.commit().await?;

        info!(
            loan_id = %id,
            previous_status = %status,
            status = %loan.status(),
            "Loan rebuilt"
        );
        self.hooks.dispatch(&LoanEvent::Rebuilt {
            loan_id: id,
            status: loan.status(),
        });

        Ok(loan)
    }

    /// Delete a loan with its fees and approval chain.
    pub async fn delete_loan(&self, id: LoanId) -> Result<(), LoanError> {
        let _guard = self.locks.acquire(id).await;
        let mut tx = self.repo.begin().await?;
        let loan = load_locked(&mut tx, id).await?;

        if loan.status() == ApprovalStatus::Disbursed {
            return Err(LoanError::LoanDisbursed(id));
        }

        tx.delete(id).await?;
        tx.commit().await?;

        info!(loan_id = %id, "Loan deleted");
        self.hooks.dispatch(&LoanEvent::Deleted { loan_id: id });

        Ok(())
    }

    async fn find_client(&self, id: ClientId) -> Result<ClientRef, LoanError> {
        self.clients
            .find_client(id)
            .await?
            .ok_or(LoanError::ClientNotFound(id))
    }

    async fn reverse_unsaved_posting(
        &self,
        id: LoanId,
        posting_id: PostingId,
        cause: LoanError,
    ) -> LoanError {
        error!(
            loan_id = %id,
            posting_id = %posting_id,
            error = %cause,
            "Failed to save disbursement, reversing posting"
        );

        let reason = format!("Disbursement of loan {id} could not be saved");
        match self.ledger.reverse_posting(posting_id, &reason).await {
            Ok(()) => {
                warn!(loan_id = %id, posting_id = %posting_id, "Posting reversed");
                cause
            }
            Err(reverse_err) => {
                error!(
                    loan_id = %id,
                    posting_id = %posting_id,
                    error = %reverse_err,
                    "Posting reversal failed"
                );
                LoanError::UnreconciledPosting {
                    loan_id: id,
                    posting_id,
                    reason: format!("{cause}; reversal: {reverse_err}"),
                }
            }
        }
    }
}

async fn load_locked<T: LoanTransaction>(tx: &mut T, id: LoanId) -> Result<Loan, LoanError> {
    tx.load_for_update(id)
        .await?
        .ok_or(LoanError::LoanNotFound(id))
}

fn approval_request_for(
    loan_type: &LoanType,
    client: &ClientRef,
    principal: Decimal,
    requested_by: UserId,
) -> ApprovalRequest {
    ApprovalEngine::build_request(
        format!("Loan Application: {}", client.id_number),
        approval_description(principal),
        requested_by,
        &loan_type.approvers,
        Utc::now(),
    )
}

fn approval_description(principal: Decimal) -> String {
    format!("Approval for loan application for {principal}")
}

/// Check principal and term against the loan type's bounds.
fn check_against_type(
    loan_type: &LoanType,
    principal: Decimal,
    term: &LoanTerm,
) -> Result<(), LoanError> {
    if principal <= Decimal::ZERO {
        return Err(FeeError::NonPositivePrincipal(principal).into());
    }
    if !is_storable_amount(principal) {
        return Err(LoanError::validation(format!(
            "Principal {principal} has more than 4 decimal places or reaches 10^15"
        )));
    }
    if let Some(min) = loan_type.min_amount
        && principal < min
    {
        return Err(LoanError::validation(format!(
            "Principal {principal} is below the minimum {min} for {}",
            loan_type.name
        )));
    }
    if let Some(max) = loan_type.max_amount
        && principal > max
    {
        return Err(LoanError::validation(format!(
            "Principal {principal} exceeds the maximum {max} for {}",
            loan_type.name
        )));
    }
    if term.value == 0 {
        return Err(LoanError::validation("Loan term must be positive"));
    }
    if let Some(max_term) = &loan_type.max_term
        && term.exceeds(max_term)
    {
        return Err(LoanError::validation(format!(
            "Term {term} exceeds the maximum {max_term} for {}",
            loan_type.name
        )));
    }
    Ok(())
}

/// Interest rates are stored with 4 decimal places below 100000.
fn check_interest_rate(rate: Option<Decimal>) -> Result<(), LoanError> {
    match rate {
        Some(rate)
            if rate.is_sign_negative()
                || rate >= INTEREST_RATE_LIMIT
                || rate.normalize().scale() > AMOUNT_DECIMAL_PLACES =>
        {
            Err(LoanError::validation(format!(
                "Interest rate {rate} must be between 0 and {INTEREST_RATE_LIMIT} with at most 4 decimal places"
            )))
        }
        _ => Ok(()),
    }
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), LoanError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(LoanError::validation(format!(
            "End date {end} is before start date {start}"
        ))),
        _ => Ok(()),
    }
}
