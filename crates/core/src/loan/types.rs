//! Loan domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use kopa_shared::types::{AccountId, ClientId, LoanId, LoanTypeId, PostingId, UserId};

use crate::approval::types::{ApprovalDecision, ApprovalRequest, ApprovalStatus};
use crate::fees::types::{Fee, FeeAttribute};

/// Whether a loan pays out cash or finances a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanClassification {
    /// Cash loan.
    Cash,
    /// Product loan; the loan must name the financed product.
    Product,
}

impl LoanClassification {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Product => "PRODUCT",
        }
    }

    /// Parses a classification from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CASH" => Some(Self::Cash),
            "PRODUCT" => Some(Self::Product),
            _ => None,
        }
    }
}

impl fmt::Display for LoanClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unit of a loan term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermUnit {
    /// Calendar days.
    Days,
    /// Weeks.
    Weeks,
    /// Months.
    Months,
    /// Years.
    Years,
}

impl TermUnit {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "DAYS",
            Self::Weeks => "WEEKS",
            Self::Months => "MONTHS",
            Self::Years => "YEARS",
        }
    }

    /// Parses a term unit from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DAYS" => Some(Self::Days),
            "WEEKS" => Some(Self::Weeks),
            "MONTHS" => Some(Self::Months),
            "YEARS" => Some(Self::Years),
            _ => None,
        }
    }

    /// Nominal length in days, used only to compare terms across units.
    #[must_use]
    pub const fn nominal_days(self) -> u64 {
        match self {
            Self::Days => 1,
            Self::Weeks => 7,
            Self::Months => 30,
            Self::Years => 365,
        }
    }
}

/// A loan duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanTerm {
    /// Number of units.
    pub value: u32,
    /// The unit.
    pub unit: TermUnit,
}

impl LoanTerm {
    /// Creates a term.
    #[must_use]
    pub const fn new(value: u32, unit: TermUnit) -> Self {
        Self { value, unit }
    }

    /// Returns true if this term is longer than `max`.
    ///
    /// Terms in the same unit compare exactly; otherwise both sides are
    /// converted to nominal days.
    #[must_use]
    pub fn exceeds(&self, max: &LoanTerm) -> bool {
        if self.unit == max.unit {
            return self.value > max.value;
        }
        u64::from(self.value) * self.unit.nominal_days()
            > u64::from(max.value) * max.unit.nominal_days()
    }
}

impl fmt::Display for LoanTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.as_str())
    }
}

/// How often the borrower repays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepaymentFrequency {
    /// Every day.
    Daily,
    /// Every week.
    Weekly,
    /// Every month.
    Monthly,
}

impl RepaymentFrequency {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    /// Parses a frequency from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Loan product template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanType {
    /// Loan type ID.
    pub id: LoanTypeId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Cash or product.
    pub classification: LoanClassification,
    /// Smallest principal allowed.
    pub min_amount: Option<Decimal>,
    /// Largest principal allowed.
    pub max_amount: Option<Decimal>,
    /// Longest term allowed.
    pub max_term: Option<LoanTerm>,
    /// Approvers in review order.
    pub approvers: Vec<UserId>,
    /// Fee-attribute catalog in materialization order.
    pub attributes: Vec<FeeAttribute>,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a loan type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTypeInput {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Cash or product.
    pub classification: LoanClassification,
    /// Smallest principal allowed.
    pub min_amount: Option<Decimal>,
    /// Largest principal allowed.
    pub max_amount: Option<Decimal>,
    /// Longest term allowed.
    pub max_term: Option<LoanTerm>,
    /// Approvers in review order.
    #[serde(default)]
    pub approvers: Vec<UserId>,
    /// Fee-attribute catalog.
    #[serde(default)]
    pub attributes: Vec<FeeAttribute>,
}

/// The borrower as seen by loan origination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    /// Client ID.
    pub id: ClientId,
    /// Full name; also names the client's receivable account.
    pub full_name: String,
    /// National ID number; used in the approval title.
    pub id_number: String,
}

/// Chart-of-accounts category used for account lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCategory {
    /// Asset account.
    Asset,
    /// Liability account.
    Liability,
    /// Amounts owed to the institution.
    Receivable,
    /// Amounts owed by the institution.
    Payable,
    /// Income account.
    Income,
    /// Expense account.
    Expense,
}

impl AccountCategory {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Receivable => "RECEIVABLE",
            Self::Payable => "PAYABLE",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

/// A two-leg ledger entry: debit one account, credit another, same amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancedPosting {
    /// Account debited.
    pub debit_account: AccountId,
    /// Account credited.
    pub credit_account: AccountId,
    /// Amount on both legs.
    pub amount: Decimal,
    /// External reference, e.g. `LOAN-<id>`.
    pub reference: String,
    /// Posting date.
    pub date: NaiveDate,
}

/// Record of a completed disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disbursement {
    /// Ledger posting returned by the accounting service.
    pub posting_id: PostingId,
    /// Account the money was paid from.
    pub paying_account: AccountId,
    /// The client's receivable account.
    pub receivable_account: AccountId,
    /// Amount disbursed.
    pub amount: Decimal,
    /// When the loan was disbursed.
    pub disbursed_at: DateTime<Utc>,
}

/// Loan aggregate: owns its fees and its approval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Loan ID.
    pub id: LoanId,
    /// Template the loan was originated from.
    pub loan_type_id: LoanTypeId,
    /// Borrower.
    pub client_id: ClientId,
    /// Amount lent.
    pub principal: Decimal,
    /// Nominal interest rate in percent.
    pub interest_rate: Option<Decimal>,
    /// Loan duration.
    pub term: LoanTerm,
    /// Repayment frequency.
    pub repayment_frequency: Option<RepaymentFrequency>,
    /// What the money is for.
    pub purpose: Option<String>,
    /// Business date the loan was originated.
    pub creation_date: NaiveDate,
    /// First day of the loan.
    pub start_date: Option<NaiveDate>,
    /// Last day of the loan.
    pub end_date: Option<NaiveDate>,
    /// Account repayments are collected into.
    pub repayment_account: Option<AccountId>,
    /// Financed product for product loans.
    pub selected_product_id: Option<Uuid>,
    /// Principal plus one-time fees.
    pub total_payable: Decimal,
    /// Materialized fees in catalog order.
    pub fees: Vec<Fee>,
    /// The approval chain.
    pub approval: ApprovalRequest,
    /// Set exactly when the loan is disbursed.
    pub disbursement: Option<Disbursement>,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Lifecycle status, which is the approval request's status.
    #[must_use]
    pub fn status(&self) -> ApprovalStatus {
        self.approval.status
    }

    /// Ledger reference for the disbursement posting.
    #[must_use]
    pub fn ledger_reference(&self) -> String {
        format!("LOAN-{}", self.id)
    }

    /// Date the disbursement is booked on: start date, else creation date.
    #[must_use]
    pub fn posting_date(&self) -> NaiveDate {
        self.start_date.unwrap_or(self.creation_date)
    }
}

/// Input for originating a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLoanInput {
    /// Template to originate from.
    pub loan_type_id: LoanTypeId,
    /// Borrower.
    pub client_id: ClientId,
    /// Amount requested.
    pub principal: Decimal,
    /// Interest rate in percent.
    pub interest_rate: Option<Decimal>,
    /// Requested term.
    pub term: LoanTerm,
    /// Repayment frequency.
    pub repayment_frequency: Option<RepaymentFrequency>,
    /// What the money is for.
    pub purpose: Option<String>,
    /// First day of the loan.
    pub start_date: Option<NaiveDate>,
    /// Last day of the loan.
    pub end_date: Option<NaiveDate>,
    /// Account repayments are collected into.
    pub repayment_account: Option<AccountId>,
    /// Financed product, required for product loans.
    pub selected_product_id: Option<Uuid>,
    /// Loan officer originating the request.
    pub requested_by: UserId,
}

/// Descriptive changes to an existing loan. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct UpdateLoanInput {
    pub principal: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub term: Option<LoanTerm>,
    pub repayment_frequency: Option<RepaymentFrequency>,
    pub purpose: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub repayment_account: Option<AccountId>,
}

impl UpdateLoanInput {
    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// An approver's action on a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalAction {
    /// The acting approver.
    pub approver: UserId,
    /// Approve or reject.
    pub decision: ApprovalDecision,
    /// Optional notes stored on the step.
    pub remarks: Option<String>,
    /// Step to act on. When absent, the approver's earliest pending step.
    pub step_order: Option<u32>,
}

/// Filter for loan listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFilter {
    /// Only loans in this status.
    pub status: Option<ApprovalStatus>,
}

/// A committed change to a loan, delivered to post-commit hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LoanEvent {
    Created {
        loan_id: LoanId,
        status: ApprovalStatus,
    },
    ApprovalRecorded {
        loan_id: LoanId,
        approver: UserId,
        step_order: u32,
        status: ApprovalStatus,
    },
    Updated {
        loan_id: LoanId,
    },
    Rebuilt {
        loan_id: LoanId,
        status: ApprovalStatus,
    },
    Deleted {
        loan_id: LoanId,
    },
    Disbursed {
        loan_id: LoanId,
        posting_id: PostingId,
        amount: Decimal,
    },
}

impl LoanEvent {
    /// The loan the event concerns.
    #[must_use]
    pub fn loan_id(&self) -> LoanId {
        match self {
            Self::Created { loan_id, .. }
            | Self::ApprovalRecorded { loan_id, .. }
            | Self::Updated { loan_id }
            | Self::Rebuilt { loan_id, .. }
            | Self::Deleted { loan_id }
            | Self::Disbursed { loan_id, .. } => *loan_id,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "loan.created",
            Self::ApprovalRecorded { .. } => "loan.approval_recorded",
            Self::Updated { .. } => "loan.updated",
            Self::Rebuilt { .. } => "loan.rebuilt",
            Self::Deleted { .. } => "loan.deleted",
            Self::Disbursed { .. } => "loan.disbursed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LoanTerm::new(12, TermUnit::Months), LoanTerm::new(12, TermUnit::Months), false)]
    #[case(LoanTerm::new(13, TermUnit::Months), LoanTerm::new(12, TermUnit::Months), true)]
    #[case(LoanTerm::new(2, TermUnit::Years), LoanTerm::new(18, TermUnit::Months), true)]
    #[case(LoanTerm::new(8, TermUnit::Weeks), LoanTerm::new(2, TermUnit::Months), false)]
    #[case(LoanTerm::new(61, TermUnit::Days), LoanTerm::new(2, TermUnit::Months), true)]
    fn test_term_exceeds(#[case] term: LoanTerm, #[case] max: LoanTerm, #[case] expected: bool) {
        assert_eq!(term.exceeds(&max), expected);
    }

    #[test]
    fn test_enum_parse() {
        assert_eq!(LoanClassification::parse("product"), Some(LoanClassification::Product));
        assert_eq!(TermUnit::parse("YEARS"), Some(TermUnit::Years));
        assert_eq!(RepaymentFrequency::parse("weekly"), Some(RepaymentFrequency::Weekly));
        assert_eq!(TermUnit::parse("fortnights"), None);
    }

    #[test]
    fn test_update_input_is_empty() {
        assert!(UpdateLoanInput::default().is_empty());
        let input = UpdateLoanInput {
            purpose: Some("stock".to_string()),
            ..Default::default()
        };
        assert!(!input.is_empty());
    }
}
