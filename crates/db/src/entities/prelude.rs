//! `SeaORM` entity prelude.

pub use super::approval_requests::Entity as ApprovalRequests;
pub use super::approval_steps::Entity as ApprovalSteps;
pub use super::clients::Entity as Clients;
pub use super::fee_attributes::Entity as FeeAttributes;
pub use super::loan_fees::Entity as LoanFees;
pub use super::loan_type_approvers::Entity as LoanTypeApprovers;
pub use super::loan_types::Entity as LoanTypes;
pub use super::loans::Entity as Loans;
