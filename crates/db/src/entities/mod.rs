//! `SeaORM` entity definitions.

pub mod prelude;

pub mod approval_requests;
pub mod approval_steps;
pub mod clients;
pub mod fee_attributes;
pub mod loan_fees;
pub mod loan_type_approvers;
pub mod loan_types;
pub mod loans;
