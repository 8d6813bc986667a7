//! Repository implementations for data access.
//!
//! Each repository implements one of the loan ports from `kopa-core`,
//! hiding the `SeaORM` details from the services that drive them.

pub mod client;
pub mod loan;
pub mod loan_type;

pub use client::{ClientRepository, NewClient};
pub use loan::{LoanRepository, PgLoanTransaction};
pub use loan_type::LoanTypeRepository;

use kopa_core::loan::LoanError;
use sea_orm::DbErr;

/// Map a driver error into the loan error taxonomy.
pub(crate) fn db_err(e: DbErr) -> LoanError {
    LoanError::Repository(e.to_string())
}

/// A stored value that no longer parses into its domain type.
pub(crate) fn corrupt(column: &str, value: impl std::fmt::Display) -> LoanError {
    LoanError::Repository(format!("Unexpected value '{value}' in column {column}"))
}

/// Domain counts and orders are `u32`; the schema stores `INTEGER`.
pub(crate) fn to_db_int(column: &str, value: u32) -> Result<i32, LoanError> {
    i32::try_from(value).map_err(|_| corrupt(column, value))
}

pub(crate) fn from_db_int(column: &str, value: i32) -> Result<u32, LoanError> {
    u32::try_from(value).map_err(|_| corrupt(column, value))
}

/// One-based position of a child row.
pub(crate) fn position(index: usize) -> Result<i32, LoanError> {
    i32::try_from(index + 1).map_err(|_| corrupt("position", index + 1))
}
