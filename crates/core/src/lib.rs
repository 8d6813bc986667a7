//! Core business logic for Kopa.
//!
//! This crate contains pure loan-origination logic with ZERO web or database
//! dependencies. Persistence and the accounting service are reached through
//! the traits in `loan::ports`.
//!
//! # Modules
//!
//! - `fees` - Fee templates and materialization
//! - `approval` - Sequential multi-party approval workflow
//! - `loan` - Loan lifecycle controller, loan types and ports
//! - `error` - Error classification shared by the modules

pub mod approval;
pub mod error;
pub mod fees;
pub mod loan;

pub use error::ErrorKind;
