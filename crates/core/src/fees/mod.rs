//! Loan fee templates and materialization.
//!
//! # Modules
//!
//! - `types` - Fee attribute templates and materialized fees
//! - `error` - Fee-specific error types
//! - `materializer` - Template-to-fee resolution

pub mod error;
pub mod materializer;
pub mod types;

#[cfg(test)]
mod materializer_props;

pub use error::FeeError;
pub use materializer::FeeMaterializer;
pub use types::{
    ChargeSchedule, ChargeType, Fee, FeeAttribute, FeeTiming, OneTimeTiming, PeriodUnit,
};
