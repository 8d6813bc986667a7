//! Client for the external accounting service.
//!
//! The accounting service owns the chart of accounts and the double-entry
//! ledger. This crate implements the `LedgerGateway` and `AccountDirectory`
//! ports from `kopa-core` over its HTTP API.

pub mod client;

pub use client::AccountingClient;
