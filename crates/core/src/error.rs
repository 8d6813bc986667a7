//! Error classification shared by the core modules.

use serde::Serialize;
use std::fmt;

/// Category a domain error falls into, independent of which module raised it.
///
/// Callers branch on the kind (for HTTP status, retries, alerting) without
/// matching every concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input: non-positive principal, malformed fee attribute, bounds.
    Validation,
    /// Unknown loan, loan type, client, step, or approver.
    NotFound,
    /// An approval step acted on before its predecessors were approved.
    OrderingViolation,
    /// The operation is not allowed in the current state.
    StateConflict,
    /// The external ledger or account lookup failed.
    LedgerFailure,
    /// Storage or other infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::StateConflict => 409,
            Self::OrderingViolation => 422,
            Self::LedgerFailure => 502,
            Self::Internal => 500,
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::OrderingViolation => "ordering_violation",
            Self::StateConflict => "state_conflict",
            Self::LedgerFailure => "ledger_failure",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
