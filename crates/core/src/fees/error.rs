//! Fee materialization error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur while validating or materializing fees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// The loan principal must be strictly positive.
    #[error("Principal must be positive, got {0}")]
    NonPositivePrincipal(Decimal),

    /// A fee attribute on the loan type template is invalid.
    #[error("Fee attribute '{name}' is malformed: {reason}")]
    MalformedAttribute {
        /// The attribute name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The resolved amount does not fit in a decimal.
    #[error("Fee attribute '{name}' overflows when applied to principal {principal}")]
    AmountOverflow {
        /// The attribute name.
        name: String,
        /// The principal it was applied to.
        principal: Decimal,
    },

    /// Principal plus one-time fees does not fit in a decimal.
    #[error("Total payable overflows for principal {principal}")]
    TotalOverflow {
        /// The principal the fees were added to.
        principal: Decimal,
    },
}

impl FeeError {
    /// Every fee error is an input problem.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositivePrincipal(_) => "NON_POSITIVE_PRINCIPAL",
            Self::MalformedAttribute { .. } => "MALFORMED_FEE_ATTRIBUTE",
            Self::AmountOverflow { .. } => "FEE_AMOUNT_OVERFLOW",
            Self::TotalOverflow { .. } => "FEE_TOTAL_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_principal_error() {
        let err = FeeError::NonPositivePrincipal(Decimal::ZERO);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "NON_POSITIVE_PRINCIPAL");
        assert!(err.to_string().contains('0'));
    }

    #[test]
    fn test_malformed_attribute_error() {
        let err = FeeError::MalformedAttribute {
            name: "Insurance".to_string(),
            reason: "AFTER_PERIOD timing requires a period value".to_string(),
        };
        assert_eq!(err.error_code(), "MALFORMED_FEE_ATTRIBUTE");
        assert!(err.to_string().contains("Insurance"));
    }

    #[test]
    fn test_total_overflow_error() {
        let err = FeeError::TotalOverflow {
            principal: Decimal::MAX,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "FEE_TOTAL_OVERFLOW");
    }
}
