//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ClientId` where a `LoanId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a system user (requester or approver).");
typed_id!(ClientId, "Unique identifier for a borrowing client.");
typed_id!(LoanTypeId, "Unique identifier for a loan type.");
typed_id!(LoanId, "Unique identifier for a loan.");
typed_id!(FeeId, "Unique identifier for a materialized loan fee.");
typed_id!(ApprovalRequestId, "Unique identifier for an approval request.");
typed_id!(ApprovalStepId, "Unique identifier for an approval step.");
typed_id!(
    AccountId,
    "Unique identifier for an account in the external accounting service."
);
typed_id!(
    PostingId,
    "Unique identifier for a balanced posting recorded by the ledger."
);
