//! Core identifier types used throughout the system
//!
//! Every identifier is a 128-bit UUID wrapped in its own newtype so a
//! customer id can never be passed where an account id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random id (UUID v4)
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the inner UUID value
            #[inline]
            pub fn inner(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Customer ID - the authenticated identity that owns exactly one account
    CustomerId
);

uuid_id!(
    /// Account ID - primary key of a balance record
    AccountId
);

uuid_id!(
    /// Transfer ID - primary key of an immutable transfer record
    TransferId
);

uuid_id!(
    /// Client-supplied idempotency key.
    ///
    /// Globally unique across all transfer records; a replay carrying the
    /// same key never re-applies the transfer.
    IdempotencyKey
);

/// Amount in minor currency units (e.g. cents)
pub type MinorUnits = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse_and_display() {
        let raw = "2108b394-b875-40cf-9ee6-1d8bd6fb1ec5";
        let key: IdempotencyKey = raw.parse().unwrap();
        assert_eq!(key.to_string(), raw);
        assert!("not-a-uuid".parse::<IdempotencyKey>().is_err());
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(TransferId::new(), TransferId::new());
    }

    #[test]
    fn test_serde_transparent() {
        let id: CustomerId = "f59207c8-e837-4159-b67d-78c716510747".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"f59207c8-e837-4159-b67d-78c716510747\"");
    }
}
