//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `CurrencyId` where an
//! account or request ID is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate UUID-backed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Macro to generate integer-backed ID wrappers for rows keyed by the
/// database's integer primary keys.
macro_rules! numeric_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the inner integer.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

numeric_id!(CurrencyId, "Identifier of a currency row.");
typed_id!(SyncRequestId, "Identifier of a request queued to the sync worker.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_currency_id_roundtrip_text() {
        let id = CurrencyId::from_str(" 42 ").unwrap();
        assert_eq!(id, CurrencyId(42));
        assert_eq!(id.to_string(), "42");
        assert!(CurrencyId::from_str("usd").is_err());
    }

    #[test]
    fn test_sync_request_ids_are_unique() {
        let a = SyncRequestId::new();
        let b = SyncRequestId::new();
        assert_ne!(a, b);
        assert_eq!(a.into_inner().get_version_num(), 7);
    }
}
