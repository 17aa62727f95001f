//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `RechargeId` where a
//! `CertificateId` is expected when building ledger references.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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

typed_id!(RechargeId, "Unique identifier for a recharge of the fund.");
typed_id!(CertificateId, "Unique identifier for an issued certificate (SOAT).");
typed_id!(LedgerEntryId, "Unique identifier for a ledger entry.");

/// Identity of whoever authorized a ledger operation.
///
/// Its meaning is owned by the authentication collaborator; the ledger only
/// records it. Blank identifiers are rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates an actor identifier, trimming surrounding whitespace.
    ///
    /// Returns `None` when the identifier is empty after trimming.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_ids_are_time_ordered() {
        let first = CertificateId::new();
        let second = CertificateId::new();
        assert_ne!(first, second);
        assert!(first <= second);
    }

    #[test]
    fn test_typed_id_round_trips_through_str() {
        let id = RechargeId::new();
        let parsed = RechargeId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(RechargeId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_actor_id_trims_and_rejects_blank() {
        assert_eq!(ActorId::new("  admin@soat.com ").unwrap().as_str(), "admin@soat.com");
        assert!(ActorId::new("   ").is_none());
        assert!(ActorId::new("").is_none());
    }
}
