//! Ledger error types.
//!
//! Every failure of a balance mutation is reported through [`LedgerError`];
//! a failed mutation never leaves a partial effect behind.

use bolsa_shared::{AppError, Money, MoneyError};
use thiserror::Error;

use super::types::{EntryKind, Reference};

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is zero, or its sign does not fit the operation.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// Tier is not recognized or has no configured tariff.
    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    // ========== Business Rule Errors ==========
    /// The mutation would leave the balance negative.
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        /// Balance observed when the mutation was rejected.
        available: Money,
        /// Amount the mutation needed to take out.
        required: Money,
    },

    /// The resulting balance is not representable.
    #[error("Balance arithmetic overflowed")]
    Overflow,

    /// The reference was already accounted for by an entry of the same kind.
    #[error("Reference {reference} already has a {kind} entry")]
    DuplicateReference {
        /// Kind of the existing entry.
        kind: EntryKind,
        /// The duplicated reference.
        reference: Reference,
    },

    // ========== Concurrency Errors ==========
    /// The balance changed between read and append.
    #[error("Balance version mismatch: expected {expected}, got {actual}")]
    ConcurrencyConflict {
        /// Version the caller read.
        expected: i64,
        /// Version found at append time.
        actual: i64,
    },

    /// Conflicts persisted through every retry attempt.
    #[error("Balance contention: gave up after {attempts} attempts")]
    Contention {
        /// Attempts made before giving up.
        attempts: u32,
    },

    // ========== Storage Errors ==========
    /// The backing store failed; nothing was committed.
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidTier(_) => "INVALID_TIER",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Overflow => "OVERFLOW",
            Self::DuplicateReference { .. } => "DUPLICATE_REFERENCE",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::Contention { .. } => "CONTENTION",
            Self::StorageFailure(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_) | Self::InvalidTier(_) => 400,

            // 409 Conflict - concurrency and idempotency
            Self::ConcurrencyConflict { .. }
            | Self::Contention { .. }
            | Self::DuplicateReference { .. } => 409,

            // 422 Unprocessable - business rules
            Self::InsufficientFunds { .. } | Self::Overflow => 422,

            // 500 Internal Server Error
            Self::StorageFailure(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only a version conflict is retried by the engine itself. `Contention`
    /// is the engine having given up, so it is surfaced as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::Overflow => Self::Overflow,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InvalidAmount(_) | LedgerError::InvalidTier(_) => Self::Validation(message),
            LedgerError::InsufficientFunds { .. } | LedgerError::Overflow => {
                Self::BusinessRule(message)
            }
            LedgerError::DuplicateReference { .. }
            | LedgerError::ConcurrencyConflict { .. }
            | LedgerError::Contention { .. } => Self::Conflict(message),
            LedgerError::StorageFailure(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolsa_shared::CertificateId;
    use rstest::rstest;

    fn insufficient() -> LedgerError {
        LedgerError::InsufficientFunds {
            available: Money::ZERO,
            required: Money::new(286_200),
        }
    }

    #[rstest]
    #[case(LedgerError::InvalidAmount(Money::ZERO), "INVALID_AMOUNT", 400)]
    #[case(LedgerError::InvalidTier("200_250cc".into()), "INVALID_TIER", 400)]
    #[case(insufficient(), "INSUFFICIENT_FUNDS", 422)]
    #[case(LedgerError::Overflow, "OVERFLOW", 422)]
    #[case(LedgerError::ConcurrencyConflict { expected: 1, actual: 2 }, "CONCURRENCY_CONFLICT", 409)]
    #[case(LedgerError::Contention { attempts: 5 }, "CONTENTION", 409)]
    #[case(LedgerError::StorageFailure("down".into()), "STORAGE_FAILURE", 500)]
    fn test_codes_and_status(#[case] err: LedgerError, #[case] code: &str, #[case] status: u16) {
        assert_eq!(err.error_code(), code);
        assert_eq!(err.http_status_code(), status);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrencyConflict { expected: 1, actual: 2 }.is_retryable());
        assert!(!LedgerError::Contention { attempts: 5 }.is_retryable());
        assert!(!insufficient().is_retryable());
        assert!(!LedgerError::StorageFailure("down".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            insufficient().to_string(),
            "Insufficient funds: available 0, required 286200"
        );

        let certificate = CertificateId::new();
        let err = LedgerError::DuplicateReference {
            kind: EntryKind::Debit,
            reference: Reference::issuance(certificate),
        };
        assert_eq!(
            err.to_string(),
            format!("Reference issuance:{certificate} already has a debit entry")
        );
    }

    #[test]
    fn test_into_app_error() {
        assert!(matches!(AppError::from(insufficient()), AppError::BusinessRule(_)));
        assert!(matches!(
            AppError::from(LedgerError::Contention { attempts: 3 }),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::InvalidTier("x".into())),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::StorageFailure("x".into())),
            AppError::Database(_)
        ));
    }
}
