//! Fund workflow error types.

use bolsa_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::{LedgerError, Reference};

/// Errors reported by the recharge and certificate registries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// No record with this ID.
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    /// The record changed since it was read.
    #[error("Record {0} was modified concurrently")]
    Stale(Uuid),

    /// A record with this ID already exists.
    #[error("Record already exists: {0}")]
    Duplicate(Uuid),

    /// The record data is unusable.
    #[error("Invalid record: {0}")]
    Invalid(String),

    /// The registry backend failed.
    #[error("Registry storage failure: {0}")]
    Storage(String),
}

impl RecordError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "RECORD_NOT_FOUND",
            Self::Stale(_) => "STALE_RECORD",
            Self::Duplicate(_) => "DUPLICATE_RECORD",
            Self::Invalid(_) => "INVALID_RECORD",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Invalid(_) => 400,
            Self::NotFound(_) => 404,
            Self::Stale(_) | Self::Duplicate(_) => 409,
            Self::Storage(_) => 500,
        }
    }
}

/// Errors of the fund workflows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FundError {
    /// The ledger rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A registry rejected the operation.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A step failed and undoing the ledger side of it failed as well.
    ///
    /// The ledger is still consistent, but it holds an entry whose record
    /// does not exist. Needs manual reconciliation.
    #[error("Compensation for {reference} failed: {compensation} (after: {cause})")]
    CompensationFailed {
        /// Reference whose effect could not be undone.
        reference: Reference,
        /// The failure that triggered the compensation.
        cause: String,
        /// Why the compensation failed.
        compensation: String,
    },
}

impl FundError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.error_code(),
            Self::Record(err) => err.error_code(),
            Self::CompensationFailed { .. } => "COMPENSATION_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(err) => err.http_status_code(),
            Self::Record(err) => err.http_status_code(),
            Self::CompensationFailed { .. } => 500,
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        let message = err.to_string();
        match err {
            RecordError::NotFound(_) => Self::NotFound(message),
            RecordError::Stale(_) | RecordError::Duplicate(_) => Self::Conflict(message),
            RecordError::Invalid(_) => Self::Validation(message),
            RecordError::Storage(_) => Self::Database(message),
        }
    }
}

impl From<FundError> for AppError {
    fn from(err: FundError) -> Self {
        match err {
            FundError::Ledger(err) => err.into(),
            FundError::Record(err) => err.into(),
            FundError::CompensationFailed { .. } => Self::Internal(err.to_string()),
        }
    }
}
