//! Error types for the audit trail.
//!
//! Every fallible operation in the clinaudit crates returns
//! `ClinauditResult<T>`.  Classification ambiguity is never an error; it
//! degrades to category `other` or an empty checksum instead.

use thiserror::Error;

/// The unified error type for the clinaudit crates.
#[derive(Debug, Error)]
pub enum ClinauditError {
    /// The primary audit event could not be persisted.
    ///
    /// Propagated to the caller as a hard failure of the logging call.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// The audit event was persisted but its tamper-evidence record was not.
    ///
    /// The event identified by `log_id` stays in the store without a sidecar.
    #[error("tamper-evidence record for log {log_id} failed: {reason}")]
    TamperRecordFailed { log_id: i64, reason: String },

    /// The storage collaborator failed outside of the two audit writes.
    #[error("storage error: {reason}")]
    StorageError { reason: String },

    /// The encryption collaborator rejected the comment payload.
    #[error("comment encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A `get_events` filter could not be turned into a query.
    #[error("invalid event query: {reason}")]
    InvalidQuery { reason: String },
}

/// Convenience alias used throughout the clinaudit crates.
pub type ClinauditResult<T> = Result<T, ClinauditError>;
