//! ATNA transmission errors.
//!
//! These never leave the crate through `AuditTransport::send`; the
//! transmitter logs them and carries on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtnaError {
    #[error("failed to load certificate from {path}: {reason}")]
    CertificateLoad { path: PathBuf, reason: String },

    #[error("failed to load private key from {path}: {reason}")]
    PrivateKeyLoad { path: PathBuf, reason: String },

    #[error("TLS configuration error: {0}")]
    Config(String),

    #[error("collector {host}:{port} could not be reached: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("ATNA I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AtnaError {
    pub fn cert_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AtnaError::CertificateLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn key_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AtnaError::PrivateKeyLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        AtnaError::Config(reason.into())
    }
}
