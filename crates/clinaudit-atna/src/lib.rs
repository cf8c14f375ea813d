//! ATNA (Audit Trail and Node Authentication) output for clinaudit.
//!
//! Each persisted audit event can be forwarded to a remote collector as an
//! RFC 3881 `AuditMessage` wrapped in a syslog line, over mutual TLS.
//! Delivery is best effort: one connection per event, no retries, and
//! failures are logged rather than returned.
//!
//! # Usage
//!
//! ```rust,no_run
//! use clinaudit_atna::AtnaTransmitter;
//! use clinaudit_contracts::settings::AuditSettings;
//!
//! let settings = AuditSettings::default();
//! let transport = AtnaTransmitter::new(&settings);
//! // pass `transport` to the audit logger as its `AuditTransport`
//! # let _ = transport;
//! ```

pub mod error;
pub mod message;
pub mod transport;

pub use error::AtnaError;
pub use message::{display_name, outcome_indicator, EventActionCode, Rfc3881Message};
pub use transport::{AtnaTransmitter, Dialer, TlsDialer, CONNECT_TIMEOUT};
