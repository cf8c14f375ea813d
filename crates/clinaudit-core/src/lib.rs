//! # clinaudit-core
//!
//! The audit facade of the clinaudit trail and the logic it owns directly.
//!
//! This crate provides:
//! - The collaborator traits (`RecordStore`, `Encryptor`, `Classifier`,
//!   `AuditWriter`, `AuditTransport`)
//! - The row checksum engine that fingerprints the row a write statement
//!   modified
//! - The per-user breakglass cache
//! - `AuditLogger`, which runs the gates and calls the collaborators in order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinaudit_core::{AuditLogger, ExplicitEvent};
//!
//! let logger = AuditLogger::new(settings, store, classifier, writer, transport);
//! logger.log_sql_event(&ctx, "UPDATE patient_data SET DOB='1990-01-01' WHERE id = 42", true, None)?;
//! logger.log_event(&ctx, ExplicitEvent::new("login", true))?;
//! ```

pub mod breakglass;
pub mod checksum;
pub mod logger;
pub mod traits;

pub use breakglass::BreakglassCache;
pub use logger::{format_binds, AuditLogger, ExplicitEvent, LogOutcome, SuppressReason};
