//! Tamper-evidence checksum and verification.
//!
//! The checksum commits to the stored fields of an audit event.  It is
//! written only for events that came from an UPDATE statement; every other
//! event gets a tamper record with an empty checksum.
//!
//! Hash input layout (UTF-8, concatenated without separators):
//!   1. timestamp as `YYYY-MM-DD HH:MM:SS`
//!   2. event key
//!   3. user
//!   4. group
//!   5. comments as stored (ciphertext when encrypted)
//!   6. patient id in decimal
//!   7. success as `1` or `0`
//!   8. row checksum
//!   9. source identity

use sha1::{Digest, Sha1};

use clinaudit_contracts::{
    error::ClinauditResult,
    event::{AuditEvent, TamperEvidenceRecord, TIMESTAMP_FORMAT},
};
use clinaudit_core::traits::RecordStore;

/// Outcome of checking a stored event against its tamper record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    /// The recomputed checksum matches the recorded one.
    Intact,

    /// The event's fields no longer hash to the recorded checksum, or the
    /// record belongs to a different event.
    Tampered { recorded: String, recomputed: String },

    /// The tamper record carries no checksum (not an update event).
    NoChecksum,

    /// No tamper record exists for the event.
    MissingRecord,
}

/// Compute the tamper-evidence checksum of `event`.
///
/// Returns a lowercase 40-character hex string.
pub fn tamper_checksum(event: &AuditEvent) -> String {
    let mut hasher = Sha1::new();
    hasher.update(event.timestamp.format(TIMESTAMP_FORMAT).to_string().as_bytes());
    hasher.update(event.event.as_bytes());
    hasher.update(event.user.as_bytes());
    hasher.update(event.group.as_bytes());
    hasher.update(event.comments.as_bytes());
    hasher.update(event.patient_id.to_string().as_bytes());
    hasher.update(if event.success { b"1" } else { b"0" });
    hasher.update(event.checksum.as_bytes());
    hasher.update(event.source_identity.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check `event` against `record`.
pub fn verify_event(event: &AuditEvent, record: &TamperEvidenceRecord) -> Integrity {
    if record.checksum.is_empty() {
        return Integrity::NoChecksum;
    }

    let recomputed = tamper_checksum(event);
    if record.log_id == event.id && record.checksum == recomputed {
        Integrity::Intact
    } else {
        Integrity::Tampered {
            recorded: record.checksum.clone(),
            recomputed,
        }
    }
}

/// Look up the tamper record of `event` in `store` and check it.
pub fn verify_stored_event(store: &dyn RecordStore, event: &AuditEvent) -> ClinauditResult<Integrity> {
    match store.tamper_record(event.id)? {
        Some(record) => Ok(verify_event(event, &record)),
        None => Ok(Integrity::MissingRecord),
    }
}
