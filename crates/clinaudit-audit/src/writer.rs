//! Store-backed implementation of `AuditWriter`.
//!
//! Each call performs two inserts in sequence: the event, then its
//! tamper-evidence record.  There is no shared transaction.  A failed
//! second insert leaves the event stored without a sidecar, which
//! `verify_stored_event` reports as `MissingRecord`.

use std::sync::Arc;

use tracing::{debug, warn};

use clinaudit_contracts::{
    classification::QueryType,
    error::{ClinauditError, ClinauditResult},
    event::{AuditDraft, AuditEvent, TamperEvidenceRecord},
    settings::AuditSettings,
};
use clinaudit_core::traits::{AuditWriter, Encryptor, RecordStore};

use crate::hash::tamper_checksum;

/// Writes audit events and their tamper records through a `RecordStore`.
pub struct StoreAuditWriter {
    store: Arc<dyn RecordStore>,
    encryptor: Option<Arc<dyn Encryptor>>,
}

impl StoreAuditWriter {
    /// A writer that stores comments in plain text.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            encryptor: None,
        }
    }

    /// A writer that encrypts every comment with `encryptor`.
    pub fn with_encryption(store: Arc<dyn RecordStore>, encryptor: Arc<dyn Encryptor>) -> Self {
        Self {
            store,
            encryptor: Some(encryptor),
        }
    }

    /// Build a writer according to `enable_auditlog_encryption`.
    ///
    /// Returns `ClinauditError::ConfigError` when encryption is enabled but
    /// no encryptor is available.  An encryptor passed while encryption is
    /// disabled is ignored.
    pub fn from_settings(
        settings: &AuditSettings,
        store: Arc<dyn RecordStore>,
        encryptor: Option<Arc<dyn Encryptor>>,
    ) -> ClinauditResult<Self> {
        if !settings.enable_auditlog_encryption {
            return Ok(Self::new(store));
        }
        match encryptor {
            Some(encryptor) => Ok(Self::with_encryption(store, encryptor)),
            None => Err(ClinauditError::ConfigError {
                reason: "enable_auditlog_encryption is set but no encryptor is configured"
                    .to_string(),
            }),
        }
    }

    pub fn encrypts(&self) -> bool {
        self.encryptor.is_some()
    }
}

impl AuditWriter for StoreAuditWriter {
    fn record(&self, mut draft: AuditDraft) -> ClinauditResult<AuditEvent> {
        let mut encrypted = false;
        if let Some(encryptor) = &self.encryptor {
            // An empty comment is stored as is and recorded as unencrypted.
            if !draft.comments.is_empty() {
                draft.comments = encryptor.encrypt(&draft.comments)?;
                encrypted = true;
            }
        }
        let query_type = draft.query_type;

        let id = self
            .store
            .insert_event(&draft)
            .map_err(|e| ClinauditError::AuditWriteFailed {
                reason: e.to_string(),
            })?;
        let event = AuditEvent::from_draft(id, draft);

        let checksum = if query_type == Some(QueryType::Update) {
            tamper_checksum(&event)
        } else {
            String::new()
        };

        let record = TamperEvidenceRecord {
            log_id: id,
            encrypted,
            checksum,
            version: TamperEvidenceRecord::SCHEMA_VERSION,
        };

        if let Err(e) = self.store.insert_tamper_record(&record) {
            warn!(log_id = id, error = %e, "tamper-evidence record not written");
            return Err(ClinauditError::TamperRecordFailed {
                log_id: id,
                reason: e.to_string(),
            });
        }

        debug!(log_id = id, encrypted = record.encrypted, "audit event and tamper record stored");
        Ok(event)
    }
}
