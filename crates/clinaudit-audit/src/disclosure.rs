//! The patient disclosure log.
//!
//! Disclosures record information released to third parties.  Unlike audit
//! events they are editable and removable, and they carry no checksum.

use std::sync::Arc;

use tracing::info;

use clinaudit_contracts::{
    disclosure::{Disclosure, DisclosureDraft, DisclosureEdit},
    error::{ClinauditError, ClinauditResult},
};
use clinaudit_core::traits::RecordStore;

/// Records, edits, and deletes disclosures through a `RecordStore`.
pub struct DisclosureLog {
    store: Arc<dyn RecordStore>,
}

impl DisclosureLog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn record(&self, draft: DisclosureDraft) -> ClinauditResult<Disclosure> {
        if draft.event_type.trim().is_empty() {
            return Err(ClinauditError::StorageError {
                reason: "disclosure type must not be empty".to_string(),
            });
        }

        let id = self.store.insert_disclosure(&draft)?;
        info!(
            disclosure_id = id,
            patient_id = draft.patient_id,
            event = %draft.event_type,
            "disclosure recorded"
        );
        Ok(Disclosure::from_draft(id, draft))
    }

    pub fn update(&self, id: i64, edit: DisclosureEdit) -> ClinauditResult<()> {
        self.store.update_disclosure(id, &edit)?;
        info!(disclosure_id = id, "disclosure updated");
        Ok(())
    }

    pub fn delete(&self, id: i64) -> ClinauditResult<()> {
        self.store.delete_disclosure(id)?;
        info!(disclosure_id = id, "disclosure deleted");
        Ok(())
    }
}
