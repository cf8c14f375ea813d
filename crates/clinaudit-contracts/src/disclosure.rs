//! Patient disclosure records.
//!
//! Disclosures live in their own log stream.  They carry no checksum and no
//! classification and may be edited or removed after creation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fields supplied when recording or editing a disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureDraft {
    /// When the information was sent to the third party.
    pub date: NaiveDateTime,

    /// Kind of disclosure, e.g. `disclosure-healthcareoperations`.
    pub event_type: String,
    pub patient_id: i64,
    pub recipient: String,
    pub description: String,

    /// User who recorded the disclosure.
    pub user: String,
}

/// Fields that may change when a recorded disclosure is edited.
///
/// The patient and the recording user are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureEdit {
    pub date: NaiveDateTime,
    pub event_type: String,
    pub recipient: String,
    pub description: String,
}

/// A stored disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    pub id: i64,
    pub date: NaiveDateTime,
    pub event_type: String,
    pub patient_id: i64,
    pub recipient: String,
    pub description: String,
    pub user: String,
}

impl Disclosure {
    pub fn from_draft(id: i64, draft: DisclosureDraft) -> Self {
        Self {
            id,
            date: draft.date,
            event_type: draft.event_type,
            patient_id: draft.patient_id,
            recipient: draft.recipient,
            description: draft.description,
            user: draft.user,
        }
    }

    pub fn apply(&mut self, edit: DisclosureEdit) {
        self.date = edit.date;
        self.event_type = edit.event_type;
        self.recipient = edit.recipient;
        self.description = edit.description;
    }
}
