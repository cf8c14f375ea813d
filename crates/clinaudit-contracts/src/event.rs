//! Audit event, tamper-evidence record, and acting-context types.
//!
//! An `AuditEvent` is created once per logged action and never modified.
//! Each one owns exactly one `TamperEvidenceRecord` written right after it.

use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::classification::QueryType;

/// Timestamp layout used for storage and for the tamper checksum input.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current wall-clock time truncated to whole seconds.
///
/// Stored timestamps carry no sub-second part, so the value hashed into the
/// tamper checksum is exactly the value read back later.
pub fn now_seconds() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Where an explicit event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSource {
    #[default]
    Application,
    PatientPortal,
}

/// Who is acting, on whose behalf, through which client identity.
///
/// Passed explicitly on every call; the audit layer keeps no session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Authenticated user name; empty for anonymous requests.
    pub user: String,

    /// Authorization group / provider of the acting user.
    pub group: String,

    /// Patient currently open in the acting session, if any.
    pub patient_id: Option<i64>,

    /// Common name of the client TLS certificate presented by the caller.
    pub client_cert_cn: Option<String>,
}

impl AuditContext {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
            ..Self::default()
        }
    }

    pub fn with_patient(mut self, patient_id: i64) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn with_client_cert(mut self, cn: impl Into<String>) -> Self {
        self.client_cert_cn = Some(cn.into());
        self
    }

    /// The source identity recorded on every event (`crt_user`).
    pub fn source_identity(&self) -> &str {
        self.client_cert_cn.as_deref().unwrap_or("")
    }
}

/// Everything the facade knows about an event before it is persisted.
///
/// The writer turns a draft into a stored `AuditEvent`, encrypting the
/// comment on the way when encryption is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    pub timestamp: NaiveDateTime,
    pub event: String,
    pub category: String,
    pub user: String,
    pub group: String,
    pub patient_id: i64,
    pub success: bool,
    pub comments: String,

    /// Row checksum from the checksum engine, or empty.
    pub checksum: String,
    pub source_identity: String,
    pub log_from: LogSource,
    pub menu_item_id: Option<i64>,
    pub ccda_doc_id: Option<i64>,

    /// Set for statements captured through the SQL path.  Only
    /// `Some(QueryType::Update)` gets a populated tamper checksum.
    pub query_type: Option<QueryType>,
}

/// A persisted audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Surrogate id assigned by the store.
    pub id: i64,
    pub timestamp: NaiveDateTime,

    /// Event key, e.g. `patient-record-update` or `login`.
    pub event: String,
    pub category: String,
    pub user: String,
    pub group: String,
    pub patient_id: i64,
    pub success: bool,

    /// Statement text or free-form comment, ciphertext when encrypted.
    pub comments: String,

    /// Hex SHA-1 of the affected row, or empty.
    pub checksum: String,

    /// Client certificate common name of the caller (`crt_user`).
    pub source_identity: String,
    pub log_from: LogSource,
    pub menu_item_id: Option<i64>,
    pub ccda_doc_id: Option<i64>,
}

impl AuditEvent {
    /// Attach the store-assigned id to a draft whose comment is final.
    pub fn from_draft(id: i64, draft: AuditDraft) -> Self {
        Self {
            id,
            timestamp: draft.timestamp,
            event: draft.event,
            category: draft.category,
            user: draft.user,
            group: draft.group,
            patient_id: draft.patient_id,
            success: draft.success,
            comments: draft.comments,
            checksum: draft.checksum,
            source_identity: draft.source_identity,
            log_from: draft.log_from,
            menu_item_id: draft.menu_item_id,
            ccda_doc_id: draft.ccda_doc_id,
        }
    }
}

/// Sidecar record proving how an `AuditEvent` was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperEvidenceRecord {
    /// Id of the owning `AuditEvent`.
    pub log_id: i64,

    /// Whether the event's comment went through the encryption capability.
    pub encrypted: bool,

    /// Hex SHA-1 over the event's own fields; empty unless the event came
    /// from an UPDATE statement.
    pub checksum: String,
    pub version: u32,
}

impl TamperEvidenceRecord {
    /// Layout version written with every new record.
    pub const SCHEMA_VERSION: u32 = 3;
}
