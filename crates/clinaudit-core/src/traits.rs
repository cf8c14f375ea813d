//! Collaborator trait definitions for the audit trail.
//!
//! The facade talks to everything outside its own logic through these seams:
//!
//! - `RecordStore`: the relational store (audit tables, clinical rows, ACL)
//! - `Encryptor`: opaque comment encryption capability
//! - `Classifier`: SQL text → event class and category
//! - `AuditWriter`: persists an event and its tamper-evidence sidecar
//! - `AuditTransport`: best-effort delivery to a remote collector
//!
//! `AuditLogger` wires them together in the required order.

use clinaudit_contracts::{
    classification::Classification,
    disclosure::{Disclosure, DisclosureDraft, DisclosureEdit},
    error::ClinauditResult,
    event::{AuditDraft, AuditEvent, TamperEvidenceRecord},
    query::{DisclosureQuery, EventQuery},
};

/// One stored row as `(column, value)` pairs in column order.
///
/// `None` is SQL NULL.
pub type Row = Vec<(String, Option<String>)>;

/// The storage collaborator.
///
/// Implementations own the audit tables as well as read access to the
/// clinical tables whose rows are checksummed.  Every method is a single
/// statement; the trait offers no transactions.
pub trait RecordStore: Send + Sync {
    /// Insert an audit event and return its surrogate id.
    fn insert_event(&self, draft: &AuditDraft) -> ClinauditResult<i64>;

    /// Insert the tamper-evidence sidecar of an already stored event.
    fn insert_tamper_record(&self, record: &TamperEvidenceRecord) -> ClinauditResult<()>;

    /// Fetch the sidecar of the event `log_id`, if one was written.
    fn tamper_record(&self, log_id: i64) -> ClinauditResult<Option<TamperEvidenceRecord>>;

    /// Run a validated audit-stream query.
    fn query_events(&self, query: &EventQuery) -> ClinauditResult<Vec<AuditEvent>>;

    fn insert_disclosure(&self, draft: &DisclosureDraft) -> ClinauditResult<i64>;

    fn update_disclosure(&self, id: i64, edit: &DisclosureEdit) -> ClinauditResult<()>;

    fn delete_disclosure(&self, id: i64) -> ClinauditResult<()>;

    /// Run a validated disclosure-stream query.
    fn query_disclosures(&self, query: &DisclosureQuery) -> ClinauditResult<Vec<Disclosure>>;

    /// Auto-increment id produced by the most recent application write, or
    /// `None` when that write produced none.
    fn last_insert_id(&self) -> Option<i64>;

    /// Read the full current row of `table` whose `key_column` equals `key`.
    ///
    /// `Ok(None)` when no such row exists.
    fn fetch_row(&self, table: &str, key_column: &str, key: &str) -> ClinauditResult<Option<Row>>;

    /// Whether `user` (exact, case-sensitive) belongs to the ACL group `group`.
    fn is_group_member(&self, user: &str, group: &str) -> ClinauditResult<bool>;

    /// Resolve a patient-portal menu item name to its id.
    fn portal_menu_item_id(&self, menu_item: &str) -> ClinauditResult<Option<i64>>;
}

/// The opaque encryption capability applied to audit comments.
pub trait Encryptor: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> ClinauditResult<String>;

    fn decrypt(&self, ciphertext: &str) -> ClinauditResult<String>;
}

/// Derives the semantic category of a raw SQL statement.
///
/// Implementations are heuristic and must never fail: anything they cannot
/// place is classified as `other`.
pub trait Classifier: Send + Sync {
    /// Classify `statement`.  Table matching only looks at the statement;
    /// `comment` (the statement plus rendered bind values) is searched for
    /// category markers.
    fn classify_with_comment(&self, statement: &str, comment: &str) -> Classification;

    fn classify(&self, statement: &str) -> Classification {
        self.classify_with_comment(statement, statement)
    }

    /// Category for an explicitly logged event.  Usually the event key itself;
    /// `delete` events may be narrowed from markers in the comment.
    fn categorize_explicit(&self, event: &str, comments: &str) -> String;
}

/// Persists audit events.
///
/// The writer performs two inserts in sequence without a shared transaction:
/// the event, then its tamper-evidence record.  A failed first insert is
/// `AuditWriteFailed`; a failed second insert is `TamperRecordFailed` and
/// leaves the event in place.
pub trait AuditWriter: Send + Sync {
    /// Store `draft` and return the event as persisted (comment possibly
    /// encrypted, id assigned).
    fn record(&self, draft: AuditDraft) -> ClinauditResult<AuditEvent>;
}

/// Best-effort delivery of a persisted event to a remote collector.
///
/// `send` cannot fail from the caller's point of view: implementations
/// swallow every connection and write error.
pub trait AuditTransport: Send + Sync {
    fn send(&self, event: &AuditEvent);
}

/// A transport that drops everything.  Used when no collector exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl AuditTransport for NullTransport {
    fn send(&self, _event: &AuditEvent) {}
}
