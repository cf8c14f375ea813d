//! In-memory implementation of `RecordStore`.
//!
//! `InMemoryRecordStore` is the reference implementation of the
//! `RecordStore` trait.  It holds the audit stream, the tamper records, the
//! disclosure stream, and a small set of clinical tables in one state value
//! protected by a `Mutex`, so it can be shared across threads behind an
//! `Arc`.
//!
//! Clinical rows, ACL group membership, and portal menu items are seeded
//! with the `put_row`, `add_group_member`, and `add_portal_menu_item`
//! helpers.  `put_row` also sets the auto-increment feedback the checksum
//! engine reads, the way an application write would.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use clinaudit_contracts::{
    disclosure::{Disclosure, DisclosureDraft, DisclosureEdit},
    error::{ClinauditError, ClinauditResult},
    event::{AuditDraft, AuditEvent, TamperEvidenceRecord},
    query::{DisclosureQuery, DisclosureSortColumn, EventQuery, EventSortColumn, SortDirection},
};
use clinaudit_core::traits::{RecordStore, Row};

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    events: Vec<AuditEvent>,
    tamper_records: Vec<TamperEvidenceRecord>,
    disclosures: Vec<Disclosure>,

    /// Last id handed out per stream.
    last_event_id: i64,
    last_disclosure_id: i64,

    /// Clinical tables by name, rows in insertion order.
    tables: HashMap<String, Vec<Row>>,
    last_insert_id: Option<i64>,

    /// `(user, group)` pairs.
    memberships: Vec<(String, String)>,
    menu_items: HashMap<String, i64>,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// An in-memory `RecordStore`.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a clinical row keyed by `key_column`.
    ///
    /// With `auto_increment` the row's key becomes the auto-increment
    /// feedback; otherwise the feedback is cleared, as after a write to a
    /// table without an auto-increment id.
    pub fn put_row(&self, table: &str, key_column: &str, row: Row, auto_increment: bool) {
        let key = column_value(&row, key_column).map(str::to_string);
        let mut state = self.lock();

        state.last_insert_id = if auto_increment {
            key.as_deref().and_then(|k| k.parse().ok())
        } else {
            None
        };

        let rows = state.tables.entry(table.to_string()).or_default();
        match rows
            .iter_mut()
            .find(|existing| key.is_some() && column_value(existing, key_column) == key.as_deref())
        {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }

    /// Remove a clinical row, as a DELETE statement would.
    pub fn remove_row(&self, table: &str, key_column: &str, key: &str) {
        if let Some(rows) = self.lock().tables.get_mut(table) {
            rows.retain(|row| column_value(row, key_column) != Some(key));
        }
    }

    pub fn add_group_member(&self, user: &str, group: &str) {
        self.lock()
            .memberships
            .push((user.to_string(), group.to_string()));
    }

    pub fn add_portal_menu_item(&self, name: &str, id: i64) {
        self.lock().menu_items.insert(name.to_string(), id);
    }

    /// Snapshot of every stored audit event in insertion order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().events.clone()
    }

    pub fn tamper_records(&self) -> Vec<TamperEvidenceRecord> {
        self.lock().tamper_records.clone()
    }

    pub fn disclosures(&self) -> Vec<Disclosure> {
        self.lock().disclosures.clone()
    }

    /// The audit stream as pretty-printed JSON.
    pub fn export_json(&self) -> ClinauditResult<String> {
        serde_json::to_string_pretty(&self.lock().events).map_err(|e| ClinauditError::StorageError {
            reason: format!("failed to serialize audit events: {}", e),
        })
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock(&self) -> ClinauditResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|e| ClinauditError::StorageError {
            reason: format!("record store lock poisoned: {}", e),
        })
    }
}

// ── RecordStore impl ──────────────────────────────────────────────────────────

impl RecordStore for InMemoryRecordStore {
    fn insert_event(&self, draft: &AuditDraft) -> ClinauditResult<i64> {
        let mut state = self.try_lock()?;
        state.last_event_id += 1;
        let id = state.last_event_id;
        state.events.push(AuditEvent::from_draft(id, draft.clone()));
        Ok(id)
    }

    fn insert_tamper_record(&self, record: &TamperEvidenceRecord) -> ClinauditResult<()> {
        let mut state = self.try_lock()?;
        if !state.events.iter().any(|e| e.id == record.log_id) {
            return Err(ClinauditError::StorageError {
                reason: format!("no audit event with id {}", record.log_id),
            });
        }
        state.tamper_records.push(record.clone());
        Ok(())
    }

    fn tamper_record(&self, log_id: i64) -> ClinauditResult<Option<TamperEvidenceRecord>> {
        let state = self.try_lock()?;
        Ok(state
            .tamper_records
            .iter()
            .find(|r| r.log_id == log_id)
            .cloned())
    }

    fn query_events(&self, query: &EventQuery) -> ClinauditResult<Vec<AuditEvent>> {
        let state = self.try_lock()?;
        let mut rows: Vec<AuditEvent> = state
            .events
            .iter()
            .filter(|e| e.timestamp >= query.start && e.timestamp <= query.end)
            .filter(|e| query.user.as_ref().map_or(true, |u| &e.user == u))
            .filter(|e| query.patient_id.map_or(true, |p| e.patient_id == p))
            .filter(|e| {
                query
                    .event_prefix
                    .as_ref()
                    .map_or(true, |p| e.event.starts_with(p.as_str()))
            })
            .filter(|e| {
                query
                    .event_suffix
                    .as_ref()
                    .map_or(true, |s| e.event.ends_with(s.as_str()))
            })
            .cloned()
            .collect();

        if let Some((column, direction)) = query.order {
            rows.sort_by(|a, b| {
                let ord = compare_events(a, b, column);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        rows.truncate(query.limit);
        Ok(rows)
    }

    fn insert_disclosure(&self, draft: &DisclosureDraft) -> ClinauditResult<i64> {
        let mut state = self.try_lock()?;
        state.last_disclosure_id += 1;
        let id = state.last_disclosure_id;
        state.disclosures.push(Disclosure::from_draft(id, draft.clone()));
        Ok(id)
    }

    fn update_disclosure(&self, id: i64, edit: &DisclosureEdit) -> ClinauditResult<()> {
        let mut state = self.try_lock()?;
        let disclosure = state
            .disclosures
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| ClinauditError::StorageError {
                reason: format!("no disclosure with id {}", id),
            })?;
        disclosure.apply(edit.clone());
        Ok(())
    }

    fn delete_disclosure(&self, id: i64) -> ClinauditResult<()> {
        let mut state = self.try_lock()?;
        let before = state.disclosures.len();
        state.disclosures.retain(|d| d.id != id);
        if state.disclosures.len() == before {
            return Err(ClinauditError::StorageError {
                reason: format!("no disclosure with id {}", id),
            });
        }
        Ok(())
    }

    fn query_disclosures(&self, query: &DisclosureQuery) -> ClinauditResult<Vec<Disclosure>> {
        let state = self.try_lock()?;
        let mut rows: Vec<Disclosure> = state
            .disclosures
            .iter()
            .filter(|d| d.date >= query.start && d.date <= query.end)
            .filter(|d| query.user.as_ref().map_or(true, |u| &d.user == u))
            .filter(|d| query.patient_id.map_or(true, |p| d.patient_id == p))
            .filter(|d| {
                query
                    .event_prefix
                    .as_ref()
                    .map_or(true, |p| d.event_type.starts_with(p.as_str()))
            })
            .cloned()
            .collect();

        if let Some(column) = query.order {
            rows.sort_by(|a, b| compare_disclosures(a, b, column).reverse());
        }

        rows.truncate(query.limit);
        Ok(rows)
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.lock().last_insert_id
    }

    fn fetch_row(&self, table: &str, key_column: &str, key: &str) -> ClinauditResult<Option<Row>> {
        let state = self.try_lock()?;
        let Some(rows) = state.tables.get(table) else {
            return Err(ClinauditError::StorageError {
                reason: format!("table '{}' does not exist", table),
            });
        };
        Ok(rows
            .iter()
            .find(|row| column_value(row, key_column) == Some(key))
            .cloned())
    }

    fn is_group_member(&self, user: &str, group: &str) -> ClinauditResult<bool> {
        let state = self.try_lock()?;
        Ok(state
            .memberships
            .iter()
            .any(|(u, g)| u == user && g == group))
    }

    fn portal_menu_item_id(&self, menu_item: &str) -> ClinauditResult<Option<i64>> {
        Ok(self.try_lock()?.menu_items.get(menu_item).copied())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn column_value<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.iter()
        .find(|(name, _)| name == column)
        .and_then(|(_, value)| value.as_deref())
}

fn compare_events(a: &AuditEvent, b: &AuditEvent, column: EventSortColumn) -> Ordering {
    match column {
        EventSortColumn::Date => a.timestamp.cmp(&b.timestamp),
        EventSortColumn::Event => a.event.cmp(&b.event),
        EventSortColumn::Category => a.category.cmp(&b.category),
        EventSortColumn::User => a.user.cmp(&b.user),
        EventSortColumn::Group => a.group.cmp(&b.group),
        EventSortColumn::PatientId => a.patient_id.cmp(&b.patient_id),
        EventSortColumn::Success => a.success.cmp(&b.success),
        EventSortColumn::Comments => a.comments.cmp(&b.comments),
        EventSortColumn::Checksum => a.checksum.cmp(&b.checksum),
        EventSortColumn::SourceIdentity => a.source_identity.cmp(&b.source_identity),
        EventSortColumn::Id => a.id.cmp(&b.id),
    }
}

fn compare_disclosures(a: &Disclosure, b: &Disclosure, column: DisclosureSortColumn) -> Ordering {
    match column {
        DisclosureSortColumn::Date => a.date.cmp(&b.date),
        DisclosureSortColumn::Event => a.event_type.cmp(&b.event_type),
        DisclosureSortColumn::User => a.user.cmp(&b.user),
        DisclosureSortColumn::Recipient => a.recipient.cmp(&b.recipient),
        DisclosureSortColumn::PatientId => a.patient_id.cmp(&b.patient_id),
        DisclosureSortColumn::Description => a.description.cmp(&b.description),
    }
}
