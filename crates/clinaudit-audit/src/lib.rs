//! # clinaudit-audit
//!
//! Persistence side of the clinaudit trail.
//!
//! ## Overview
//!
//! - [`StoreAuditWriter`] writes each event followed by its tamper-evidence
//!   record, encrypting comments when configured.
//! - [`tamper_checksum`] / [`verify_event`] compute and check the SHA-1
//!   that commits to an update event's own fields.
//! - [`get_events`] reads either log stream back with validated filters.
//! - [`DisclosureLog`] records, edits, and deletes patient disclosures.
//! - [`InMemoryRecordStore`] is the reference `RecordStore`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinaudit_audit::{get_events, InMemoryRecordStore, StoreAuditWriter};
//!
//! let store = Arc::new(InMemoryRecordStore::new());
//! let writer = StoreAuditWriter::from_settings(&settings, store.clone(), None)?;
//! // Pass `writer` to `clinaudit_core::AuditLogger::new(...)`.
//!
//! let rows = get_events(store.as_ref(), &EventFilter::default())?;
//! ```

pub mod disclosure;
pub mod hash;
pub mod memory;
pub mod query;
pub mod writer;

pub use disclosure::DisclosureLog;
pub use hash::{tamper_checksum, verify_event, verify_stored_event, Integrity};
pub use memory::InMemoryRecordStore;
pub use query::{get_events, EventQueryResult};
pub use writer::StoreAuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use clinaudit_classify::RuleClassifier;
    use clinaudit_contracts::{
        disclosure::{Disclosure, DisclosureDraft, DisclosureEdit},
        error::{ClinauditError, ClinauditResult},
        event::{now_seconds, AuditContext, AuditDraft, AuditEvent, TamperEvidenceRecord},
        query::{DisclosureQuery, EventFilter, EventQuery, LogStream, SortDirection, MAX_QUERY_ROWS},
        settings::{AuditSettings, EventClassToggles},
    };
    use clinaudit_core::{
        checksum::row_digest,
        traits::{AuditWriter, Encryptor, NullTransport, RecordStore, Row},
        AuditLogger, ExplicitEvent, LogOutcome, SuppressReason,
    };

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Reversible stand-in for the encryption capability.
    struct PrefixEncryptor;

    impl Encryptor for PrefixEncryptor {
        fn encrypt(&self, plaintext: &str) -> ClinauditResult<String> {
            Ok(format!("enc:{}", plaintext.chars().rev().collect::<String>()))
        }

        fn decrypt(&self, ciphertext: &str) -> ClinauditResult<String> {
            ciphertext
                .strip_prefix("enc:")
                .map(|s| s.chars().rev().collect())
                .ok_or_else(|| ClinauditError::EncryptionFailed {
                    reason: "not produced by PrefixEncryptor".to_string(),
                })
        }
    }

    /// Delegates to an in-memory store but refuses tamper records.
    struct NoTamperStore(InMemoryRecordStore);

    impl RecordStore for NoTamperStore {
        fn insert_event(&self, draft: &AuditDraft) -> ClinauditResult<i64> {
            self.0.insert_event(draft)
        }
        fn insert_tamper_record(&self, _record: &TamperEvidenceRecord) -> ClinauditResult<()> {
            Err(ClinauditError::StorageError {
                reason: "log_comment_encrypt is read-only".to_string(),
            })
        }
        fn tamper_record(&self, log_id: i64) -> ClinauditResult<Option<TamperEvidenceRecord>> {
            self.0.tamper_record(log_id)
        }
        fn query_events(&self, query: &EventQuery) -> ClinauditResult<Vec<AuditEvent>> {
            self.0.query_events(query)
        }
        fn insert_disclosure(&self, draft: &DisclosureDraft) -> ClinauditResult<i64> {
            self.0.insert_disclosure(draft)
        }
        fn update_disclosure(&self, id: i64, edit: &DisclosureEdit) -> ClinauditResult<()> {
            self.0.update_disclosure(id, edit)
        }
        fn delete_disclosure(&self, id: i64) -> ClinauditResult<()> {
            self.0.delete_disclosure(id)
        }
        fn query_disclosures(&self, query: &DisclosureQuery) -> ClinauditResult<Vec<Disclosure>> {
            self.0.query_disclosures(query)
        }
        fn last_insert_id(&self) -> Option<i64> {
            self.0.last_insert_id()
        }
        fn fetch_row(&self, table: &str, key_column: &str, key: &str) -> ClinauditResult<Option<Row>> {
            self.0.fetch_row(table, key_column, key)
        }
        fn is_group_member(&self, user: &str, group: &str) -> ClinauditResult<bool> {
            self.0.is_group_member(user, group)
        }
        fn portal_menu_item_id(&self, menu_item: &str) -> ClinauditResult<Option<i64>> {
            self.0.portal_menu_item_id(menu_item)
        }
    }

    fn enabled() -> AuditSettings {
        AuditSettings {
            enable_auditlog: true,
            audit_events: EventClassToggles::all(),
            ..AuditSettings::default()
        }
    }

    fn logger_with_writer(
        settings: AuditSettings,
        store: Arc<dyn RecordStore>,
        writer: StoreAuditWriter,
    ) -> AuditLogger {
        AuditLogger::new(
            settings,
            store,
            Box::new(RuleClassifier::builtin().unwrap()),
            Box::new(writer),
            Box::new(NullTransport),
        )
    }

    fn logger(settings: AuditSettings, store: &InMemoryRecordStore) -> AuditLogger {
        let store: Arc<dyn RecordStore> = Arc::new(store.clone());
        logger_with_writer(settings, store.clone(), StoreAuditWriter::new(store))
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.to_string())))
            .collect()
    }

    fn patient_42() -> Row {
        row(&[("id", "42"), ("fname", "Ann"), ("DOB", "1990-01-01")])
    }

    fn ctx() -> AuditContext {
        AuditContext::new("alice", "Default").with_patient(42)
    }

    fn around_now() -> EventFilter {
        EventFilter {
            start_date: Some(now_seconds() - Duration::hours(1)),
            end_date: Some(now_seconds() + Duration::hours(1)),
            ..EventFilter::default()
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn draft_at(timestamp: NaiveDateTime, event: &str, user: &str, patient_id: i64) -> AuditDraft {
        AuditDraft {
            timestamp,
            event: event.to_string(),
            category: "test".to_string(),
            user: user.to_string(),
            group: "Default".to_string(),
            patient_id,
            success: true,
            comments: String::new(),
            checksum: String::new(),
            source_identity: String::new(),
            log_from: Default::default(),
            menu_item_id: None,
            ccda_doc_id: None,
            query_type: None,
        }
    }

    fn disclosure(day: u32, event_type: &str, recipient: &str, description: &str) -> DisclosureDraft {
        DisclosureDraft {
            date: at(day, 9),
            event_type: event_type.to_string(),
            patient_id: 7,
            recipient: recipient.to_string(),
            description: description.to_string(),
            user: "clerk".to_string(),
        }
    }

    // ── 1. end-to-end logging ─────────────────────────────────────────────────

    /// The patient demographics update scenario: row 42 is re-read and
    /// hashed, the category is refined, and the event reads back intact.
    #[test]
    fn test_patient_update_round_trip() {
        let store = InMemoryRecordStore::new();
        store.put_row("patient_data", "id", patient_42(), false);
        let logger = logger(enabled(), &store);

        let outcome = logger
            .log_sql_event(&ctx(), "UPDATE patient_data SET DOB='1990-01-01' WHERE id = 42", true, None)
            .unwrap();
        let written = outcome.event().expect("update must be recorded").clone();
        assert_eq!(written.checksum, row_digest(&patient_42()));

        let rows = get_events(&store, &around_now()).unwrap().into_events().unwrap();
        assert_eq!(rows.len(), 1);
        let read = &rows[0];
        assert_eq!(read.user, "alice");
        assert_eq!(read.event, "patient-record-update");
        assert_eq!(read.category, "Patient Demographics");
        assert_eq!(read.patient_id, 42);
        assert!(read.success);
    }

    /// An update event gets a tamper checksum that verifies until the stored
    /// event is altered.
    #[test]
    fn test_update_event_is_tamper_evident() {
        let store = InMemoryRecordStore::new();
        store.put_row("patient_data", "id", patient_42(), false);
        let logger = logger(enabled(), &store);

        let event = logger
            .log_sql_event(&ctx(), "UPDATE patient_data SET fname='Ann' WHERE id=42", true, None)
            .unwrap()
            .event()
            .cloned()
            .unwrap();

        let record = store.tamper_record(event.id).unwrap().unwrap();
        assert_eq!(record.version, 3);
        assert!(!record.encrypted);
        assert_eq!(record.checksum, tamper_checksum(&event));
        assert_eq!(verify_stored_event(&store, &event).unwrap(), Integrity::Intact);

        let mut altered = event.clone();
        altered.comments = "UPDATE patient_data SET fname='Bob' WHERE id=42".to_string();
        assert!(
            matches!(verify_event(&altered, &record), Integrity::Tampered { .. }),
            "edited comment must break the tamper checksum"
        );
    }

    /// Inserts get a tamper record too, but without a checksum.
    #[test]
    fn test_insert_tamper_record_has_no_checksum() {
        let store = InMemoryRecordStore::new();
        store.put_row(
            "lists",
            "id",
            row(&[("id", "12"), ("type", "allergy"), ("title", "penicillin")]),
            true,
        );
        let logger = logger(enabled(), &store);

        let event = logger
            .log_sql_event(
                &ctx(),
                "INSERT INTO lists (type, title) VALUES ('allergy', 'penicillin')",
                true,
                None,
            )
            .unwrap()
            .event()
            .cloned()
            .unwrap();

        assert_eq!(event.category, "Allergy");
        assert_eq!(event.checksum, row_digest(&store.fetch_row("lists", "id", "12").unwrap().unwrap()));
        assert_eq!(verify_stored_event(&store, &event).unwrap(), Integrity::NoChecksum);
        assert_eq!(store.tamper_records().len(), 1, "one tamper record per event");
    }

    /// Mapping tables without auto-increment resolve the key from the
    /// statement itself.
    #[test]
    fn test_mapping_table_insert_uses_literal_key() {
        let store = InMemoryRecordStore::new();
        let mapping = row(&[("acl_id", "14"), ("section_value", "users"), ("value", "bob")]);
        store.put_row("gacl_aro_map", "acl_id", mapping.clone(), false);
        let logger = logger(enabled(), &store);

        let event = logger
            .log_sql_event(
                &ctx(),
                "INSERT INTO gacl_aro_map (acl_id, section_value, value) VALUES (14, 'users', 'bob')",
                true,
                None,
            )
            .unwrap()
            .event()
            .cloned()
            .unwrap();

        assert_eq!(event.event, "security-administration-insert");
        assert_eq!(event.category, "Security");
        assert_eq!(event.patient_id, 0);
        assert_eq!(event.checksum, row_digest(&mapping));
    }

    /// A row that vanished before the re-read leaves the checksum empty but
    /// the event is still logged.
    #[test]
    fn test_missing_row_still_logs_with_empty_checksum() {
        let store = InMemoryRecordStore::new();
        store.put_row("patient_data", "id", patient_42(), false);
        store.remove_row("patient_data", "id", "42");
        let logger = logger(enabled(), &store);

        let outcome = logger
            .log_sql_event(&ctx(), "UPDATE patient_data SET fname='Ann' WHERE id=42", true, None)
            .unwrap();
        assert_eq!(outcome.event().unwrap().checksum, "");
    }

    // ── 2. gates against a real store ─────────────────────────────────────────

    /// With auditing off and no override, nothing reaches the store.
    #[test]
    fn test_suppression_writes_nothing() {
        let store = InMemoryRecordStore::new();
        store.put_row("patient_data", "id", patient_42(), false);
        let settings = AuditSettings {
            enable_auditlog: false,
            gbl_force_log_breakglass: false,
            audit_events_query: true,
            ..enabled()
        };
        let logger = logger(settings, &store);

        for stmt in [
            "UPDATE patient_data SET DOB='1990-01-01' WHERE id = 42",
            "INSERT INTO users (username) VALUES ('bob')",
            "SELECT * FROM prescriptions WHERE patient_id=7",
            "DELETE FROM pnotes WHERE id=3",
        ] {
            logger.log_sql_event(&ctx(), stmt, true, None).unwrap();
        }
        logger.log_event(&ctx(), ExplicitEvent::new("login", true)).unwrap();

        assert!(store.events().is_empty(), "no event may be persisted");
        assert!(store.tamper_records().is_empty());
    }

    /// A breakglass user is logged with every gate closed.
    #[test]
    fn test_breakglass_override_persists() {
        let store = InMemoryRecordStore::new();
        store.add_group_member("er-doc", "breakglass");
        let settings = AuditSettings {
            gbl_force_log_breakglass: true,
            ..AuditSettings::default()
        };
        let logger = logger(settings, &store);
        let er = AuditContext::new("er-doc", "Default").with_patient(7);

        let select = logger
            .log_sql_event(&er, "SELECT * FROM prescriptions WHERE patient_id=7", true, None)
            .unwrap();
        assert!(select.is_recorded(), "breakglass select must be recorded");
        assert_eq!(store.events()[0].event, "order-select");

        let regular = logger
            .log_sql_event(&ctx(), "SELECT * FROM prescriptions WHERE patient_id=7", true, None)
            .unwrap();
        assert_eq!(regular, LogOutcome::Suppressed(SuppressReason::AuditingDisabled));
        assert_eq!(store.events().len(), 1);
    }

    /// The prescriptions read scenario with query auditing disabled.
    #[test]
    fn test_select_without_query_auditing_is_not_persisted() {
        let store = InMemoryRecordStore::new();
        let logger = logger(enabled(), &store);

        let outcome = logger
            .log_sql_event(&ctx(), "SELECT * FROM prescriptions WHERE patient_id=7", true, None)
            .unwrap();
        assert_eq!(outcome, LogOutcome::Suppressed(SuppressReason::QueryAuditingDisabled));
        assert!(store.events().is_empty());
    }

    // ── 3. writer ─────────────────────────────────────────────────────────────

    #[test]
    fn test_comments_are_encrypted_when_enabled() {
        let store = InMemoryRecordStore::new();
        let shared: Arc<dyn RecordStore> = Arc::new(store.clone());
        let settings = AuditSettings {
            enable_auditlog_encryption: true,
            ..enabled()
        };
        let writer =
            StoreAuditWriter::from_settings(&settings, shared.clone(), Some(Arc::new(PrefixEncryptor)))
                .unwrap();
        assert!(writer.encrypts());
        let logger = logger_with_writer(settings, shared, writer);

        let event = logger
            .log_event(&ctx(), ExplicitEvent::new("view", true).with_comments("chart opened"))
            .unwrap()
            .event()
            .cloned()
            .unwrap();

        assert_ne!(event.comments, "chart opened");
        assert_eq!(PrefixEncryptor.decrypt(&event.comments).unwrap(), "chart opened");
        assert!(store.tamper_record(event.id).unwrap().unwrap().encrypted);
    }

    #[test]
    fn test_empty_comment_is_not_encrypted() {
        let store = InMemoryRecordStore::new();
        let shared: Arc<dyn RecordStore> = Arc::new(store.clone());
        let settings = AuditSettings {
            enable_auditlog_encryption: true,
            ..enabled()
        };
        let writer =
            StoreAuditWriter::from_settings(&settings, shared.clone(), Some(Arc::new(PrefixEncryptor)))
                .unwrap();
        let logger = logger_with_writer(settings, shared, writer);

        let event = logger
            .log_event(&ctx(), ExplicitEvent::new("login", true))
            .unwrap()
            .event()
            .cloned()
            .unwrap();

        assert_eq!(event.comments, "");
        assert!(
            !store.tamper_record(event.id).unwrap().unwrap().encrypted,
            "nothing was encrypted, so the record must say so"
        );
    }

    #[test]
    fn test_encryption_without_encryptor_is_config_error() {
        let settings = AuditSettings {
            enable_auditlog_encryption: true,
            ..AuditSettings::default()
        };
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
        let result = StoreAuditWriter::from_settings(&settings, store, None);
        assert!(matches!(result, Err(ClinauditError::ConfigError { .. })));
    }

    /// A failed second insert is reported and leaves the event in place.
    #[test]
    fn test_failed_tamper_record_keeps_event() {
        let inner = InMemoryRecordStore::new();
        let writer = StoreAuditWriter::new(Arc::new(NoTamperStore(inner.clone())));

        let result = writer.record(draft_at(now_seconds(), "login", "alice", 0));
        match result {
            Err(ClinauditError::TamperRecordFailed { log_id, .. }) => assert_eq!(log_id, 1),
            other => panic!("expected TamperRecordFailed, got {:?}", other),
        }

        let events = inner.events();
        assert_eq!(events.len(), 1, "event insert is not rolled back");
        assert_eq!(verify_stored_event(&inner, &events[0]).unwrap(), Integrity::MissingRecord);
    }

    #[test]
    fn test_setting_change_is_recorded_with_tamper_record() {
        let store = InMemoryRecordStore::new();
        let logger = logger(AuditSettings::default(), &store);

        let event = logger.log_setting_change(&ctx(), "enable_auditlog", false).unwrap();
        assert_eq!(event.comments, "Audit Logging Disabled.");
        assert_eq!(store.tamper_records()[0].log_id, event.id);
    }

    // ── 4. get_events ─────────────────────────────────────────────────────────

    fn seeded_store() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store.insert_event(&draft_at(at(1, 8), "patient-record-select", "alice", 3)).unwrap();
        store.insert_event(&draft_at(at(1, 9), "patient-record-update", "bob", 9)).unwrap();
        store.insert_event(&draft_at(at(1, 10), "order-update", "alice", 5)).unwrap();
        store.insert_event(&draft_at(at(2, 10), "login", "alice", 0)).unwrap();
        store
    }

    fn march_first() -> EventFilter {
        EventFilter {
            start_date: Some(at(1, 0)),
            end_date: Some(at(1, 23)),
            ..EventFilter::default()
        }
    }

    #[test]
    fn test_get_events_filters_by_range_user_and_event() {
        let store = seeded_store();

        let all = get_events(&store, &march_first()).unwrap();
        assert_eq!(all.len(), 3, "login on March 2 is outside the range");

        let filter = EventFilter {
            user: Some("alice".to_string()),
            event_prefix: Some("patient-record".to_string()),
            ..march_first()
        };
        let rows = get_events(&store, &filter).unwrap().into_events().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event, "patient-record-select");

        let filter = EventFilter {
            event_suffix: Some("-update".to_string()),
            ..march_first()
        };
        assert_eq!(get_events(&store, &filter).unwrap().len(), 2);
    }

    #[test]
    fn test_get_events_sorts_in_requested_direction() {
        let store = seeded_store();
        let filter = EventFilter {
            sort_column: Some("patient_id".to_string()),
            sort_direction: Some(SortDirection::Desc),
            ..march_first()
        };
        let rows = get_events(&store, &filter).unwrap().into_events().unwrap();
        let pids: Vec<i64> = rows.iter().map(|e| e.patient_id).collect();
        assert_eq!(pids, vec![9, 5, 3]);

        let filter = EventFilter {
            sort_column: Some("user".to_string()),
            ..march_first()
        };
        let rows = get_events(&store, &filter).unwrap().into_events().unwrap();
        assert_eq!(rows[0].user, "alice", "default direction is ascending");
        assert_eq!(rows[2].user, "bob");
    }

    #[test]
    fn test_get_events_rejects_unknown_sort_column() {
        let store = seeded_store();
        let filter = EventFilter {
            sort_column: Some("date desc; --".to_string()),
            ..march_first()
        };
        assert!(matches!(
            get_events(&store, &filter),
            Err(ClinauditError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_get_events_rejects_inverted_range() {
        let store = seeded_store();
        let filter = EventFilter {
            start_date: Some(at(2, 0)),
            end_date: Some(at(1, 0)),
            ..EventFilter::default()
        };
        assert!(matches!(
            get_events(&store, &filter),
            Err(ClinauditError::InvalidQuery { .. })
        ));
    }

    /// Events at noon two days ago, today, and tomorrow; the default range
    /// holds exactly one of the last two even if the query runs past midnight.
    #[test]
    fn test_get_events_defaults_to_today() {
        let store = InMemoryRecordStore::new();
        let noon = now_seconds().date().and_hms_opt(12, 0, 0).unwrap();
        let earlier = noon - Duration::days(2);
        let tomorrow = noon + Duration::days(1);
        for timestamp in [earlier, noon, tomorrow] {
            store.insert_event(&draft_at(timestamp, "login", "alice", 0)).unwrap();
        }

        let rows = get_events(&store, &EventFilter::default()).unwrap().into_events().unwrap();
        assert_eq!(rows.len(), 1, "default range covers a single day");
        assert!(
            rows[0].timestamp == noon || rows[0].timestamp == tomorrow,
            "unexpected row at {}",
            rows[0].timestamp
        );
    }

    #[test]
    fn test_get_events_caps_result_size() {
        let store = InMemoryRecordStore::new();
        for _ in 0..=MAX_QUERY_ROWS {
            store.insert_event(&draft_at(at(1, 12), "login", "alice", 0)).unwrap();
        }
        assert_eq!(get_events(&store, &march_first()).unwrap().len(), MAX_QUERY_ROWS);
    }

    // ── 5. disclosures ────────────────────────────────────────────────────────

    #[test]
    fn test_disclosure_lifecycle() {
        let store = InMemoryRecordStore::new();
        let log = DisclosureLog::new(Arc::new(store.clone()));

        let first = log
            .record(disclosure(1, "disclosure-treatment", "Dr. Who", "labs"))
            .unwrap();
        let second = log
            .record(disclosure(1, "disclosure-payment", "Insurer", "claims"))
            .unwrap();
        assert_ne!(first.id, second.id);

        log.update(
            first.id,
            DisclosureEdit {
                date: at(1, 11),
                event_type: "disclosure-treatment".to_string(),
                recipient: "Dr. Watson".to_string(),
                description: "labs and imaging".to_string(),
            },
        )
        .unwrap();
        log.delete(second.id).unwrap();

        let stored = store.disclosures();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].recipient, "Dr. Watson");
        assert_eq!(stored[0].user, "clerk", "recording user is fixed at creation");

        assert!(matches!(
            log.delete(second.id),
            Err(ClinauditError::StorageError { .. })
        ));
    }

    #[test]
    fn test_disclosure_stream_sorts_descending_and_maps_columns() {
        let store = InMemoryRecordStore::new();
        let log = DisclosureLog::new(Arc::new(store.clone()));
        log.record(disclosure(1, "disclosure-treatment", "A", "alpha")).unwrap();
        log.record(disclosure(1, "disclosure-treatment", "B", "gamma")).unwrap();
        log.record(disclosure(1, "disclosure-payment", "C", "beta")).unwrap();

        let filter = EventFilter {
            stream: LogStream::Disclosure,
            sort_column: Some("comments".to_string()),
            sort_direction: Some(SortDirection::Asc),
            ..march_first()
        };
        let rows = get_events(&store, &filter).unwrap().into_disclosures().unwrap();
        let descriptions: Vec<&str> = rows.iter().map(|d| d.description.as_str()).collect();
        assert_eq!(descriptions, vec!["gamma", "beta", "alpha"], "always descending");

        let filter = EventFilter {
            stream: LogStream::Disclosure,
            sort_column: Some("groupname".to_string()),
            event_prefix: Some("disclosure-treatment".to_string()),
            ..march_first()
        };
        let rows = get_events(&store, &filter).unwrap().into_disclosures().unwrap();
        assert_eq!(rows.len(), 2, "ignored sort column still returns rows");

        let filter = EventFilter {
            stream: LogStream::Disclosure,
            sort_column: Some("crt_user".to_string()),
            ..march_first()
        };
        assert!(matches!(
            get_events(&store, &filter),
            Err(ClinauditError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_store_exports_events_as_json() {
        let store = seeded_store();
        let json = store.export_json().unwrap();
        let parsed: Vec<AuditEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store.events());
    }
}
