//! # clinaudit-classify
//!
//! A TOML-driven classifier that maps raw SQL text to an event class and a
//! display category.
//!
//! ## Overview
//!
//! This crate provides [`RuleClassifier`], which implements the
//! [`Classifier`](clinaudit_core::traits::Classifier) trait.  The table map
//! and the refinement rules live in `policies/categories.toml`, compiled in
//! as the built-in rule set.  Operators can load their own file instead.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use clinaudit_classify::RuleClassifier;
//!
//! let classifier = RuleClassifier::builtin()?;
//! // Pass `classifier` to `clinaudit_core::AuditLogger::new(...)`.
//! ```
//!
//! ## Matching
//!
//! Table names are case-sensitive substrings of the statement, searched
//! only before the WHERE / SET / VALUES clause.  Both lists are applied in
//! declaration order; the first match wins.

pub mod classifier;
pub mod rule;

pub use classifier::RuleClassifier;
pub use rule::{CategoryConfig, CategoryRule, ExplicitNarrowing, MarkerCategory, TableEntry};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use clinaudit_contracts::{
        classification::{EventClass, QueryType},
        error::ClinauditError,
    };
    use clinaudit_core::traits::Classifier;

    use crate::RuleClassifier;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn builtin() -> RuleClassifier {
        RuleClassifier::builtin().expect("built-in rules must parse")
    }

    // ── 1. table map ──────────────────────────────────────────────────────────

    /// Every mapped table, written to on its own, lands in its mapped class.
    #[test]
    fn test_every_mapped_table_classifies_to_its_class() {
        let classifier = builtin();
        for entry in &classifier.config().tables {
            let stmt = format!("UPDATE {} SET x = 1 WHERE id = 1", entry.name);
            let c = classifier.classify(&stmt);
            assert_eq!(
                c.event_class, entry.event,
                "table '{}' should classify as {}",
                entry.name, entry.event
            );
        }
    }

    #[test]
    fn test_patient_data_update_is_demographics() {
        let c = builtin().classify("UPDATE patient_data SET DOB='1990-01-01' WHERE id = 42");
        assert_eq!(c.query_type, QueryType::Update);
        assert_eq!(c.table.as_deref(), Some("patient_data"));
        assert_eq!(c.event_class, EventClass::PatientRecord);
        assert_eq!(c.category, "Patient Demographics");
        assert_eq!(c.event_key(), "patient-record-update");
    }

    /// Table names inside the WHERE clause of a SELECT are not considered.
    #[test]
    fn test_table_in_where_clause_is_ignored() {
        let c = builtin().classify("SELECT * FROM globals WHERE gl_name = 'patient_data'");
        assert_eq!(c.event_class, EventClass::Other);
        assert_eq!(c.category, "other");
        assert!(c.table.is_none());
    }

    #[test]
    fn test_table_in_set_clause_is_ignored() {
        let c = builtin().classify("UPDATE globals SET gl_value='prescriptions' WHERE id=1");
        assert_eq!(c.event_class, EventClass::Other);
    }

    #[test]
    fn test_prescriptions_are_orders() {
        let c = builtin().classify("INSERT INTO prescriptions (patient_id, drug) VALUES (7, 'x')");
        assert_eq!(c.event_class, EventClass::Order);
        assert_eq!(c.category, "Medication");
        assert_eq!(c.event_key(), "order-insert");
    }

    #[test]
    fn test_lab_tables() {
        let classifier = builtin();
        let order = classifier.classify("INSERT INTO procedure_order_code (procedure_code) VALUES ('x')");
        assert_eq!(order.event_class, EventClass::LabOrder);
        assert_eq!(order.category, "Lab Order");

        let result = classifier.classify("SELECT * FROM procedure_result WHERE id = 3");
        assert_eq!(result.event_class, EventClass::LabResults);
        assert_eq!(result.category, "Lab Result");
        assert_eq!(result.event_key(), "lab-results-select");
    }

    #[test]
    fn test_security_tables_fall_back_to_security() {
        let c = builtin().classify("UPDATE users SET active=0 WHERE id=3");
        assert_eq!(c.event_class, EventClass::SecurityAdministration);
        assert_eq!(c.category, "Security");
    }

    #[test]
    fn test_calendar_events_are_scheduling() {
        let c = builtin().classify("DELETE FROM openemr_postcalendar_events WHERE pc_eid = 9");
        assert_eq!(c.event_class, EventClass::Scheduling);
        assert_eq!(c.category, "Scheduling");
    }

    // ── 2. form tables ────────────────────────────────────────────────────────

    #[test]
    fn test_mapped_form_tables_keep_their_category() {
        let classifier = builtin();
        assert_eq!(
            classifier.classify("INSERT INTO form_vitals (bps) VALUES (120)").category,
            "Vitals"
        );
        assert_eq!(
            classifier.classify("UPDATE form_encounter SET reason='x' WHERE id=1").category,
            "Encounter Form"
        );
    }

    /// An unmapped `form_*` table is a patient record on an encounter form.
    #[test]
    fn test_unmapped_form_table_is_patient_record() {
        let c = builtin().classify("INSERT INTO form_physical_exam (forms_id, line_id) VALUES (3, 'x')");
        assert_eq!(c.event_class, EventClass::PatientRecord);
        assert_eq!(c.table.as_deref(), Some("form_physical_exam"));
        assert_eq!(c.category, "Encounter Form");
    }

    // ── 3. marker refinement ──────────────────────────────────────────────────

    #[test]
    fn test_lists_are_narrowed_by_type_marker() {
        let classifier = builtin();
        let cases = [
            ("medical_problem", "Problem List"),
            ("medication", "Medication"),
            ("allergy", "Allergy"),
        ];
        for (marker, expected) in cases {
            let stmt = format!("INSERT INTO lists (type, title) VALUES ('{marker}', 'x')");
            assert_eq!(classifier.classify(&stmt).category, expected, "marker {marker}");
        }
    }

    #[test]
    fn test_lists_without_marker_keep_class_name() {
        let c = builtin().classify("UPDATE lists SET title='x' WHERE id=4");
        assert_eq!(c.category, "patient-record");
    }

    #[test]
    fn test_lists_touch_is_narrowed_from_bound_values() {
        let classifier = builtin();
        let stmt = "INSERT INTO lists_touch (pid, type) VALUES (?, ?)";
        let comment = format!("{stmt} ('7','allergy')");
        let c = classifier.classify_with_comment(stmt, &comment);
        assert_eq!(c.table.as_deref(), Some("lists"));
        assert_eq!(c.category, "Allergy");
    }

    #[test]
    fn test_transactions_referral_requires_marker() {
        let classifier = builtin();
        let referral = classifier.classify(
            "INSERT INTO transactions (title, pid) VALUES ('LBTref', 7)",
        );
        assert_eq!(referral.category, "Referral");

        let plain = classifier.classify(
            "INSERT INTO transactions (title, pid) VALUES ('LBTptreq', 7)",
        );
        assert_eq!(plain.category, "patient-record");
    }

    /// Delete statements keep their full text, so the marker after `where`
    /// still narrows the category.
    #[test]
    fn test_delete_from_lists_is_narrowed_by_marker() {
        let classifier = builtin();

        let marked = classifier.classify("DELETE FROM lists WHERE type='medication' AND pid=3");
        assert_eq!(marked.query_type, QueryType::Delete);
        assert_eq!(marked.event_class, EventClass::PatientRecord);
        assert_eq!(marked.category, "Medication");

        let unmarked = classifier.classify("DELETE FROM lists WHERE id=3");
        assert_eq!(unmarked.event_class, EventClass::PatientRecord);
        assert_eq!(unmarked.category, "patient-record");
    }

    // ── 4. explicit events ────────────────────────────────────────────────────

    #[test]
    fn test_explicit_event_category_is_event_key() {
        let classifier = builtin();
        assert_eq!(classifier.categorize_explicit("login", "success"), "login");
        assert_eq!(
            classifier.categorize_explicit("security-administration", "acl change"),
            "Security"
        );
    }

    #[test]
    fn test_explicit_delete_of_list_item_is_narrowed() {
        let classifier = builtin();
        assert_eq!(
            classifier.categorize_explicit("delete", "lists: id 12 type 'medical_problem' removed"),
            "Problem List"
        );
        assert_eq!(
            classifier.categorize_explicit("delete", "pnotes: id 12 type 'medication'"),
            "delete"
        );
    }

    // ── 5. configuration ──────────────────────────────────────────────────────

    #[test]
    fn test_custom_rules_from_toml() {
        let toml = r#"
            [[tables]]
            name = "encounter_notes"
            event = "patient-record"

            [[rules]]
            id = "notes"
            tables = ["encounter_notes"]
            category = "Progress Notes"
        "#;
        let classifier = RuleClassifier::from_toml_str(toml).unwrap();
        let c = classifier.classify("UPDATE encounter_notes SET body='x' WHERE id=1");
        assert_eq!(c.category, "Progress Notes");
        assert_eq!(classifier.classify("UPDATE patient_data SET x=1").event_class, EventClass::Other);
    }

    #[test]
    fn test_malformed_rules_are_config_errors() {
        let result = RuleClassifier::from_toml_str("[[tables]]\nname = 'x'\nevent = 'nonsense'");
        match result {
            Err(ClinauditError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse classification TOML"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_rules_file_is_config_error() {
        let result = RuleClassifier::from_file(std::path::Path::new("/nonexistent/categories.toml"));
        assert!(matches!(result, Err(ClinauditError::ConfigError { .. })));
    }
}
