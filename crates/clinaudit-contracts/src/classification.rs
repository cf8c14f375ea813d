//! Statement classification types.
//!
//! The classifier turns raw SQL text into a `Classification`: the query type
//! (first keyword), the matched table, the coarse `EventClass` taken from the
//! table map, and the refined display category.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The leading SQL keyword of a statement.
///
/// Anything that does not start with one of these keywords is treated as a
/// `Select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
    Update,
    Insert,
    Delete,
    Replace,
}

impl QueryType {
    /// Detection order used when matching the statement prefix.
    pub const ALL: [QueryType; 5] = [
        QueryType::Select,
        QueryType::Update,
        QueryType::Insert,
        QueryType::Delete,
        QueryType::Replace,
    ];

    /// Determine the query type from the statement prefix (case-insensitive).
    pub fn detect(statement: &str) -> Self {
        let head = statement.trim_start();
        Self::ALL
            .into_iter()
            .find(|qt| {
                let kw = qt.as_str();
                head.len() >= kw.len()
                    && head.is_char_boundary(kw.len())
                    && head[..kw.len()].eq_ignore_ascii_case(kw)
            })
            .unwrap_or(QueryType::Select)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Select => "select",
            QueryType::Update => "update",
            QueryType::Insert => "insert",
            QueryType::Delete => "delete",
            QueryType::Replace => "replace",
        }
    }

    /// Statements that write a row whose checksum can be taken afterwards.
    pub fn is_row_write(self) -> bool {
        matches!(self, QueryType::Update | QueryType::Insert | QueryType::Replace)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse compliance class of a table, as listed in the table map.
///
/// The kebab-case name doubles as the event key prefix
/// (`patient-record-update`) and as the key of the per-class toggle in
/// `[audit_events]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventClass {
    PatientRecord,
    SecurityAdministration,
    Scheduling,
    Order,
    LabOrder,
    LabResults,
    Other,
}

impl EventClass {
    pub fn as_str(self) -> &'static str {
        match self {
            EventClass::PatientRecord => "patient-record",
            EventClass::SecurityAdministration => "security-administration",
            EventClass::Scheduling => "scheduling",
            EventClass::Order => "order",
            EventClass::LabOrder => "lab-order",
            EventClass::LabResults => "lab-results",
            EventClass::Other => "other",
        }
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub query_type: QueryType,

    /// The table that decided the class, if any.  Clinical form tables that
    /// are not in the map are reported by their literal `form_*` name.
    pub table: Option<String>,

    pub event_class: EventClass,

    /// Refined display category, e.g. `Patient Demographics`.  Falls back to
    /// the event class name when no refinement rule applies.
    pub category: String,
}

impl Classification {
    /// The classification for statements that touch no known table.
    pub fn other(query_type: QueryType) -> Self {
        Self {
            query_type,
            table: None,
            event_class: EventClass::Other,
            category: EventClass::Other.as_str().to_string(),
        }
    }

    /// Event key recorded in the audit log, e.g. `patient-record-update`.
    pub fn event_key(&self) -> String {
        format!("{}-{}", self.event_class, self.query_type)
    }
}
