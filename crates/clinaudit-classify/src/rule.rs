//! Classification rule types and configuration schema.
//!
//! A `CategoryConfig` is deserialized from TOML and holds three ordered
//! lists: the table map, the category refinement rules, and the explicit
//! event narrowings.  Every list is first-match-wins.

use serde::{Deserialize, Serialize};

use clinaudit_contracts::classification::EventClass;

/// One entry of the table map.
///
/// Example in TOML:
/// ```toml
/// [[tables]]
/// name = "patient_data"
/// event = "patient-record"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Physical table name, matched as a case-sensitive substring.
    pub name: String,

    pub event: EventClass,
}

/// A category refinement rule.
///
/// Every condition that is present must hold for the rule to match.  A rule
/// with no conditions at all never matches.
///
/// Example in TOML:
/// ```toml
/// [[rules]]
/// id = "referral"
/// tables = ["transactions"]
/// marker = "LBTref"
/// category = "Referral"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Stable identifier used in logs.
    pub id: String,

    /// The matched table must be one of these names.
    #[serde(default)]
    pub tables: Vec<String>,

    /// The matched table must start with this prefix.
    #[serde(default)]
    pub table_prefix: Option<String>,

    /// The event class (SQL path) or event key (explicit path) must equal
    /// this value.
    #[serde(default)]
    pub event: Option<String>,

    /// Splitting the comment on `'`, starting at the first case-insensitive
    /// occurrence of the table name, must yield a segment exactly equal to
    /// this marker.
    #[serde(default)]
    pub marker: Option<String>,

    /// Display category produced on a match.
    pub category: String,
}

impl CategoryRule {
    /// Whether this rule applies to `table` / `event` with comment `comment`.
    pub fn matches(&self, table: &str, event: &str, comment: &str) -> bool {
        if self.tables.is_empty() && self.table_prefix.is_none() && self.event.is_none() {
            return false;
        }

        if !self.tables.is_empty() && !self.tables.iter().any(|t| t == table) {
            return false;
        }

        if let Some(prefix) = &self.table_prefix {
            if !table.starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(expected) = &self.event {
            if expected != event {
                return false;
            }
        }

        match &self.marker {
            Some(marker) => has_marker(comment, table, marker),
            None => true,
        }
    }
}

/// A marker → category pair used by explicit narrowings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCategory {
    pub marker: String,
    pub category: String,
}

/// Narrowing applied to explicitly logged events.
///
/// Example in TOML:
/// ```toml
/// [[explicit]]
/// event = "delete"
/// comment_prefix = "lists:"
/// markers = [{ marker = "allergy", category = "Allergy" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitNarrowing {
    /// Event key this narrowing applies to.
    pub event: String,

    /// The comment must start with this literal (case-sensitive).
    pub comment_prefix: String,

    /// Tried in order against the `'`-separated segments of the comment.
    pub markers: Vec<MarkerCategory>,
}

impl ExplicitNarrowing {
    /// The narrowed category, if this narrowing applies.
    pub fn narrow(&self, event: &str, comments: &str) -> Option<&str> {
        if event != self.event || !comments.starts_with(self.comment_prefix.as_str()) {
            return None;
        }
        self.markers
            .iter()
            .find(|m| comments.split('\'').any(|segment| segment == m.marker))
            .map(|m| m.category.as_str())
    }
}

/// The top-level structure deserialized from a TOML classification file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Ordered table map.  First substring hit wins.
    pub tables: Vec<TableEntry>,

    /// Ordered refinement rules.  First match wins.
    #[serde(default)]
    pub rules: Vec<CategoryRule>,

    #[serde(default)]
    pub explicit: Vec<ExplicitNarrowing>,
}

/// Whether `marker` is a whole `'`-delimited segment of `comment`, searching
/// from the first case-insensitive occurrence of `table`.
///
/// An empty `table` searches the whole comment.
fn has_marker(comment: &str, table: &str, marker: &str) -> bool {
    let from = if table.is_empty() {
        0
    } else {
        match comment
            .to_ascii_lowercase()
            .find(&table.to_ascii_lowercase())
        {
            Some(at) => at,
            None => return false,
        }
    };
    comment[from..].split('\'').any(|segment| segment == marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(tables: &[&str], marker: Option<&str>) -> CategoryRule {
        CategoryRule {
            id: "test".to_string(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
            table_prefix: None,
            event: None,
            marker: marker.map(str::to_string),
            category: "Test".to_string(),
        }
    }

    #[test]
    fn marker_must_be_a_whole_quoted_segment() {
        let r = rule(&["lists"], Some("allergy"));
        assert!(r.matches("lists", "patient-record", "INSERT INTO lists (type) VALUES ('allergy')"));
        assert!(!r.matches(
            "lists",
            "patient-record",
            "INSERT INTO lists (type) VALUES ('allergy_note')"
        ));
    }

    #[test]
    fn marker_before_table_name_is_ignored() {
        let r = rule(&["transactions"], Some("LBTref"));
        assert!(!r.matches(
            "transactions",
            "patient-record",
            "/* 'LBTref' */ UPDATE transactions SET title='x'"
        ));
        assert!(r.matches(
            "transactions",
            "patient-record",
            "UPDATE TRANSACTIONS SET title='LBTref' WHERE id=1"
        ));
    }

    #[test]
    fn empty_rule_never_matches() {
        let r = rule(&[], None);
        assert!(!r.matches("patient_data", "patient-record", ""));
    }

    #[test]
    fn explicit_narrowing_requires_prefix() {
        let n = ExplicitNarrowing {
            event: "delete".to_string(),
            comment_prefix: "lists:".to_string(),
            markers: vec![MarkerCategory {
                marker: "medication".to_string(),
                category: "Medication".to_string(),
            }],
        };
        assert_eq!(n.narrow("delete", "lists: 12 type 'medication'"), Some("Medication"));
        assert_eq!(n.narrow("delete", "removed lists: 'medication'"), None);
        assert_eq!(n.narrow("view", "lists: 'medication'"), None);
    }
}
