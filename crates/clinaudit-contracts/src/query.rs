//! Filters and resolved queries for reading the audit trail back.
//!
//! Callers fill an `EventFilter` with loosely-typed parameters.  The query
//! service in `clinaudit-audit` resolves it into an `EventQuery` or a
//! `DisclosureQuery`, which is what a `RecordStore` executes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Maximum number of rows a single query returns.
pub const MAX_QUERY_ROWS: usize = 5000;

/// Which log stream a filter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogStream {
    #[default]
    Audit,
    Disclosure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Caller-facing query parameters.  Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Inclusive lower bound; defaults to the start of today.
    pub start_date: Option<NaiveDateTime>,

    /// Inclusive upper bound; defaults to the end of today.
    pub end_date: Option<NaiveDateTime>,
    pub user: Option<String>,
    pub patient_id: Option<i64>,

    /// Column name to sort by, validated against the target stream.
    pub sort_column: Option<String>,
    pub sort_direction: Option<SortDirection>,

    /// Keep only event keys starting with this text.
    pub event_prefix: Option<String>,

    /// Keep only event keys ending with this text.  Audit stream only.
    pub event_suffix: Option<String>,

    #[serde(default)]
    pub stream: LogStream,
}

/// Sortable columns of the audit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSortColumn {
    Date,
    Event,
    Category,
    User,
    Group,
    PatientId,
    Success,
    Comments,
    Checksum,
    SourceIdentity,
    Id,
}

impl EventSortColumn {
    /// Parse a storage column name (`groupname`, `crt_user`, ...).
    pub fn parse(column: &str) -> Option<Self> {
        let col = match column {
            "date" => Self::Date,
            "event" => Self::Event,
            "category" => Self::Category,
            "user" => Self::User,
            "groupname" => Self::Group,
            "patient_id" => Self::PatientId,
            "success" => Self::Success,
            "comments" => Self::Comments,
            "checksum" => Self::Checksum,
            "crt_user" => Self::SourceIdentity,
            "id" => Self::Id,
            _ => return None,
        };
        Some(col)
    }
}

/// Sortable columns of the disclosure stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisclosureSortColumn {
    Date,
    Event,
    User,
    Recipient,
    PatientId,
    Description,
}

/// Outcome of mapping an audit-stream column name onto the disclosure stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisclosureColumn {
    Sortable(DisclosureSortColumn),

    /// The audit column has no disclosure counterpart; sorting is dropped.
    Ignored,
}

impl DisclosureSortColumn {
    /// Map a column name as callers use it for the audit stream.
    ///
    /// `comments` maps to the description, while `groupname`, `success`,
    /// `checksum`, and `category` do not exist in the disclosure stream.
    pub fn parse(column: &str) -> Option<DisclosureColumn> {
        let col = match column {
            "date" => Self::Date,
            "event" => Self::Event,
            "user" => Self::User,
            "recipient" => Self::Recipient,
            "patient_id" => Self::PatientId,
            "description" | "comments" => Self::Description,
            "groupname" | "success" | "checksum" | "category" => {
                return Some(DisclosureColumn::Ignored)
            }
            _ => return None,
        };
        Some(DisclosureColumn::Sortable(col))
    }
}

/// A validated audit-stream query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub user: Option<String>,
    pub patient_id: Option<i64>,
    pub event_prefix: Option<String>,
    pub event_suffix: Option<String>,
    pub order: Option<(EventSortColumn, SortDirection)>,
    pub limit: usize,
}

/// A validated disclosure-stream query.  Ordering is always descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub user: Option<String>,
    pub patient_id: Option<i64>,
    pub event_prefix: Option<String>,
    pub order: Option<DisclosureSortColumn>,
    pub limit: usize,
}
