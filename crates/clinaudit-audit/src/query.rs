//! Reading the audit trail back (`get_events`).
//!
//! A caller-supplied `EventFilter` is resolved into a validated query for
//! one of the two streams and handed to the store:
//!
//! - Missing or blank text parameters are ignored.
//! - The date range defaults to the whole of today (UTC).
//! - Sort columns are validated against the target stream.  The audit
//!   stream sorts in the requested direction (ascending by default); the
//!   disclosure stream always sorts descending and silently drops audit
//!   columns it does not have.
//! - At most `MAX_QUERY_ROWS` rows are returned.

use chrono::{Duration, NaiveDateTime, NaiveTime, Utc};
use tracing::debug;

use clinaudit_contracts::{
    disclosure::Disclosure,
    error::{ClinauditError, ClinauditResult},
    event::AuditEvent,
    query::{
        DisclosureColumn, DisclosureQuery, DisclosureSortColumn, EventFilter, EventQuery,
        EventSortColumn, LogStream, MAX_QUERY_ROWS,
    },
};
use clinaudit_core::traits::RecordStore;

/// Rows returned by `get_events`, by stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventQueryResult {
    Events(Vec<AuditEvent>),
    Disclosures(Vec<Disclosure>),
}

impl EventQueryResult {
    pub fn len(&self) -> usize {
        match self {
            EventQueryResult::Events(rows) => rows.len(),
            EventQueryResult::Disclosures(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The audit rows, or `None` for a disclosure result.
    pub fn into_events(self) -> Option<Vec<AuditEvent>> {
        match self {
            EventQueryResult::Events(rows) => Some(rows),
            EventQueryResult::Disclosures(_) => None,
        }
    }

    pub fn into_disclosures(self) -> Option<Vec<Disclosure>> {
        match self {
            EventQueryResult::Events(_) => None,
            EventQueryResult::Disclosures(rows) => Some(rows),
        }
    }
}

/// Run `filter` against `store`.
///
/// Returns `ClinauditError::InvalidQuery` for an unknown sort column or a
/// start date after the end date.
pub fn get_events(store: &dyn RecordStore, filter: &EventFilter) -> ClinauditResult<EventQueryResult> {
    match filter.stream {
        LogStream::Audit => {
            let query = resolve_event_query(filter)?;
            debug!(start = %query.start, end = %query.end, "querying audit stream");
            store.query_events(&query).map(EventQueryResult::Events)
        }
        LogStream::Disclosure => {
            let query = resolve_disclosure_query(filter)?;
            debug!(start = %query.start, end = %query.end, "querying disclosure stream");
            store.query_disclosures(&query).map(EventQueryResult::Disclosures)
        }
    }
}

/// Validate `filter` for the audit stream.
pub fn resolve_event_query(filter: &EventFilter) -> ClinauditResult<EventQuery> {
    let (start, end) = date_range(filter)?;

    let order = match non_blank(&filter.sort_column) {
        Some(column) => {
            let column = EventSortColumn::parse(&column).ok_or_else(|| unknown_column(&column))?;
            Some((column, filter.sort_direction.unwrap_or_default()))
        }
        None => None,
    };

    Ok(EventQuery {
        start,
        end,
        user: non_blank(&filter.user),
        patient_id: filter.patient_id,
        event_prefix: non_blank(&filter.event_prefix),
        event_suffix: non_blank(&filter.event_suffix),
        order,
        limit: MAX_QUERY_ROWS,
    })
}

/// Validate `filter` for the disclosure stream.  The event suffix and the
/// sort direction do not apply.
pub fn resolve_disclosure_query(filter: &EventFilter) -> ClinauditResult<DisclosureQuery> {
    let (start, end) = date_range(filter)?;

    let order = match non_blank(&filter.sort_column) {
        Some(column) => match DisclosureSortColumn::parse(&column) {
            Some(DisclosureColumn::Sortable(column)) => Some(column),
            Some(DisclosureColumn::Ignored) => None,
            None => return Err(unknown_column(&column)),
        },
        None => None,
    };

    Ok(DisclosureQuery {
        start,
        end,
        user: non_blank(&filter.user),
        patient_id: filter.patient_id,
        event_prefix: non_blank(&filter.event_prefix),
        order,
        limit: MAX_QUERY_ROWS,
    })
}

fn date_range(filter: &EventFilter) -> ClinauditResult<(NaiveDateTime, NaiveDateTime)> {
    let today = Utc::now().date_naive().and_time(NaiveTime::MIN);
    let start = filter.start_date.unwrap_or(today);
    let end = filter
        .end_date
        .unwrap_or(today + Duration::seconds(86_399));

    if start > end {
        return Err(ClinauditError::InvalidQuery {
            reason: format!("start date {} is after end date {}", start, end),
        });
    }
    Ok((start, end))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn unknown_column(column: &str) -> ClinauditError {
    ClinauditError::InvalidQuery {
        reason: format!("unknown sort column '{}'", column),
    }
}
