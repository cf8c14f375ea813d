//! Row checksum engine.
//!
//! Given a write statement that has just executed, find the row it modified
//! and return the SHA-1 of that row's current contents, read back from the
//! store.  The statement text is the only description available, so the
//! table and key are recovered from its tokens:
//!
//! - INSERT / REPLACE: the table is the third token (`INSERT INTO <table>`).
//!   The row id is the store's auto-increment feedback; when there is none,
//!   it is parsed from the statement, either from a leading key column in the
//!   column list (`(<key>, ...) VALUES (<id>, ...)`) or from a `SET <key>=<id>`
//!   clause.
//! - UPDATE: the table is the second token and the key assignment is scanned
//!   for from the fourth token on.
//!
//! A key assignment is recognized in four spacings:
//! `id = 5`, `id= 5`, `id=5`, and `id =5`.
//!
//! The row is re-read after the write, so the checksum reflects server-side
//! defaults and triggers, and also any concurrent writer that got there
//! first.  Nothing here is an error: every failure yields an empty string.

use sha1::{Digest, Sha1};
use tracing::debug;

use clinaudit_contracts::classification::QueryType;

use crate::traits::{RecordStore, Row};

/// Tables whose primary key is not `id`.
const PRIMARY_KEYS: &[(&str, &str)] = &[
    ("form_physical_exam", "forms_id"),
    ("claims", "patient_id"),
    ("openemr_postcalendar_events", "pc_eid"),
    ("lang_languages", "lang_id"),
    ("openemr_postcalendar_categories", "pc_catid"),
    ("openemr_postcalendar_topics", "pc_catid"),
    ("openemr_postcalendar_limits", "pc_limitid"),
    ("gacl_aco_map", "acl_id"),
    ("gacl_aro_groups_map", "acl_id"),
    ("gacl_aro_map", "acl_id"),
    ("gacl_axo_groups_map", "acl_id"),
    ("gacl_axo_map", "acl_id"),
    ("gacl_groups_aro_map", "group_id"),
    ("gacl_groups_axo_map", "group_id"),
];

/// Token index where the UPDATE key scan starts (`UPDATE <table> SET <here>`).
const UPDATE_SCAN_OFFSET: usize = 3;

/// Token index where the key scan of `REPLACE INTO <table> SET ...` starts.
const SET_SCAN_OFFSET: usize = 4;

/// The row a statement was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTarget {
    pub table: String,
    pub key_column: &'static str,
    pub key: String,
}

/// Primary-key column used to address rows of `table`.
pub fn primary_key_column(table: &str) -> &'static str {
    PRIMARY_KEYS
        .iter()
        .find(|(t, _)| *t == table)
        .map(|(_, key)| *key)
        .unwrap_or("id")
}

/// Checksum the row modified by `statement`, or return an empty string.
pub fn checksum_affected_row(
    store: &dyn RecordStore,
    statement: &str,
    query_type: QueryType,
) -> String {
    let Some(target) = resolve_target(store, statement, query_type) else {
        debug!(query_type = %query_type, "no row target resolved; checksum left empty");
        return String::new();
    };

    match store.fetch_row(&target.table, target.key_column, &target.key) {
        Ok(Some(row)) => row_digest(&row),
        Ok(None) => {
            debug!(
                table = %target.table,
                key = %target.key,
                "modified row no longer exists; checksum left empty"
            );
            String::new()
        }
        Err(e) => {
            debug!(table = %target.table, error = %e, "row re-read failed; checksum left empty");
            String::new()
        }
    }
}

/// Work out which table and row `statement` modified.
pub fn resolve_target(
    store: &dyn RecordStore,
    statement: &str,
    query_type: QueryType,
) -> Option<RowTarget> {
    if !query_type.is_row_write() {
        return None;
    }
    let tokens = tokenize(statement);

    let (table, key) = if query_type == QueryType::Update {
        let table = unquote(tokens.get(1)?);
        let key_column = primary_key_column(&table);
        let key = scan_assignment(&tokens, key_column, UPDATE_SCAN_OFFSET)?;
        (table, key)
    } else {
        let table = unquote(tokens.get(2)?);
        let key_column = primary_key_column(&table);
        let key = match store.last_insert_id() {
            Some(id) if id != 0 => id.to_string(),
            _ => literal_insert_key(&tokens, key_column)?,
        };
        (table, key)
    };

    if table.is_empty() || key.is_empty() {
        return None;
    }

    let key_column = primary_key_column(&table);
    Some(RowTarget { table, key_column, key })
}

/// Hex SHA-1 over the concatenated column values of `row`, NULL as empty.
pub fn row_digest(row: &Row) -> String {
    let mut hasher = Sha1::new();
    for (_, value) in row {
        if let Some(value) = value {
            hasher.update(value.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

/// Split on whitespace, commas, opening parentheses, and quotes.
fn tokenize(statement: &str) -> Vec<&str> {
    statement
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | '\'' | '"'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Drop identifier backticks.
fn unquote(token: &str) -> String {
    token.replace('`', "")
}

/// Strip statement punctuation glued to a literal value.
fn clean_value(token: &str) -> String {
    unquote(token)
        .trim_end_matches([')', ';'])
        .to_string()
}

fn numeric(value: &str) -> Option<String> {
    let value = clean_value(value);
    value.parse::<i64>().ok().map(|_| value)
}

/// Key value of an INSERT / REPLACE that produced no auto-increment id.
fn literal_insert_key(tokens: &[&str], key_column: &str) -> Option<String> {
    let first_column = unquote(tokens.get(3)?);

    if first_column.eq_ignore_ascii_case(key_column) {
        // (<key>, ...) VALUES (<id>, ...): the id is the first value.
        let values_at = tokens
            .iter()
            .skip(4)
            .position(|t| t.eq_ignore_ascii_case("VALUES"))?
            + 4;
        return tokens.get(values_at + 1).map(|t| clean_value(t));
    }

    if first_column.eq_ignore_ascii_case("SET") {
        return scan_assignment(tokens, key_column, SET_SCAN_OFFSET);
    }

    None
}

/// Find `<key> = <value>` at or after `start`, in any of the four spacings.
///
/// The first token that names the key decides the outcome: if it is not
/// followed by a usable value the scan gives up rather than guessing.
fn scan_assignment(tokens: &[&str], key: &str, start: usize) -> Option<String> {
    let glued = format!("{}=", key);

    for offset in start..tokens.len() {
        let token = unquote(tokens[offset]);
        let next = tokens.get(offset + 1).map(|t| unquote(t));

        // ('id=', '123')
        if token.eq_ignore_ascii_case(&glued) {
            return next.map(|n| clean_value(&n));
        }

        if token.eq_ignore_ascii_case(key) {
            return match next.as_deref() {
                // ('id', '=', '123')
                Some("=") => tokens.get(offset + 2).map(|t| clean_value(t)),
                // ('id', '=123')
                Some(n) if n.starts_with('=') => numeric(&n[1..]),
                _ => None,
            };
        }

        // ('id=123')
        if let Some(prefix) = token.get(..glued.len()) {
            if prefix.eq_ignore_ascii_case(&glued) {
                return numeric(&token[glued.len()..]);
            }
        }
    }

    None
}
