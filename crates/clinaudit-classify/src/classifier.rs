//! TOML-driven statement classifier.
//!
//! `RuleClassifier` loads a `CategoryConfig` and implements the `Classifier`
//! trait from clinaudit-core.
//!
//! Classification algorithm:
//!
//! 1. Detect the query type from the statement prefix.
//! 2. Truncate the statement so that only the table part is searched:
//!    SELECTs are cut at ` where `, writes at the first of `(`, ` values `,
//!    and ` set `.
//! 3. The first table map entry whose name occurs in the truncated text
//!    decides the event class.  Failing that, a `form_` substring makes the
//!    statement a patient record on the literal `form_*` table.
//! 4. The first refinement rule matching the table decides the category.
//!    Markers are searched for in the comment, which includes bind values.
//! 5. No table hit at all → class and category `other`.

use std::path::Path;

use tracing::debug;

use clinaudit_contracts::{
    classification::{Classification, EventClass, QueryType},
    error::{ClinauditError, ClinauditResult},
};
use clinaudit_core::traits::Classifier;

use crate::rule::CategoryConfig;

/// The classification rules shipped with the crate.
const BUILTIN_RULES: &str = include_str!("../policies/categories.toml");

/// Substring that marks an unlisted clinical form table.
const FORM_TABLE_MARKER: &str = "form_";

/// A `Classifier` implementation that reads its tables and rules from TOML.
///
/// ```rust,ignore
/// use clinaudit_classify::RuleClassifier;
///
/// let classifier = RuleClassifier::builtin()?;
/// let c = classifier.classify("UPDATE patient_data SET DOB='1990-01-01' WHERE id = 42");
/// assert_eq!(c.category, "Patient Demographics");
/// ```
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    config: CategoryConfig,
}

impl RuleClassifier {
    /// Parse `s` as TOML and build a `RuleClassifier`.
    ///
    /// Returns `ClinauditError::ConfigError` if the TOML is malformed or does
    /// not match the expected `CategoryConfig` schema.
    pub fn from_toml_str(s: &str) -> ClinauditResult<Self> {
        let config: CategoryConfig = toml::from_str(s).map_err(|e| ClinauditError::ConfigError {
            reason: format!("failed to parse classification TOML: {}", e),
        })?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse it as classification rules.
    pub fn from_file(path: &Path) -> ClinauditResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ClinauditError::ConfigError {
            reason: format!("failed to read classification file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The compiled-in table map and rules.
    pub fn builtin() -> ClinauditResult<Self> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    pub fn config(&self) -> &CategoryConfig {
        &self.config
    }

    /// Find the table and its class in the truncated statement.
    fn match_table(&self, truncated: &str) -> Option<(String, EventClass)> {
        if let Some(entry) = self
            .config
            .tables
            .iter()
            .find(|entry| truncated.contains(entry.name.as_str()))
        {
            return Some((entry.name.clone(), entry.event));
        }

        form_table(truncated).map(|name| (name, EventClass::PatientRecord))
    }

    fn refine(&self, table: &str, event: &str, comment: &str) -> Option<&str> {
        self.config
            .rules
            .iter()
            .find(|rule| rule.matches(table, event, comment))
            .map(|rule| {
                debug!(rule_id = %rule.id, table = %table, "category rule matched");
                rule.category.as_str()
            })
    }
}

impl Classifier for RuleClassifier {
    fn classify_with_comment(&self, statement: &str, comment: &str) -> Classification {
        let query_type = QueryType::detect(statement);
        let truncated = truncate(statement, query_type);

        let Some((table, event_class)) = self.match_table(&truncated) else {
            return Classification::other(query_type);
        };

        let category = self
            .refine(&table, event_class.as_str(), comment)
            .unwrap_or(event_class.as_str())
            .to_string();

        Classification {
            query_type,
            table: Some(table),
            event_class,
            category,
        }
    }

    fn categorize_explicit(&self, event: &str, comments: &str) -> String {
        if let Some(category) = self
            .config
            .explicit
            .iter()
            .find_map(|n| n.narrow(event, comments))
        {
            return category.to_string();
        }

        self.refine("", event, comments).unwrap_or(event).to_string()
    }
}

/// Cut `statement` down to the part that names the table.
///
/// Newlines are flattened first.  A boundary at position 0 is ignored.
fn truncate(statement: &str, query_type: QueryType) -> String {
    let flat = statement.replace('\n', " ");
    let lower = flat.to_ascii_lowercase();

    let boundaries: &[&str] = if query_type == QueryType::Select {
        &[" where "]
    } else {
        &["(", " values ", " set "]
    };

    let cut = boundaries
        .iter()
        .filter_map(|b| lower.find(b))
        .filter(|&at| at > 0)
        .min()
        .unwrap_or(flat.len());

    flat[..cut].to_string()
}

/// The identifier around the first `form_` substring, if any.
fn form_table(truncated: &str) -> Option<String> {
    let at = truncated.find(FORM_TABLE_MARKER)?;
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';

    let start = truncated[..at]
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_ident(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let end = truncated[at..]
        .find(|c: char| !is_ident(c))
        .map(|i| at + i)
        .unwrap_or(truncated.len());

    Some(truncated[start..end].to_string())
}
