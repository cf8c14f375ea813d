//! The audit facade: gates, classifies, checksums, persists, transmits.
//!
//! The SQL entry point runs every statement through this pipeline:
//!
//!   Master switch → Skip list → Classify → Query gate → Class gate
//!     → Row checksum → Persist (event + tamper record) → Transmit
//!
//! Every gate can be overridden by a breakglass user when
//! `gbl_force_log_breakglass` is on, except that a SELECT against an
//! unknown table is never logged.  Local persistence always happens before
//! transmission, and a transmission failure can never undo or fail it.

use std::sync::Arc;

use tracing::{debug, info};

use clinaudit_contracts::{
    classification::{EventClass, QueryType},
    error::ClinauditResult,
    event::{now_seconds, AuditContext, AuditDraft, AuditEvent, LogSource},
    settings::AuditSettings,
};

use crate::{
    breakglass::BreakglassCache,
    checksum::checksum_affected_row,
    traits::{AuditTransport, AuditWriter, Classifier, RecordStore},
};

/// Category recorded for events that originate in the patient portal.
pub const PORTAL_CATEGORY: &str = "Patient Portal";

/// Why an event was not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// `enable_auditlog` is off and no breakglass override applied.
    AuditingDisabled,

    /// The statement is on the skip list (audit tables, sequences, counts).
    IgnoredStatement,

    /// A SELECT while `audit_events_query` is off.
    QueryAuditingDisabled,

    /// A SELECT that touches no known table.
    UnknownTableSelect,

    /// The per-class toggle for this class is off.
    EventClassDisabled(EventClass),
}

/// The outcome of one logging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    /// The event and its tamper-evidence record were persisted.
    Recorded(AuditEvent),

    /// A policy gate discarded the event.  Nothing was written or sent.
    Suppressed(SuppressReason),
}

impl LogOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, LogOutcome::Recorded(_))
    }

    pub fn event(&self) -> Option<&AuditEvent> {
        match self {
            LogOutcome::Recorded(event) => Some(event),
            LogOutcome::Suppressed(_) => None,
        }
    }
}

/// Patient-portal origin of an explicit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalOrigin {
    /// Name of the portal menu item the patient used.
    pub menu_item: String,
    pub ccda_doc_id: Option<i64>,
}

/// An application-level event logged explicitly (login, view, export, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitEvent {
    pub event: String,
    pub success: bool,
    pub comments: String,
    pub patient_id: Option<i64>,
    pub portal: Option<PortalOrigin>,
}

impl ExplicitEvent {
    pub fn new(event: impl Into<String>, success: bool) -> Self {
        Self {
            event: event.into(),
            success,
            comments: String::new(),
            patient_id: None,
            portal: None,
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    pub fn for_patient(mut self, patient_id: i64) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn from_portal(mut self, menu_item: impl Into<String>, ccda_doc_id: Option<i64>) -> Self {
        self.portal = Some(PortalOrigin {
            menu_item: menu_item.into(),
            ccda_doc_id,
        });
        self
    }
}

/// The long-lived audit service.
///
/// Build one per process or worker and pass it to every caller.  It owns the
/// collaborators and the breakglass cache.
pub struct AuditLogger {
    settings: AuditSettings,
    store: Arc<dyn RecordStore>,
    classifier: Box<dyn Classifier>,
    writer: Box<dyn AuditWriter>,
    transport: Box<dyn AuditTransport>,
    breakglass: BreakglassCache,
}

impl AuditLogger {
    pub fn new(
        settings: AuditSettings,
        store: Arc<dyn RecordStore>,
        classifier: Box<dyn Classifier>,
        writer: Box<dyn AuditWriter>,
        transport: Box<dyn AuditTransport>,
    ) -> Self {
        Self {
            settings,
            store,
            classifier,
            writer,
            transport,
            breakglass: BreakglassCache::new(),
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Whether `user` is an emergency-access user (cached).
    pub fn is_breakglass_user(&self, user: &str) -> bool {
        self.breakglass.is_breakglass_user(self.store.as_ref(), user)
    }

    /// Log an explicit application event.
    ///
    /// Subject only to the master switch (with breakglass override).  The
    /// category is the event key, narrowed by the classifier for `delete`
    /// events, or `Patient Portal` for portal events.
    pub fn log_event(
        &self,
        ctx: &AuditContext,
        event: ExplicitEvent,
    ) -> ClinauditResult<LogOutcome> {
        if !self.settings.enable_auditlog && !self.breakglass_override(&ctx.user) {
            debug!(event = %event.event, "auditing disabled; explicit event dropped");
            return Ok(LogOutcome::Suppressed(SuppressReason::AuditingDisabled));
        }

        let (category, log_from, menu_item_id, ccda_doc_id) = match &event.portal {
            Some(portal) => (
                PORTAL_CATEGORY.to_string(),
                LogSource::PatientPortal,
                self.store.portal_menu_item_id(&portal.menu_item)?,
                portal.ccda_doc_id,
            ),
            None => (
                self.classifier.categorize_explicit(&event.event, &event.comments),
                LogSource::Application,
                None,
                None,
            ),
        };

        let draft = AuditDraft {
            timestamp: now_seconds(),
            event: event.event,
            category,
            user: ctx.user.clone(),
            group: ctx.group.clone(),
            patient_id: event.patient_id.unwrap_or(0),
            success: event.success,
            comments: event.comments,
            checksum: String::new(),
            source_identity: ctx.source_identity().to_string(),
            log_from,
            menu_item_id,
            ccda_doc_id,
            query_type: None,
        };

        self.persist_and_send(draft).map(LogOutcome::Recorded)
    }

    /// Log a SQL statement that the application just executed.
    ///
    /// `succeeded` is whether the statement completed; the row checksum is
    /// only taken for successful statements.  `binds` are the bound parameter
    /// values, appended to the recorded comment.
    pub fn log_sql_event(
        &self,
        ctx: &AuditContext,
        statement: &str,
        succeeded: bool,
        binds: Option<&[String]>,
    ) -> ClinauditResult<LogOutcome> {
        if !self.settings.enable_auditlog && !self.breakglass_override(&ctx.user) {
            return Ok(LogOutcome::Suppressed(SuppressReason::AuditingDisabled));
        }

        let statement = statement.trim();
        if is_ignored_statement(statement) {
            return Ok(LogOutcome::Suppressed(SuppressReason::IgnoredStatement));
        }

        let query_type = QueryType::detect(statement);
        if query_type == QueryType::Select
            && !self.settings.audit_events_query
            && !self.breakglass_override(&ctx.user)
        {
            debug!("query auditing disabled; select dropped");
            return Ok(LogOutcome::Suppressed(SuppressReason::QueryAuditingDisabled));
        }

        let mut comments = statement.to_string();
        if let Some(binds) = binds.filter(|b| !b.is_empty()) {
            comments.push_str(&format_binds(binds));
        }

        let classification = self.classifier.classify_with_comment(statement, &comments);

        if query_type == QueryType::Select && classification.event_class == EventClass::Other {
            return Ok(LogOutcome::Suppressed(SuppressReason::UnknownTableSelect));
        }

        let class = classification.event_class;
        if !self.settings.audit_events.enabled(class) && !self.breakglass_override(&ctx.user) {
            debug!(event_class = %class, "event class disabled; statement dropped");
            return Ok(LogOutcome::Suppressed(SuppressReason::EventClassDisabled(class)));
        }

        let patient_id = if class == EventClass::PatientRecord {
            ctx.patient_id.unwrap_or(0)
        } else {
            0
        };

        let checksum = if succeeded {
            checksum_affected_row(self.store.as_ref(), statement, query_type)
        } else {
            String::new()
        };

        let draft = AuditDraft {
            timestamp: now_seconds(),
            event: classification.event_key(),
            category: classification.category,
            user: ctx.user.clone(),
            group: ctx.group.clone(),
            patient_id,
            success: succeeded,
            comments,
            checksum,
            source_identity: ctx.source_identity().to_string(),
            log_from: LogSource::Application,
            menu_item_id: None,
            ccda_doc_id: None,
            query_type: Some(query_type),
        };

        self.persist_and_send(draft).map(LogOutcome::Recorded)
    }

    /// Record that an audit setting was switched on or off.
    ///
    /// Always written, whatever the gates say, because it documents the
    /// gates themselves.
    pub fn log_setting_change(
        &self,
        ctx: &AuditContext,
        setting: &str,
        enabled: bool,
    ) -> ClinauditResult<AuditEvent> {
        let label = match setting {
            "enable_auditlog" => "Audit Logging",
            "gbl_force_log_breakglass" => "Force Breakglass Logging",
            other => other,
        };
        let state = if enabled { "Enabled." } else { "Disabled." };

        let event = format!("{}-{}", EventClass::SecurityAdministration, QueryType::Insert);
        let draft = AuditDraft {
            timestamp: now_seconds(),
            category: event.clone(),
            event,
            user: ctx.user.clone(),
            group: ctx.group.clone(),
            patient_id: 0,
            success: true,
            comments: format!("{} {}", label, state),
            checksum: String::new(),
            source_identity: ctx.source_identity().to_string(),
            log_from: LogSource::Application,
            menu_item_id: None,
            ccda_doc_id: None,
            query_type: None,
        };

        self.persist_and_send(draft)
    }

    fn breakglass_override(&self, user: &str) -> bool {
        self.settings.gbl_force_log_breakglass && self.is_breakglass_user(user)
    }

    fn persist_and_send(&self, draft: AuditDraft) -> ClinauditResult<AuditEvent> {
        let event = self.writer.record(draft)?;

        info!(
            log_id = event.id,
            event = %event.event,
            category = %event.category,
            user = %event.user,
            success = event.success,
            "audit event recorded"
        );

        self.transport.send(&event);
        Ok(event)
    }
}

/// Statements that are never audited: writes to and reads from the audit log
/// itself, sequence generators, and row counts.
fn is_ignored_statement(statement: &str) -> bool {
    let lower = statement.to_ascii_lowercase();
    lower.contains("insert into log")
        || lower.contains("from log ")
        || statement.contains("sequences")
        || lower.starts_with("select count(")
}

/// Render bound values as ` ('a','b')`, escaped the way the SQL client
/// escapes string literals.
pub fn format_binds(binds: &[String]) -> String {
    let quoted: Vec<String> = binds.iter().map(|v| format!("'{}'", escape_literal(v))).collect();
    format!(" ({})", quoted.join(","))
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────────────────
