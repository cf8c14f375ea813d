//! RFC 3881 audit message construction.
//!
//! A message is a single RFC 5425 syslog line (`<13>` priority, timestamp,
//! host) followed by an `AuditMessage` XML document.  The document names
//! this node as the source participant, the collector as the destination,
//! and the acting user as a participant object.  Patient-record events with
//! a patient also carry the patient as a second participant object.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use clinaudit_contracts::{event::AuditEvent, settings::SourceIdentity};

/// Display name that triggers the patient participant block.
pub const PATIENT_RECORD: &str = "Patient Record";

/// RFC 3881 `EventActionCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventActionCode {
    Create,
    Read,
    Update,
    Delete,
    Execute,
}

impl EventActionCode {
    /// Derive the code from the last seven characters of an event key.
    pub fn for_event(event_key: &str) -> Self {
        let suffix = event_key
            .char_indices()
            .rev()
            .nth(6)
            .map(|(at, _)| &event_key[at..])
            .unwrap_or(event_key);

        match suffix {
            "-create" | "-insert" => EventActionCode::Create,
            "-select" => EventActionCode::Read,
            "-update" => EventActionCode::Update,
            "-delete" => EventActionCode::Delete,
            _ => EventActionCode::Execute,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventActionCode::Create => "C",
            EventActionCode::Read => "R",
            EventActionCode::Update => "U",
            EventActionCode::Delete => "D",
            EventActionCode::Execute => "E",
        }
    }
}

impl fmt::Display for EventActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered substring → display name table.  First hit wins.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("patient-record", PATIENT_RECORD),
    ("view", PATIENT_RECORD),
    ("login", "Login"),
    ("logout", "Logout"),
    ("scheduling", "Patient Care Assignment"),
    ("security-administration", "Security Administration"),
];

/// `EventID` display name for an event key; the key itself when unmapped.
pub fn display_name(event_key: &str) -> &str {
    DISPLAY_NAMES
        .iter()
        .find(|(needle, _)| event_key.contains(needle))
        .map(|(_, name)| *name)
        .unwrap_or(event_key)
}

/// `EventOutcomeIndicator`: 0 for success, 4 (minor failure) otherwise.
pub fn outcome_indicator(success: bool) -> u8 {
    if success {
        0
    } else {
        4
    }
}

/// One audit event rendered for a given source and collector.
#[derive(Debug, Clone)]
pub struct Rfc3881Message<'a> {
    event: &'a AuditEvent,
    source: &'a SourceIdentity,
    collector_host: &'a str,
}

impl<'a> Rfc3881Message<'a> {
    pub fn new(event: &'a AuditEvent, source: &'a SourceIdentity, collector_host: &'a str) -> Self {
        Self {
            event,
            source,
            collector_host,
        }
    }

    /// Render the full wire message with `at` as the event time.
    pub fn render(&self, at: DateTime<Utc>) -> String {
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, false);
        let display = display_name(&self.event.event);
        let source_user = escape(&self.source.user_id());
        let collector = escape(self.collector_host);

        let patient = if display == PATIENT_RECORD && self.event.patient_id != 0 {
            format!(
                concat!(
                    "<ParticipantObjectIdentification ParticipantObjectID=\"{}\" ParticipantObjectTypeCode=\"1\" ParticipantObjectTypeCodeRole=\"1\">\n",
                    " <ParticipantObjectIDTypeCode code=\"2\" displayName=\"Patient Number\" codeSystemName=\"RFC-3881\" />\n",
                    "</ParticipantObjectIdentification>",
                ),
                self.event.patient_id
            )
        } else {
            String::new()
        };

        format!(
            concat!(
                "<13>{timestamp} {host}\n",
                "<?xml version=\"1.0\" encoding=\"ASCII\"?>\n",
                " <AuditMessage xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:noNamespaceSchemaLocation=\"healthcare-security-audit.xsd\">\n",
                "  <EventIdentification EventActionCode=\"{action}\" EventDateTime=\"{timestamp}\" EventOutcomeIndicator=\"{outcome}\">\n",
                "   <EventID code=\"eventIDcode\" displayName=\"{display}\" codeSystemName=\"DCM\" />\n",
                "  </EventIdentification>\n",
                "  <ActiveParticipant UserID=\"{source_user}\" UserIsRequestor=\"true\" NetworkAccessPointID=\"{source_address}\" NetworkAccessPointTypeCode=\"2\" >\n",
                "   <RoleIDCode code=\"110153\" displayName=\"Source\" codeSystemName=\"DCM\" />\n",
                "  </ActiveParticipant>\n",
                "  <ActiveParticipant UserID=\"{collector}\" UserIsRequestor=\"false\" NetworkAccessPointID=\"{collector}\" NetworkAccessPointTypeCode=\"2\" >\n",
                "   <RoleIDCode code=\"110152\" displayName=\"Destination\" codeSystemName=\"DCM\" />\n",
                "  </ActiveParticipant>\n",
                "  <AuditSourceIdentification AuditSourceID=\"{source_user}\" />\n",
                "  <ParticipantObjectIdentification ParticipantObjectID=\"{user}\" ParticipantObjectTypeCode=\"1\" ParticipantObjectTypeCodeRole=\"6\" >\n",
                "   <ParticipantObjectIDTypeCode code=\"11\" displayName=\"User Identifier\" codeSystemName=\"RFC-3881\" />\n",
                "  </ParticipantObjectIdentification>\n",
                "  {patient}\n",
                " </AuditMessage>",
            ),
            timestamp = timestamp,
            host = self.source.host_name,
            action = EventActionCode::for_event(&self.event.event),
            outcome = outcome_indicator(self.event.success),
            display = escape(display),
            source_user = source_user,
            source_address = escape(&self.source.address),
            collector = collector,
            user = escape(&self.event.user),
            patient = patient,
        )
    }
}

/// Escape text for use inside a double-quoted XML attribute.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
