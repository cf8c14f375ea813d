//! Operator settings for the audit trail.
//!
//! Settings are read from TOML.  Key names follow the recognized flags of the
//! surrounding application so that an existing globals dump maps one-to-one:
//!
//! ```toml
//! enable_auditlog = true
//! enable_auditlog_encryption = false
//! audit_events_query = false
//! gbl_force_log_breakglass = true
//!
//! [audit_events]
//! patient-record = true
//! security-administration = true
//!
//! [atna]
//! enable_atna_audit = true
//! atna_audit_host = "audit.example.org"
//! atna_audit_port = 6514
//! atna_audit_localcert = "/etc/clinaudit/client.pem"
//! atna_audit_cacert = "/etc/clinaudit/ca.pem"
//!
//! [source]
//! host_name = "ehr01.example.org"
//! address = "10.0.0.5"
//! ```
//!
//! Every key is optional.  Missing keys are `false` / empty.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    classification::EventClass,
    error::{ClinauditError, ClinauditResult},
};

/// Per-class allow flags (`audit_events_<class>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EventClassToggles {
    pub patient_record: bool,
    pub security_administration: bool,
    pub scheduling: bool,
    pub order: bool,
    pub lab_order: bool,
    pub lab_results: bool,
    pub other: bool,
}

impl EventClassToggles {
    /// Every class enabled.
    pub fn all() -> Self {
        Self {
            patient_record: true,
            security_administration: true,
            scheduling: true,
            order: true,
            lab_order: true,
            lab_results: true,
            other: true,
        }
    }

    pub fn enabled(&self, class: EventClass) -> bool {
        match class {
            EventClass::PatientRecord => self.patient_record,
            EventClass::SecurityAdministration => self.security_administration,
            EventClass::Scheduling => self.scheduling,
            EventClass::Order => self.order,
            EventClass::LabOrder => self.lab_order,
            EventClass::LabResults => self.lab_results,
            EventClass::Other => self.other,
        }
    }
}

/// Remote ATNA collector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtnaSettings {
    pub enable_atna_audit: bool,
    pub atna_audit_host: String,
    pub atna_audit_port: u16,

    /// PEM file holding the client certificate chain and its private key.
    /// Empty means no client certificate is presented.
    pub atna_audit_localcert: String,

    /// PEM file of the CA that signed the collector's certificate.  Empty
    /// means the collector's certificate is NOT verified.
    pub atna_audit_cacert: String,
}

impl AtnaSettings {
    /// Default syslog-over-TLS port (RFC 5425).
    pub const DEFAULT_PORT: u16 = 6514;

    /// True when transmission is switched on and a collector is configured.
    pub fn is_active(&self) -> bool {
        self.enable_atna_audit && !self.atna_audit_host.trim().is_empty()
    }
}

impl Default for AtnaSettings {
    fn default() -> Self {
        Self {
            enable_atna_audit: false,
            atna_audit_host: String::new(),
            atna_audit_port: Self::DEFAULT_PORT,
            atna_audit_localcert: String::new(),
            atna_audit_cacert: String::new(),
        }
    }
}

/// Identity of this node as reported in ATNA messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceIdentity {
    pub host_name: String,
    pub address: String,
    pub application: String,
}

impl SourceIdentity {
    /// `host|application`, used as the source participant and audit source id.
    pub fn user_id(&self) -> String {
        format!("{}|{}", self.host_name, self.application)
    }
}

impl Default for SourceIdentity {
    fn default() -> Self {
        Self {
            host_name: "localhost".to_string(),
            address: "127.0.0.1".to_string(),
            application: "clinaudit".to_string(),
        }
    }
}

/// The full settings surface consulted by the audit facade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Master on/off switch.
    pub enable_auditlog: bool,

    /// Encrypt the comment field before it is stored.
    pub enable_auditlog_encryption: bool,

    /// Allow SELECT statements to be logged.
    pub audit_events_query: bool,

    /// Log everything a breakglass user does, overriding all other gates.
    pub gbl_force_log_breakglass: bool,

    pub audit_events: EventClassToggles,
    pub atna: AtnaSettings,
    pub source: SourceIdentity,
}

impl AuditSettings {
    /// Parse `s` as TOML settings.
    ///
    /// Returns `ClinauditError::ConfigError` if the TOML is malformed or a
    /// key has the wrong type.
    pub fn from_toml_str(s: &str) -> ClinauditResult<Self> {
        toml::from_str(s).map_err(|e| ClinauditError::ConfigError {
            reason: format!("failed to parse audit settings TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML settings.
    pub fn from_file(path: &Path) -> ClinauditResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ClinauditError::ConfigError {
            reason: format!("failed to read settings file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}
