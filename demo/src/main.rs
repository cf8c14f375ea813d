//! clinaudit demo CLI
//!
//! Exercises the audit trail against the in-memory reference store.
//!
//! Usage:
//!   cargo run -p demo -- classify "UPDATE patient_data SET DOB='1990-01-01' WHERE id = 42"
//!   cargo run -p demo -- walkthrough
//!   cargo run -p demo -- atna-preview --event login --user alice
//!   cargo run -p demo -- --config audit.toml walkthrough

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clinaudit_atna::AtnaTransmitter;
use clinaudit_audit::{
    get_events, verify_event, verify_stored_event, DisclosureLog, InMemoryRecordStore,
    StoreAuditWriter,
};
use clinaudit_classify::RuleClassifier;
use clinaudit_contracts::{
    disclosure::DisclosureDraft,
    error::ClinauditResult,
    event::{now_seconds, AuditContext, AuditEvent, LogSource},
    query::{EventFilter, LogStream},
    settings::{AuditSettings, EventClassToggles},
};
use clinaudit_core::{
    traits::{Classifier, RecordStore, Row},
    format_binds, AuditLogger, ExplicitEvent, LogOutcome,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// clinaudit: tamper-evident clinical audit trail demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "clinaudit audit trail demo",
    long_about = "Classifies SQL statements, runs an audit walkthrough against an\n\
                  in-memory store, and previews ATNA audit messages."
)]
struct Cli {
    /// Audit settings TOML.  Without it every gate is open.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Alternative classification rules TOML.
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how a statement is classified.
    Classify {
        /// The SQL statement.
        statement: String,

        /// Bound parameter values, in order.
        #[arg(long = "bind")]
        binds: Vec<String>,
    },
    /// Log a series of statements and events, then verify and query them.
    Walkthrough,
    /// Print the ATNA message an event would produce.
    AtnaPreview {
        #[arg(long, default_value = "patient-record-select")]
        event: String,

        #[arg(long, default_value = "admin")]
        user: String,

        #[arg(long, default_value_t = 0)]
        patient: i64,

        #[arg(long)]
        failed: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug to see gate decisions.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_settings(cli.config.as_ref()).and_then(|settings| {
        let classifier = load_classifier(cli.rules.as_ref())?;
        match cli.command {
            Command::Classify { statement, binds } => run_classify(&classifier, &statement, &binds),
            Command::Walkthrough => run_walkthrough(settings, classifier),
            Command::AtnaPreview {
                event,
                user,
                patient,
                failed,
            } => run_atna_preview(&settings, &event, &user, patient, !failed),
        }
    });

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_settings(path: Option<&PathBuf>) -> ClinauditResult<AuditSettings> {
    match path {
        Some(path) => AuditSettings::from_file(path),
        None => Ok(AuditSettings {
            enable_auditlog: true,
            audit_events_query: true,
            gbl_force_log_breakglass: true,
            audit_events: EventClassToggles::all(),
            ..AuditSettings::default()
        }),
    }
}

fn load_classifier(path: Option<&PathBuf>) -> ClinauditResult<RuleClassifier> {
    match path {
        Some(path) => RuleClassifier::from_file(path),
        None => RuleClassifier::builtin(),
    }
}

// ── classify ──────────────────────────────────────────────────────────────────

fn run_classify(classifier: &RuleClassifier, statement: &str, binds: &[String]) -> ClinauditResult<()> {
    let comment = if binds.is_empty() {
        statement.to_string()
    } else {
        format!("{}{}", statement, format_binds(binds))
    };
    let classification = classifier.classify_with_comment(statement, &comment);

    println!("statement : {}", statement);
    println!("query     : {}", classification.query_type);
    println!("table     : {}", classification.table.as_deref().unwrap_or("-"));
    println!("class     : {}", classification.event_class);
    println!("category  : {}", classification.category);
    println!("event key : {}", classification.event_key());
    Ok(())
}

// ── walkthrough ───────────────────────────────────────────────────────────────

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(column, value)| (column.to_string(), Some(value.to_string())))
        .collect()
}

fn report(label: &str, outcome: &LogOutcome) {
    match outcome {
        LogOutcome::Recorded(event) => println!(
            "  [logged]     {:<40} #{} {} / {}",
            label, event.id, event.event, event.category
        ),
        LogOutcome::Suppressed(reason) => {
            println!("  [suppressed] {:<40} {:?}", label, reason)
        }
    }
}

fn run_walkthrough(settings: AuditSettings, classifier: RuleClassifier) -> ClinauditResult<()> {
    let store = InMemoryRecordStore::new();
    store.put_row(
        "patient_data",
        "id",
        row(&[("id", "42"), ("fname", "Ada"), ("lname", "Lovelace"), ("DOB", "1990-01-01")]),
        false,
    );
    store.put_row(
        "lists",
        "id",
        row(&[("id", "7"), ("pid", "42"), ("type", "allergy"), ("title", "penicillin")]),
        true,
    );
    store.add_group_member("emergency", "breakglass");
    store.add_portal_menu_item("dashboard", 3);

    let shared: Arc<dyn RecordStore> = Arc::new(store.clone());
    let writer = StoreAuditWriter::from_settings(&settings, shared.clone(), None)?;
    let transport = AtnaTransmitter::new(&settings);
    let logger = AuditLogger::new(
        settings,
        shared.clone(),
        Box::new(classifier),
        Box::new(writer),
        Box::new(transport),
    );

    let clinician = AuditContext::new("alice", "Default").with_patient(42);
    let emergency = AuditContext::new("emergency", "Default").with_patient(42);

    println!();
    println!("Logging statements");
    println!("==================");

    let update = logger.log_sql_event(
        &clinician,
        "UPDATE patient_data SET DOB='1990-01-01' WHERE id = 42",
        true,
        None,
    )?;
    report("patient_data update", &update);

    let insert = logger.log_sql_event(
        &clinician,
        "INSERT INTO lists (pid, type, title) VALUES (?, ?, ?)",
        true,
        Some(&["42".to_string(), "allergy".to_string(), "penicillin".to_string()]),
    )?;
    report("lists insert (allergy)", &insert);

    let select = logger.log_sql_event(
        &clinician,
        "SELECT * FROM prescriptions WHERE patient_id = 42",
        true,
        None,
    )?;
    report("prescriptions select", &select);

    let unknown = logger.log_sql_event(&emergency, "SELECT * FROM weather", true, None)?;
    report("unknown table select (breakglass)", &unknown);

    let ignored = logger.log_sql_event(&clinician, "SELECT count(*) FROM patient_data", true, None)?;
    report("count query", &ignored);

    let login = logger.log_event(&clinician, ExplicitEvent::new("login", true))?;
    report("explicit login", &login);

    let portal = logger.log_event(
        &AuditContext::new("portal-user", "Default"),
        ExplicitEvent::new("view", true)
            .for_patient(42)
            .from_portal("dashboard", None),
    )?;
    report("portal view", &portal);

    let setting = logger.log_setting_change(&clinician, "gbl_force_log_breakglass", true)?;
    println!(
        "  [logged]     {:<40} #{} {}",
        "setting change", setting.id, setting.comments
    );

    println!();
    println!("Verifying tamper evidence");
    println!("=========================");
    for event in store.events() {
        println!(
            "  #{:<3} {:<36} {:?}",
            event.id,
            event.event,
            verify_stored_event(shared.as_ref(), &event)?
        );
    }

    if let Some(event) = update.event() {
        if let Some(record) = shared.tamper_record(event.id)? {
            let mut altered = event.clone();
            altered.comments = "UPDATE patient_data SET DOB='1980-01-01' WHERE id = 42".to_string();
            println!("  #{:<3} {:<36} {:?}", altered.id, "(comment rewritten)", verify_event(&altered, &record));
        }
    }

    println!();
    println!("Disclosures");
    println!("===========");
    let disclosures = DisclosureLog::new(shared.clone());
    let recorded = disclosures.record(DisclosureDraft {
        date: now_seconds(),
        event_type: "disclosure-treatment".to_string(),
        patient_id: 42,
        recipient: "Dr. Babbage".to_string(),
        description: "Allergy list sent for referral".to_string(),
        user: "alice".to_string(),
    })?;
    println!("  recorded disclosure #{} to {}", recorded.id, recorded.recipient);

    println!();
    println!("Querying today's trail for patient 42");
    println!("=====================================");
    let audit = get_events(
        shared.as_ref(),
        &EventFilter {
            patient_id: Some(42),
            sort_column: Some("id".to_string()),
            ..EventFilter::default()
        },
    )?;
    println!("  audit rows      : {}", audit.len());

    let released = get_events(
        shared.as_ref(),
        &EventFilter {
            patient_id: Some(42),
            stream: LogStream::Disclosure,
            ..EventFilter::default()
        },
    )?;
    println!("  disclosure rows : {}", released.len());

    println!();
    println!("Store snapshot");
    println!("==============");
    println!("{}", store.export_json()?);
    Ok(())
}

// ── atna-preview ──────────────────────────────────────────────────────────────

fn run_atna_preview(
    settings: &AuditSettings,
    event: &str,
    user: &str,
    patient_id: i64,
    success: bool,
) -> ClinauditResult<()> {
    let event = AuditEvent {
        id: 0,
        timestamp: now_seconds(),
        event: event.to_string(),
        category: event.to_string(),
        user: user.to_string(),
        group: "Default".to_string(),
        patient_id,
        success,
        comments: String::new(),
        checksum: String::new(),
        source_identity: user.to_string(),
        log_from: LogSource::Application,
        menu_item_id: None,
        ccda_doc_id: None,
    };

    let transmitter = AtnaTransmitter::new(settings);
    println!("{}", transmitter.preview(&event));
    Ok(())
}
