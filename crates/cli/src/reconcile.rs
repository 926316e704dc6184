//! `fleetlog reconcile` -- one reconciliation pass over a JSON reminder file.
//!
//! Exit codes: 0 when every required write landed, 1 when the store could
//! not be opened or read, 2 when some writes failed (re-running is safe).

use std::sync::Arc;

use fleetlog_core::{ReconcileReport, ReminderStatusReconciler};
use fleetlog_storage::JsonFileStore;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::Config;
use crate::{report_error, OutputFormat};

pub(crate) async fn cmd_reconcile(
    config: &Config,
    at: Option<OffsetDateTime>,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let store = match JsonFileStore::open(&config.data).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            let msg = format!("error opening '{}': {}", config.data.display(), e);
            report_error(&msg, output, quiet);
            return 1;
        }
    };

    let reconciler = ReminderStatusReconciler::with_config(store, config.reconcile.clone());
    let reference_time = at.unwrap_or_else(OffsetDateTime::now_utc);

    let report = match reconciler.reconcile(reference_time).await {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("Failed to update reminders: {}", e), output, quiet);
            return 1;
        }
    };

    match output {
        OutputFormat::Text => {
            if !quiet {
                println!("{} reminder(s) updated.", report.updated_count);
            }
            for failure in &report.failures {
                eprintln!(
                    "warning: failed to update reminder {}: {}",
                    failure.id, failure.error
                );
            }
        }
        OutputFormat::Json => println!("{}", report_json(&report)),
    }

    if report.is_complete() {
        0
    } else {
        2
    }
}

pub(crate) fn report_json(report: &ReconcileReport) -> serde_json::Value {
    let failures: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|f| serde_json::json!({ "id": f.id, "error": f.error.to_string() }))
        .collect();
    serde_json::json!({
        "referenceTime": report.reference_time.format(&Rfc3339).ok(),
        "scanned": report.scanned,
        "updatedCount": report.updated_count,
        "failures": failures,
    })
}
