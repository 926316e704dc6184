//! Conformance test suite for `ReminderStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `ReminderStore` implementation can run to verify correctness. The suite
//! covers:
//!
//! - **Lifecycle**: insert, read back, list in insertion order, edit, delete
//! - **Status writes**: `update_status` touches only the status field
//! - **Stale listing**: `list_stale_reminders` returns exactly the records
//!   whose stored status disagrees with their due date
//! - **Error handling**: correct error variants for unknown ids
//! - **Concurrency**: independent per-record writes issued in parallel
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty store for each test:
//!
//! ```ignore
//! use fleetlog_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn memory_conformance() {
//!     let report = run_conformance_suite(|| async { MemoryStore::new() }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod concurrent;
mod error;
mod lifecycle;
mod stale;
mod status;

use std::fmt;
use std::future::Future;

use time::macros::datetime;
use time::OffsetDateTime;

use crate::record::{NewReminder, ReminderStatus};
use crate::ReminderStore;

/// Fixed "now" used by every time-dependent check.
const REFERENCE_TIME: OffsetDateTime = datetime!(2025-06-01 12:00:00 UTC);

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "lifecycle", "status").
    pub category: String,
    /// Test name (e.g. "insert_assigns_unique_ids").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a store backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(lifecycle::run_lifecycle_tests(&factory).await);
    results.extend(status::run_status_tests(&factory).await);
    results.extend(stale::run_stale_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn make_reminder(plate: &str, offset: time::Duration) -> NewReminder {
    NewReminder {
        license_plate: plate.to_string(),
        title: format!("Service {plate}"),
        reminder_type: Some("Service".to_string()),
        due_date: REFERENCE_TIME + offset,
        status: None,
        notes: Some("conformance".to_string()),
        completion_date: None,
    }
}

fn make_reminder_with_status(
    plate: &str,
    offset: time::Duration,
    status: ReminderStatus,
) -> NewReminder {
    make_reminder(plate, offset).with_status(status)
}
