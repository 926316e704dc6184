use std::future::Future;
use std::sync::Arc;

use time::Duration;

use super::{make_reminder, TestResult};
use crate::{ReminderStatus, ReminderStore, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "concurrent_status_writes_different_records_all_land",
            concurrent_status_writes_different_records_all_land(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_identical_writes_same_record_converge",
            concurrent_identical_writes_same_record_converge(factory).await,
        ),
    ]
}

// ── Independent records ─────────────────────────────────────────────────────

/// N tasks each set the status of a different reminder. Every write must
/// land; no write may be lost to another task's rewrite of the collection.
async fn concurrent_status_writes_different_records_all_land<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let mut ids = Vec::new();
    for i in 0..N {
        let rec = storage
            .insert_reminder(make_reminder(&format!("CAR{i:03}"), -Duration::days(1)))
            .await
            .map_err(|e| format!("insert: {e}"))?;
        ids.push(rec.id);
    }

    let mut handles = Vec::new();
    for id in ids.clone() {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.update_status(&id, ReminderStatus::Due).await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
    }

    let all = storage
        .list_reminders()
        .await
        .map_err(|e| format!("list: {e}"))?;
    let due = all
        .iter()
        .filter(|r| r.status == Some(ReminderStatus::Due))
        .count();
    if due != N {
        return Err(format!("expected {N} records marked due, got {due}"));
    }
    Ok(())
}

// ── Same record, same value ─────────────────────────────────────────────────

/// Overlapping reconciliation passes may write the same value to the same
/// record. All such writes succeed and the record ends in that state.
async fn concurrent_identical_writes_same_record_converge<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let rec = storage
        .insert_reminder(make_reminder("ABC123", Duration::days(1)))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = storage.clone();
        let id = rec.id.clone();
        handles.push(tokio::spawn(async move {
            s.update_status(&id, ReminderStatus::NotDue).await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
    }

    let back = storage
        .get_reminder(&rec.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    if back.status != Some(ReminderStatus::NotDue) {
        return Err(format!("expected 'not due', got {:?}", back.status));
    }
    let count = storage
        .list_reminders()
        .await
        .map_err(|e| format!("list: {e}"))?
        .len();
    if count != 1 {
        return Err(format!("expected 1 record, got {count}"));
    }
    Ok(())
}
