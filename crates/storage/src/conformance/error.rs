use std::future::Future;

use super::TestResult;
use crate::{ReminderPatch, ReminderStatus, ReminderStore, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "error",
            "get_unknown_id_not_found",
            get_unknown_id_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "update_status_unknown_id_not_found",
            update_status_unknown_id_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "update_reminder_unknown_id_not_found",
            update_reminder_unknown_id_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "delete_unknown_id_not_found",
            delete_unknown_id_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "failed_status_write_creates_nothing",
            failed_status_write_creates_nothing(factory).await,
        ),
    ]
}

fn expect_not_found<T: std::fmt::Debug>(
    result: Result<T, StorageError>,
    id: &str,
) -> Result<(), String> {
    match result {
        Err(StorageError::NotFound { id: got }) if got == id => Ok(()),
        Err(StorageError::NotFound { id: got }) => {
            Err(format!("NotFound carries id '{}', expected '{}'", got, id))
        }
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

async fn get_unknown_id_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    expect_not_found(s.get_reminder("missing-1").await, "missing-1")
}

async fn update_status_unknown_id_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    expect_not_found(
        s.update_status("missing-2", ReminderStatus::Due).await,
        "missing-2",
    )
}

async fn update_reminder_unknown_id_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    expect_not_found(
        s.update_reminder("missing-3", ReminderPatch::default()).await,
        "missing-3",
    )
}

async fn delete_unknown_id_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    expect_not_found(s.delete_reminder("missing-4").await, "missing-4")
}

/// A status write to an unknown id must not materialize a record.
async fn failed_status_write_creates_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let _ = s.update_status("ghost", ReminderStatus::Due).await;
    let all = s.list_reminders().await.map_err(|e| e.to_string())?;
    if !all.is_empty() {
        return Err(format!("expected empty store, got {:?}", all));
    }
    Ok(())
}
