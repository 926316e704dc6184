use std::future::Future;

use time::Duration;

use super::{make_reminder, TestResult};
use crate::{ReminderPatch, ReminderStatus, ReminderStore};

pub(super) async fn run_lifecycle_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "lifecycle",
            "empty_store_lists_nothing",
            empty_store_lists_nothing(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "insert_assigns_unique_ids",
            insert_assigns_unique_ids(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "inserted_reminder_readable",
            inserted_reminder_readable(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "list_preserves_insertion_order",
            list_preserves_insertion_order(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "update_reminder_applies_patch",
            update_reminder_applies_patch(factory).await,
        ),
        TestResult::from_result(
            "lifecycle",
            "delete_removes_only_target",
            delete_removes_only_target(factory).await,
        ),
    ]
}

async fn empty_store_lists_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let all = s.list_reminders().await.map_err(|e| e.to_string())?;
    if !all.is_empty() {
        return Err(format!("expected empty store, got {} records", all.len()));
    }
    Ok(())
}

async fn insert_assigns_unique_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = s
        .insert_reminder(make_reminder("ABC123", Duration::ZERO))
        .await
        .map_err(|e| e.to_string())?;
    let b = s
        .insert_reminder(make_reminder("ABC123", Duration::ZERO))
        .await
        .map_err(|e| e.to_string())?;
    if a.id.is_empty() || b.id.is_empty() {
        return Err("store assigned an empty id".to_string());
    }
    if a.id == b.id {
        return Err(format!("two inserts share id {}", a.id));
    }
    Ok(())
}

async fn inserted_reminder_readable<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let new = make_reminder("XYZ789", Duration::days(3));
    let inserted = s
        .insert_reminder(new.clone())
        .await
        .map_err(|e| e.to_string())?;
    let back = s
        .get_reminder(&inserted.id)
        .await
        .map_err(|e| e.to_string())?;
    if back != inserted {
        return Err(format!("read back {:?}, inserted {:?}", back, inserted));
    }
    if back.due_date != new.due_date || back.license_plate != new.license_plate {
        return Err("stored fields differ from insert payload".to_string());
    }
    if back.status.is_some() {
        return Err(format!("expected no status, got {:?}", back.status));
    }
    Ok(())
}

async fn list_preserves_insertion_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let plates = ["ABC123", "XYZ789", "DEF456"];
    for plate in plates {
        s.insert_reminder(make_reminder(plate, Duration::ZERO))
            .await
            .map_err(|e| e.to_string())?;
    }
    let listed: Vec<String> = s
        .list_reminders()
        .await
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|r| r.license_plate)
        .collect();
    if listed != plates {
        return Err(format!("expected {:?}, got {:?}", plates, listed));
    }
    Ok(())
}

async fn update_reminder_applies_patch<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = s
        .insert_reminder(make_reminder("ABC123", Duration::days(1)))
        .await
        .map_err(|e| e.to_string())?;
    let new_due = rec.due_date + Duration::days(30);
    let updated = s
        .update_reminder(
            &rec.id,
            ReminderPatch {
                due_date: Some(new_due),
                status: Some(ReminderStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    if updated.due_date != new_due || updated.status != Some(ReminderStatus::Completed) {
        return Err(format!("patch not applied: {:?}", updated));
    }
    if updated.title != rec.title || updated.id != rec.id {
        return Err("patch changed untouched fields".to_string());
    }
    let back = s.get_reminder(&rec.id).await.map_err(|e| e.to_string())?;
    if back != updated {
        return Err("update not visible on read".to_string());
    }
    Ok(())
}

async fn delete_removes_only_target<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = s
        .insert_reminder(make_reminder("ABC123", Duration::ZERO))
        .await
        .map_err(|e| e.to_string())?;
    let b = s
        .insert_reminder(make_reminder("XYZ789", Duration::ZERO))
        .await
        .map_err(|e| e.to_string())?;
    s.delete_reminder(&a.id).await.map_err(|e| e.to_string())?;
    let remaining = s.list_reminders().await.map_err(|e| e.to_string())?;
    if remaining.len() != 1 || remaining[0].id != b.id {
        return Err(format!("expected only {}, got {:?}", b.id, remaining));
    }
    Ok(())
}
