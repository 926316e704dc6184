use std::future::Future;

use time::Duration;

use super::{make_reminder, make_reminder_with_status, TestResult};
use crate::{ReminderStatus, ReminderStore};

pub(super) async fn run_status_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "status",
            "update_status_sets_status",
            update_status_sets_status(factory).await,
        ),
        TestResult::from_result(
            "status",
            "update_status_touches_no_other_field",
            update_status_touches_no_other_field(factory).await,
        ),
        TestResult::from_result(
            "status",
            "update_status_overwrites_foreign_value",
            update_status_overwrites_foreign_value(factory).await,
        ),
        TestResult::from_result(
            "status",
            "update_status_leaves_other_records_alone",
            update_status_leaves_other_records_alone(factory).await,
        ),
        TestResult::from_result(
            "status",
            "unknown_status_string_round_trips",
            unknown_status_string_round_trips(factory).await,
        ),
    ]
}

async fn update_status_sets_status<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = s
        .insert_reminder(make_reminder("ABC123", Duration::ZERO))
        .await
        .map_err(|e| e.to_string())?;
    s.update_status(&rec.id, ReminderStatus::NotDue)
        .await
        .map_err(|e| e.to_string())?;
    let back = s.get_reminder(&rec.id).await.map_err(|e| e.to_string())?;
    if back.status != Some(ReminderStatus::NotDue) {
        return Err(format!("expected 'not due', got {:?}", back.status));
    }
    Ok(())
}

async fn update_status_touches_no_other_field<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = s
        .insert_reminder(make_reminder("ABC123", -Duration::days(2)))
        .await
        .map_err(|e| e.to_string())?;
    s.update_status(&rec.id, ReminderStatus::Due)
        .await
        .map_err(|e| e.to_string())?;
    let mut back = s.get_reminder(&rec.id).await.map_err(|e| e.to_string())?;
    back.status = None;
    if back != rec {
        return Err(format!("fields besides status changed: {:?}", back));
    }
    Ok(())
}

async fn update_status_overwrites_foreign_value<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = s
        .insert_reminder(make_reminder_with_status(
            "ABC123",
            -Duration::days(1),
            ReminderStatus::Completed,
        ))
        .await
        .map_err(|e| e.to_string())?;
    s.update_status(&rec.id, ReminderStatus::Due)
        .await
        .map_err(|e| e.to_string())?;
    let back = s.get_reminder(&rec.id).await.map_err(|e| e.to_string())?;
    if back.status != Some(ReminderStatus::Due) {
        return Err(format!("expected 'due', got {:?}", back.status));
    }
    Ok(())
}

async fn update_status_leaves_other_records_alone<S, F, Fut>(factory: &F) -> Result<(), String>
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
        .insert_reminder(make_reminder_with_status(
            "XYZ789",
            Duration::ZERO,
            ReminderStatus::Pending,
        ))
        .await
        .map_err(|e| e.to_string())?;
    s.update_status(&a.id, ReminderStatus::Due)
        .await
        .map_err(|e| e.to_string())?;
    let other = s.get_reminder(&b.id).await.map_err(|e| e.to_string())?;
    if other.status != Some(ReminderStatus::Pending) {
        return Err(format!("neighbour status changed to {:?}", other.status));
    }
    Ok(())
}

async fn unknown_status_string_round_trips<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let snoozed = ReminderStatus::Other("snoozed".to_string());
    let rec = s
        .insert_reminder(make_reminder_with_status(
            "ABC123",
            Duration::ZERO,
            snoozed.clone(),
        ))
        .await
        .map_err(|e| e.to_string())?;
    let back = s.get_reminder(&rec.id).await.map_err(|e| e.to_string())?;
    if back.status != Some(snoozed) {
        return Err(format!("expected 'snoozed', got {:?}", back.status));
    }
    Ok(())
}
