use std::future::Future;

use time::Duration;

use super::{make_reminder, make_reminder_with_status, TestResult, REFERENCE_TIME};
use crate::{ReminderStatus, ReminderStore};

pub(super) async fn run_stale_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "stale",
            "stale_listing_matches_full_scan",
            stale_listing_matches_full_scan(factory).await,
        ),
        TestResult::from_result(
            "stale",
            "stale_listing_empty_when_all_current",
            stale_listing_empty_when_all_current(factory).await,
        ),
    ]
}

/// A mixed collection: the stale set must be exactly the records whose
/// stored status disagrees with their due date, in insertion order.
async fn stale_listing_matches_full_scan<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let fixtures = [
        ("NOSTATUS", -Duration::days(1), None),
        ("CURRENT1", -Duration::days(1), Some(ReminderStatus::Due)),
        ("WRONG001", Duration::days(1), Some(ReminderStatus::Due)),
        ("CURRENT2", Duration::days(1), Some(ReminderStatus::NotDue)),
        ("COMPLETE", -Duration::days(1), Some(ReminderStatus::Completed)),
        ("BOUNDARY", Duration::ZERO, Some(ReminderStatus::Due)),
    ];
    for (plate, offset, status) in fixtures.iter().cloned() {
        let new = match status {
            Some(st) => make_reminder_with_status(plate, offset, st),
            None => make_reminder(plate, offset),
        };
        s.insert_reminder(new).await.map_err(|e| e.to_string())?;
    }

    let stale: Vec<String> = s
        .list_stale_reminders(REFERENCE_TIME)
        .await
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|r| r.license_plate)
        .collect();
    let expected = ["NOSTATUS", "WRONG001", "COMPLETE"];
    if stale != expected {
        return Err(format!("expected {:?}, got {:?}", expected, stale));
    }
    Ok(())
}

async fn stale_listing_empty_when_all_current<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ReminderStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.insert_reminder(make_reminder_with_status(
        "ABC123",
        -Duration::hours(1),
        ReminderStatus::Due,
    ))
    .await
    .map_err(|e| e.to_string())?;
    s.insert_reminder(make_reminder_with_status(
        "XYZ789",
        Duration::hours(1),
        ReminderStatus::NotDue,
    ))
    .await
    .map_err(|e| e.to_string())?;
    let stale = s
        .list_stale_reminders(REFERENCE_TIME)
        .await
        .map_err(|e| e.to_string())?;
    if !stale.is_empty() {
        return Err(format!("expected no stale reminders, got {:?}", stale));
    }
    Ok(())
}
