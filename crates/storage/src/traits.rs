use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::StorageError;
use crate::record::{NewReminder, ReminderPatch, ReminderRecord, ReminderStatus};

/// The storage trait for reminder backends.
///
/// A `ReminderStore` holds the full collection of reminder records and
/// supports the bulk read and per-record status write that status
/// reconciliation needs, plus the create/edit/delete operations of the
/// surrounding application.
///
/// ## Write Independence
///
/// Every mutating call is an independent operation. There is no
/// transaction spanning several records, so a failure part-way through a
/// batch leaves earlier writes in place.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries.
#[async_trait]
pub trait ReminderStore: Send + Sync + 'static {
    /// Every reminder in the store, in insertion order.
    async fn list_reminders(&self) -> Result<Vec<ReminderRecord>, StorageError>;

    /// Read a single reminder.
    ///
    /// Returns `Err(StorageError::NotFound)` if the id is unknown.
    async fn get_reminder(&self, id: &str) -> Result<ReminderRecord, StorageError>;

    /// Insert a reminder and return it with its newly assigned id.
    async fn insert_reminder(&self, reminder: NewReminder)
        -> Result<ReminderRecord, StorageError>;

    /// Apply a partial update and return the updated record.
    ///
    /// Returns `Err(StorageError::NotFound)` if the id is unknown.
    async fn update_reminder(
        &self,
        id: &str,
        patch: ReminderPatch,
    ) -> Result<ReminderRecord, StorageError>;

    /// Set the status field of one reminder. No other field changes.
    ///
    /// Returns `Err(StorageError::NotFound)` if the id is unknown.
    async fn update_status(&self, id: &str, status: ReminderStatus) -> Result<(), StorageError>;

    /// Remove a reminder.
    ///
    /// Returns `Err(StorageError::NotFound)` if the id is unknown.
    async fn delete_reminder(&self, id: &str) -> Result<(), StorageError>;

    /// Reminders whose stored status is absent or differs from the status
    /// computed at `reference_time`.
    ///
    /// The default scans [`list_reminders`](Self::list_reminders) and filters
    /// in memory. Backends with a query language may push the comparison
    /// down, but must return exactly the same set.
    async fn list_stale_reminders(
        &self,
        reference_time: OffsetDateTime,
    ) -> Result<Vec<ReminderRecord>, StorageError> {
        let all = self.list_reminders().await?;
        Ok(all
            .into_iter()
            .filter(|r| r.needs_status_update(reference_time))
            .collect())
    }
}
