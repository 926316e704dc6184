use fleetlog_storage::StorageError;

/// Errors that abort a whole reconciliation pass.
///
/// Per-record write failures do not abort a pass; they are collected in
/// [`ReconcileReport::failures`](crate::ReconcileReport::failures).
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The bulk read failed. No writes were attempted.
    #[error("cannot read reminders: {0}")]
    StoreUnavailable(#[source] StorageError),
}
