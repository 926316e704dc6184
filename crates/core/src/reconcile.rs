//! Batch reconciliation of reminder statuses against a reference time.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use fleetlog_storage::{ReminderStatus, ReminderStore, StorageError};

use crate::error::ReconcileError;

/// Tuning knobs for a [`ReminderStatusReconciler`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Maximum number of status writes in flight at once. Values below 1
    /// are treated as 1 (strictly sequential).
    ///
    /// This only helps backends that can serve writes in parallel.
    /// `JsonFileStore` serializes every write behind its file lock and
    /// rewrites the whole file each time, so a pass over it costs one full
    /// rewrite per changed record whatever this is set to.
    pub concurrency: usize,
    /// Read through [`ReminderStore::list_stale_reminders`] instead of a
    /// full scan.
    pub prefilter: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            prefilter: false,
        }
    }
}

/// A status write that failed during a pass.
#[derive(Debug)]
pub struct WriteFailure {
    pub id: String,
    pub error: StorageError,
}

/// Outcome of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcileReport {
    pub reference_time: OffsetDateTime,
    /// Records read from the store. With prefiltering enabled this is the
    /// number of stale records, not the collection size.
    pub scanned: usize,
    /// Records whose status was successfully rewritten.
    pub updated_count: usize,
    pub failures: Vec<WriteFailure>,
}

impl ReconcileReport {
    /// True when every required write succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Recomputes the `due` / `not due` status of every reminder and writes
/// back only the records whose stored status is absent or different.
///
/// Passes on one reconciler are serialized, so two overlapping triggers
/// never both report the same change. Writes within a pass are independent:
/// a failed write is recorded and the pass moves on. Dropping the future
/// returned by [`reconcile`](Self::reconcile) stops the pass; writes that
/// already landed stay, and the next pass picks up the rest.
pub struct ReminderStatusReconciler<S> {
    store: Arc<S>,
    config: ReconcileConfig,
    pass_lock: Mutex<()>,
}

impl<S: ReminderStore> ReminderStatusReconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, ReconcileConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: ReconcileConfig) -> Self {
        Self {
            store,
            config,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one pass, treating `reference_time` as "now".
    pub async fn reconcile(
        &self,
        reference_time: OffsetDateTime,
    ) -> Result<ReconcileReport, ReconcileError> {
        let _pass = self.pass_lock.lock().await;

        let records = if self.config.prefilter {
            self.store.list_stale_reminders(reference_time).await
        } else {
            self.store.list_reminders().await
        }
        .map_err(ReconcileError::StoreUnavailable)?;
        let scanned = records.len();

        let pending: Vec<(String, ReminderStatus)> = records
            .into_iter()
            .filter_map(|record| {
                let computed = record.computed_status(reference_time);
                (record.status.as_ref() != Some(&computed)).then_some((record.id, computed))
            })
            .collect();

        let store = Arc::clone(&self.store);
        let outcomes: Vec<(String, ReminderStatus, Result<(), StorageError>)> =
            stream::iter(pending)
                .map(move |(id, status)| {
                    let store = Arc::clone(&store);
                    async move {
                        let result = store.update_status(&id, status.clone()).await;
                        (id, status, result)
                    }
                })
                .buffered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut report = ReconcileReport {
            reference_time,
            scanned,
            updated_count: 0,
            failures: Vec::new(),
        };
        for (id, status, result) in outcomes {
            match result {
                Ok(()) => {
                    debug!(reminder = %id, %status, "reminder status updated");
                    report.updated_count += 1;
                }
                Err(error) => {
                    warn!(reminder = %id, %status, %error, "reminder status write failed");
                    report.failures.push(WriteFailure { id, error });
                }
            }
        }

        info!(
            scanned = report.scanned,
            updated = report.updated_count,
            failed = report.failures.len(),
            "reminder reconciliation pass finished"
        );
        Ok(report)
    }
}
