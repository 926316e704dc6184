//! Application state shared across request handlers.

use std::sync::Arc;

use fleetlog_core::ReminderStatusReconciler;
use fleetlog_storage::ReminderStore;

pub(crate) struct AppState<S> {
    /// Reconciler over the reminder store. Handlers reach the store through
    /// [`AppState::store`] so CRUD and reconciliation share one backend.
    pub(crate) reconciler: ReminderStatusReconciler<S>,
}

impl<S: ReminderStore> AppState<S> {
    pub(crate) fn new(reconciler: ReminderStatusReconciler<S>) -> Self {
        Self { reconciler }
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        self.reconciler.store()
    }
}
