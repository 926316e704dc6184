//! fleetlog-core: reminder status reconciliation.
//!
//! [`ReminderStatusReconciler`] scans every reminder in a
//! [`ReminderStore`](fleetlog_storage::ReminderStore), classifies it as
//! `due` or `not due` against a caller-supplied reference time, and writes
//! back only the records whose stored status disagrees.

mod error;
mod reconcile;

pub use error::ReconcileError;
pub use reconcile::{ReconcileConfig, ReconcileReport, ReminderStatusReconciler, WriteFailure};
