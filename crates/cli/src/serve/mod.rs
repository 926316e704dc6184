//! `fleetlog serve` -- HTTP JSON API for fleet maintenance reminders.
//!
//! Exposes the reminder store and the status reconciler as an async HTTP
//! service using `axum` + `tokio`.
//!
//! Endpoints:
//! - GET    /health                        - Server status
//! - GET    /api/reminders                 - List all reminders
//! - POST   /api/reminders                 - Create a reminder
//! - PUT    /api/reminders/{id}            - Edit a reminder
//! - DELETE /api/reminders/{id}            - Delete a reminder
//! - GET    /api/reminders/update-status   - Run one reconciliation pass
//!
//! With `--reconcile-interval`, a background task also runs a pass on a
//! fixed period. All responses use Content-Type: application/json.

mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use fleetlog_core::ReminderStatusReconciler;
use fleetlog_storage::{JsonFileStore, ReminderStore};

use self::handlers::{
    handle_create_reminder, handle_delete_reminder, handle_health, handle_list_reminders,
    handle_not_found, handle_update_reminder, handle_update_status,
};
use self::state::AppState;
use crate::config::Config;

/// Maximum request body size: 1 MB.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Build the router over any reminder store.
fn router<S: ReminderStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/reminders",
            get(handle_list_reminders::<S>).post(handle_create_reminder::<S>),
        )
        .route(
            "/api/reminders/update-status",
            get(handle_update_status::<S>),
        )
        .route(
            "/api/reminders/{id}",
            axum::routing::put(handle_update_reminder::<S>)
                .delete(handle_delete_reminder::<S>),
        )
        .fallback(handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server with the JSON file store named in `config`.
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(JsonFileStore::open(&config.data).await?);
    info!(data = %config.data.display(), "reminder store opened");

    let reconciler = ReminderStatusReconciler::with_config(store, config.reconcile.clone());
    let state = Arc::new(AppState::new(reconciler));

    if let Some(secs) = config.reconcile_interval_secs.filter(|s| *s > 0) {
        info!(every_secs = secs, "periodic reconciliation enabled");
        tokio::spawn(run_periodic_reconcile(state.clone(), Duration::from_secs(secs)));
    }

    let app = router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("fleetlog listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Run a reconciliation pass every `period`, forever. Failures are logged
/// and retried on the next tick.
async fn run_periodic_reconcile<S: ReminderStore>(state: Arc<AppState<S>>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match state.reconciler.reconcile(OffsetDateTime::now_utc()).await {
            Ok(report) if report.is_complete() => {}
            Ok(report) => warn!(
                failed = report.failures.len(),
                "periodic reconciliation left reminders unreconciled"
            ),
            Err(e) => error!(error = %e, "periodic reconciliation failed"),
        }
    }
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use fleetlog_storage::{
        MemoryStore, NewReminder, ReminderPatch, ReminderRecord, ReminderStatus, StorageError,
    };
    use tower::ServiceExt;

    use super::*;

    /// Memory store whose reads, or writes to one id, can be made to fail.
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes_to: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ReminderStore for FailingStore {
        async fn list_reminders(&self) -> Result<Vec<ReminderRecord>, StorageError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("connection refused".to_string()));
            }
            self.inner.list_reminders().await
        }

        async fn get_reminder(&self, id: &str) -> Result<ReminderRecord, StorageError> {
            self.inner.get_reminder(id).await
        }

        async fn insert_reminder(
            &self,
            reminder: NewReminder,
        ) -> Result<ReminderRecord, StorageError> {
            self.inner.insert_reminder(reminder).await
        }

        async fn update_reminder(
            &self,
            id: &str,
            patch: ReminderPatch,
        ) -> Result<ReminderRecord, StorageError> {
            self.inner.update_reminder(id, patch).await
        }

        async fn update_status(
            &self,
            id: &str,
            status: ReminderStatus,
        ) -> Result<(), StorageError> {
            let failing = self.fail_writes_to.lock().unwrap().as_deref() == Some(id);
            if failing {
                return Err(StorageError::Unavailable("write timed out".to_string()));
            }
            self.inner.update_status(id, status).await
        }

        async fn delete_reminder(&self, id: &str) -> Result<(), StorageError> {
            self.inner.delete_reminder(id).await
        }
    }

    async fn seeded() -> (Arc<FailingStore>, Vec<String>) {
        let store = Arc::new(FailingStore::default());
        let now = OffsetDateTime::now_utc();
        let mut ids = Vec::new();
        for (plate, offset) in [("ABC123", -1), ("XYZ789", 1)] {
            let new = NewReminder::new(plate, "Service", now + time::Duration::days(offset));
            ids.push(store.insert_reminder(new).await.unwrap().id);
        }
        (store, ids)
    }

    fn state_for(store: &Arc<FailingStore>) -> Arc<AppState<FailingStore>> {
        Arc::new(AppState::new(ReminderStatusReconciler::new(store.clone())))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY_SIZE)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn update_status_reports_failed_writes() {
        let (store, ids) = seeded().await;
        *store.fail_writes_to.lock().unwrap() = Some(ids[1].clone());

        let (status, body) = call(router(state_for(&store)), "/api/reminders/update-status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updatedCount"], 1);
        assert_eq!(body["failedCount"], 1);
        assert_eq!(body["failures"][0]["id"], ids[1].as_str());
        assert!(body["failures"][0]["error"]
            .as_str()
            .unwrap()
            .contains("write timed out"));
    }

    #[tokio::test]
    async fn update_status_read_failure_is_500() {
        let (store, ids) = seeded().await;
        store.fail_reads.store(true, Ordering::SeqCst);

        let (status, body) = call(router(state_for(&store)), "/api/reminders/update-status").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to update reminder statuses");
        assert_eq!(store.get_reminder(&ids[0]).await.unwrap().status, None);
    }

    #[tokio::test]
    async fn list_read_failure_is_500() {
        let (store, _) = seeded().await;
        store.fail_reads.store(true, Ordering::SeqCst);

        let (status, body) = call(router(state_for(&store)), "/api/reminders").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch reminders");
    }

    #[tokio::test]
    async fn periodic_task_reconciles_without_a_request() {
        let (store, ids) = seeded().await;
        let task = tokio::spawn(run_periodic_reconcile(
            state_for(&store),
            Duration::from_millis(20),
        ));

        let mut statuses = (None, None);
        for _ in 0..100 {
            statuses = (
                store.get_reminder(&ids[0]).await.unwrap().status,
                store.get_reminder(&ids[1]).await.unwrap().status,
            );
            if statuses.0.is_some() && statuses.1.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        task.abort();

        assert_eq!(
            statuses,
            (Some(ReminderStatus::Due), Some(ReminderStatus::NotDue))
        );
    }
}
