//! HTTP route handlers: health, reminder CRUD, status reconciliation.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::error;

use fleetlog_core::ReconcileError;
use fleetlog_storage::{NewReminder, ReminderPatch, ReminderStore, StorageError};

use super::json_error;
use super::state::AppState;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// GET /api/reminders
pub(crate) async fn handle_list_reminders<S: ReminderStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    match state.store().list_reminders().await {
        Ok(reminders) => (StatusCode::OK, Json(reminders)).into_response(),
        Err(e) => {
            error!(error = %e, "error fetching reminders");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch reminders")
                .into_response()
        }
    }
}

/// Body of POST /api/reminders and PUT /api/reminders/{id}. Every field
/// is optional at the wire level so a missing one on create produces a 400
/// rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReminderRequest {
    license_plate: Option<String>,
    title: Option<String>,
    reminder_type: Option<String>,
    due_date: Option<String>,
    status: Option<String>,
    notes: Option<String>,
    completion_date: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<OffsetDateTime>, String> {
    match value {
        Some(v) => OffsetDateTime::parse(&v, &Rfc3339)
            .map(Some)
            .map_err(|_| format!("invalid '{}': expected an RFC 3339 timestamp", field)),
        None => Ok(None),
    }
}

impl ReminderRequest {
    fn into_new_reminder(self) -> Result<NewReminder, String> {
        let (Some(license_plate), Some(title), Some(due_date), Some(status)) = (
            non_empty(self.license_plate),
            non_empty(self.title),
            non_empty(self.due_date),
            non_empty(self.status),
        ) else {
            return Err("Missing required fields".to_string());
        };
        let due_date = parse_date("due_date", Some(due_date))?
            .ok_or_else(|| "Missing required fields".to_string())?;
        Ok(NewReminder {
            license_plate: license_plate.trim().to_uppercase(),
            title,
            reminder_type: self.reminder_type,
            due_date,
            status: Some(status.into()),
            notes: self.notes,
            completion_date: parse_date("completion_date", self.completion_date)?,
        })
    }

    fn into_patch(self) -> Result<ReminderPatch, String> {
        Ok(ReminderPatch {
            license_plate: non_empty(self.license_plate).map(|p| p.trim().to_uppercase()),
            title: self.title,
            reminder_type: self.reminder_type,
            due_date: parse_date("due_date", self.due_date)?,
            status: self.status.map(Into::into),
            notes: self.notes,
            completion_date: parse_date("completion_date", self.completion_date)?,
        })
    }
}

/// POST /api/reminders
pub(crate) async fn handle_create_reminder<S: ReminderStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<ReminderRequest>,
) -> impl IntoResponse {
    let new = match body.into_new_reminder() {
        Ok(n) => n,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, &msg).into_response(),
    };
    match state.store().insert_reminder(new).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => {
            error!(error = %e, "error creating reminder");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create reminder")
                .into_response()
        }
    }
}

/// PUT /api/reminders/{id}
pub(crate) async fn handle_update_reminder<S: ReminderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(body): Json<ReminderRequest>,
) -> impl IntoResponse {
    let patch = match body.into_patch() {
        Ok(p) => p,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, &msg).into_response(),
    };
    match state.store().update_reminder(&id, patch).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(StorageError::NotFound { .. }) => {
            json_error(StatusCode::NOT_FOUND, "Reminder not found").into_response()
        }
        Err(e) => {
            error!(reminder = %id, error = %e, "error updating reminder");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update reminder")
                .into_response()
        }
    }
}

/// DELETE /api/reminders/{id}
pub(crate) async fn handle_delete_reminder<S: ReminderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store().delete_reminder(&id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "deleted": id }))).into_response(),
        Err(StorageError::NotFound { .. }) => {
            json_error(StatusCode::NOT_FOUND, "Reminder not found").into_response()
        }
        Err(e) => {
            error!(reminder = %id, error = %e, "error deleting reminder");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete reminder")
                .into_response()
        }
    }
}

/// GET /api/reminders/update-status
///
/// Runs one reconciliation pass with the current time as reference.
pub(crate) async fn handle_update_status<S: ReminderStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    match state.reconciler.reconcile(OffsetDateTime::now_utc()).await {
        Ok(report) => {
            let mut response = serde_json::json!({
                "message": "Reminder statuses updated successfully.",
                "updatedCount": report.updated_count,
            });
            if !report.is_complete() {
                let failures: Vec<serde_json::Value> = report
                    .failures
                    .iter()
                    .map(|f| serde_json::json!({ "id": f.id, "error": f.error.to_string() }))
                    .collect();
                response["failedCount"] = serde_json::json!(failures.len());
                response["failures"] = serde_json::Value::Array(failures);
            }
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(ReconcileError::StoreUnavailable(e)) => {
            error!(error = %e, "error updating reminder statuses");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update reminder statuses",
            )
            .into_response()
        }
    }
}
