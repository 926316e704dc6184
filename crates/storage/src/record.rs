use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle status stored on a reminder.
///
/// The reconciler only ever writes [`ReminderStatus::Due`] and
/// [`ReminderStatus::NotDue`]; the remaining values come from user edits.
/// Any unrecognized string is kept verbatim in [`ReminderStatus::Other`]
/// so that it round-trips through the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReminderStatus {
    Due,
    NotDue,
    Pending,
    Completed,
    Overdue,
    Other(String),
}

impl ReminderStatus {
    /// Two-valued classification of a due date against a reference time.
    ///
    /// A reminder due exactly at `reference_time` is `Due`.
    pub fn for_due_date(due_date: OffsetDateTime, reference_time: OffsetDateTime) -> Self {
        if due_date <= reference_time {
            ReminderStatus::Due
        } else {
            ReminderStatus::NotDue
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReminderStatus::Due => "due",
            ReminderStatus::NotDue => "not due",
            ReminderStatus::Pending => "pending",
            ReminderStatus::Completed => "completed",
            ReminderStatus::Overdue => "overdue",
            ReminderStatus::Other(s) => s,
        }
    }
}

impl From<String> for ReminderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "due" => ReminderStatus::Due,
            "not due" => ReminderStatus::NotDue,
            "pending" => ReminderStatus::Pending,
            "completed" => ReminderStatus::Completed,
            "overdue" => ReminderStatus::Overdue,
            _ => ReminderStatus::Other(s),
        }
    }
}

impl From<&str> for ReminderStatus {
    fn from(s: &str) -> Self {
        ReminderStatus::from(s.to_string())
    }
}

impl From<ReminderStatus> for String {
    fn from(status: ReminderStatus) -> Self {
        match status {
            ReminderStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled maintenance or service action tied to a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    /// Store-assigned identifier. Never changes after insertion.
    pub id: String,
    /// Vehicle the reminder belongs to (upper-cased license plate).
    pub license_plate: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    /// `None` when the reminder has never been classified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReminderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub completion_date: Option<OffsetDateTime>,
}

impl ReminderRecord {
    pub(crate) fn from_new(id: String, new: NewReminder) -> Self {
        Self {
            id,
            license_plate: new.license_plate,
            title: new.title,
            reminder_type: new.reminder_type,
            due_date: new.due_date,
            status: new.status,
            notes: new.notes,
            completion_date: new.completion_date,
        }
    }

    /// The status this reminder should hold at `reference_time`.
    pub fn computed_status(&self, reference_time: OffsetDateTime) -> ReminderStatus {
        ReminderStatus::for_due_date(self.due_date, reference_time)
    }

    /// True when the stored status is absent or differs from
    /// [`computed_status`](Self::computed_status).
    pub fn needs_status_update(&self, reference_time: OffsetDateTime) -> bool {
        self.status.as_ref() != Some(&self.computed_status(reference_time))
    }

    pub(crate) fn apply(&mut self, patch: ReminderPatch) {
        if let Some(license_plate) = patch.license_plate {
            self.license_plate = license_plate;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(reminder_type) = patch.reminder_type {
            self.reminder_type = Some(reminder_type);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(completion_date) = patch.completion_date {
            self.completion_date = Some(completion_date);
        }
    }
}

/// Payload for creating a reminder. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReminder {
    pub license_plate: String,
    pub title: String,
    #[serde(default)]
    pub reminder_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    #[serde(default)]
    pub status: Option<ReminderStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completion_date: Option<OffsetDateTime>,
}

impl NewReminder {
    pub fn new(license_plate: &str, title: &str, due_date: OffsetDateTime) -> Self {
        Self {
            license_plate: license_plate.to_string(),
            title: title.to_string(),
            reminder_type: None,
            due_date,
            status: None,
            notes: None,
            completion_date: None,
        }
    }

    pub fn with_status(mut self, status: ReminderStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Partial update of a reminder. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReminderPatch {
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub reminder_type: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub status: Option<ReminderStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completion_date: Option<OffsetDateTime>,
}
