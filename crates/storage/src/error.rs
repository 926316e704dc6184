/// All errors that can be returned by a ReminderStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store could not be reached (connection refused, I/O failure,
    /// backend down). Retrying later is expected to succeed.
    #[error("reminder store unavailable: {0}")]
    Unavailable(String),

    /// No reminder with the given id exists.
    #[error("reminder not found: {id}")]
    NotFound { id: String },

    /// A backend-specific failure (serialization, corrupt data, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub(crate) fn not_found(id: &str) -> Self {
        StorageError::NotFound { id: id.to_string() }
    }
}
