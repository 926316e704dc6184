use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{NewReminder, ReminderPatch, ReminderRecord, ReminderStatus};
use crate::traits::ReminderStore;

/// In-memory reminder store.
///
/// Records live in a mutex-guarded vector so that listing preserves
/// insertion order. Ids are random UUIDs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ReminderRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<ReminderRecord>>, StorageError> {
        self.records
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn list_reminders(&self) -> Result<Vec<ReminderRecord>, StorageError> {
        Ok(self.lock()?.clone())
    }

    async fn get_reminder(&self, id: &str) -> Result<ReminderRecord, StorageError> {
        self.lock()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(id))
    }

    async fn insert_reminder(
        &self,
        reminder: NewReminder,
    ) -> Result<ReminderRecord, StorageError> {
        let record = ReminderRecord::from_new(uuid::Uuid::new_v4().to_string(), reminder);
        self.lock()?.push(record.clone());
        Ok(record)
    }

    async fn update_reminder(
        &self,
        id: &str,
        patch: ReminderPatch,
    ) -> Result<ReminderRecord, StorageError> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::not_found(id))?;
        record.apply(patch);
        Ok(record.clone())
    }

    async fn update_status(&self, id: &str, status: ReminderStatus) -> Result<(), StorageError> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::not_found(id))?;
        record.status = Some(status);
        Ok(())
    }

    async fn delete_reminder(&self, id: &str) -> Result<(), StorageError> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StorageError::not_found(id));
        }
        Ok(())
    }
}
