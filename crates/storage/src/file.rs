use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use crate::error::StorageError;
use crate::record::{NewReminder, ReminderPatch, ReminderRecord, ReminderStatus};
use crate::traits::ReminderStore;

/// Reminder store persisted as a JSON array in a single file.
///
/// Nothing is cached: every call reads the file, so several handles (or
/// several processes, such as a scheduled `reconcile` next to a running
/// server) can share one path. Mutations are read-modify-write cycles held
/// under an exclusive advisory lock on a `<file>.lock` sibling, and the new
/// document is written to a temp file and renamed into place, so readers
/// never see a truncated file and need no lock.
///
/// Each mutation rewrites the whole document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// is created on the first write. An existing file must parse.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let lock_path = sibling(&path, ".lock");
        let check = path.clone();
        run_blocking(move || read_records(&check).map(drop)).await?;
        Ok(Self { path, lock_path })
    }

    async fn read(&self) -> Result<Vec<ReminderRecord>, StorageError> {
        let path = self.path.clone();
        run_blocking(move || read_records(&path)).await
    }

    /// Lock, load the current document, apply `change`, and write it back.
    /// Nothing is written when `change` fails.
    async fn mutate<T, F>(&self, change: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<ReminderRecord>) -> Result<T, StorageError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        run_blocking(move || {
            let _lock = StoreLock::acquire(&lock_path)?;
            let mut records = read_records(&path)?;
            let out = change(&mut records)?;
            write_records(&path, &records)?;
            Ok(out)
        })
        .await
    }
}

/// Exclusive advisory lock on the store's lock file, released on drop.
struct StoreLock {
    file: File,
}

impl StoreLock {
    fn acquire(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| {
                StorageError::Unavailable(format!("cannot open lock '{}': {}", path.display(), e))
            })?;
        file.lock_exclusive().map_err(|e| {
            StorageError::Unavailable(format!("cannot lock '{}': {}", path.display(), e))
        })?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

async fn run_blocking<T, F>(job: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| StorageError::Backend(format!("file store task failed: {}", e)))?
}

fn read_records(path: &Path) -> Result<Vec<ReminderRecord>, StorageError> {
    match std::fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
        Ok(text) => serde_json::from_str(&text).map_err(|e| {
            StorageError::Backend(format!("invalid reminder file '{}': {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StorageError::Unavailable(format!(
            "cannot read '{}': {}",
            path.display(),
            e
        ))),
    }
}

fn write_records(path: &Path, records: &[ReminderRecord]) -> Result<(), StorageError> {
    let text = serde_json::to_string_pretty(records)
        .map_err(|e| StorageError::Backend(format!("serialize reminders: {}", e)))?;
    let tmp = sibling(path, ".tmp");
    std::fs::write(&tmp, text).map_err(|e| {
        StorageError::Unavailable(format!("cannot write '{}': {}", tmp.display(), e))
    })?;
    std::fs::rename(&tmp, path).map_err(|e| {
        StorageError::Unavailable(format!("cannot replace '{}': {}", path.display(), e))
    })
}

fn find_mut<'a>(
    records: &'a mut [ReminderRecord],
    id: &str,
) -> Result<&'a mut ReminderRecord, StorageError> {
    records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| StorageError::not_found(id))
}

#[async_trait]
impl ReminderStore for JsonFileStore {
    async fn list_reminders(&self) -> Result<Vec<ReminderRecord>, StorageError> {
        self.read().await
    }

    async fn get_reminder(&self, id: &str) -> Result<ReminderRecord, StorageError> {
        self.read()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::not_found(id))
    }

    async fn insert_reminder(
        &self,
        reminder: NewReminder,
    ) -> Result<ReminderRecord, StorageError> {
        let record = ReminderRecord::from_new(uuid::Uuid::new_v4().to_string(), reminder);
        let stored = record.clone();
        self.mutate(move |records| {
            records.push(stored);
            Ok(())
        })
        .await?;
        Ok(record)
    }

    async fn update_reminder(
        &self,
        id: &str,
        patch: ReminderPatch,
    ) -> Result<ReminderRecord, StorageError> {
        let id = id.to_string();
        self.mutate(move |records| {
            let record = find_mut(records, &id)?;
            record.apply(patch);
            Ok(record.clone())
        })
        .await
    }

    async fn update_status(&self, id: &str, status: ReminderStatus) -> Result<(), StorageError> {
        let id = id.to_string();
        self.mutate(move |records| {
            find_mut(records, &id)?.status = Some(status);
            Ok(())
        })
        .await
    }

    async fn delete_reminder(&self, id: &str) -> Result<(), StorageError> {
        let id = id.to_string();
        self.mutate(move |records| {
            let before = records.len();
            records.retain(|r| r.id != id);
            if records.len() == before {
                return Err(StorageError::not_found(&id));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn oil_change() -> NewReminder {
        NewReminder::new("ABC123", "Oil change", datetime!(2025-06-01 12:00:00 UTC))
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("reminders.json"))
            .await
            .unwrap();
        assert!(store.list_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        let rec = store.insert_reminder(oil_change()).await.unwrap();
        store
            .update_status(&rec.id, ReminderStatus::Due)
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let back = reopened.get_reminder(&rec.id).await.unwrap();
        assert_eq!(back.status, Some(ReminderStatus::Due));
        assert_eq!(back.license_plate, "ABC123");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        std::fs::write(&path, "{not json").unwrap();
        match JsonFileStore::open(&path).await {
            Err(StorageError::Backend(_)) => {}
            other => panic!("expected Backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        let rec = store.insert_reminder(oil_change()).await.unwrap();

        // A directory where the temp file goes makes every rewrite fail.
        std::fs::create_dir(dir.path().join("reminders.json.tmp")).unwrap();

        let err = store
            .update_status(&rec.id, ReminderStatus::Due)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)), "{err:?}");
        assert_eq!(store.get_reminder(&rec.id).await.unwrap().status, None);
    }

    #[tokio::test]
    async fn status_write_keeps_edit_from_other_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let server = JsonFileStore::open(&path).await.unwrap();
        let rec = server.insert_reminder(oil_change()).await.unwrap();

        let scheduled = JsonFileStore::open(&path).await.unwrap();
        server
            .update_reminder(
                &rec.id,
                ReminderPatch {
                    title: Some("Brake pads".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        scheduled
            .update_status(&rec.id, ReminderStatus::Due)
            .await
            .unwrap();

        let back = JsonFileStore::open(&path)
            .await
            .unwrap()
            .get_reminder(&rec.id)
            .await
            .unwrap();
        assert_eq!(back.title, "Brake pads");
        assert_eq!(back.status, Some(ReminderStatus::Due));
    }

    #[tokio::test]
    async fn status_write_keeps_insert_from_other_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let server = JsonFileStore::open(&path).await.unwrap();
        let first = server.insert_reminder(oil_change()).await.unwrap();

        let scheduled = JsonFileStore::open(&path).await.unwrap();
        server.insert_reminder(oil_change()).await.unwrap();
        scheduled
            .update_status(&first.id, ReminderStatus::Due)
            .await
            .unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.list_reminders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reads_see_writes_from_other_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let server = JsonFileStore::open(&path).await.unwrap();
        let rec = server.insert_reminder(oil_change()).await.unwrap();

        let scheduled = JsonFileStore::open(&path).await.unwrap();
        scheduled
            .update_status(&rec.id, ReminderStatus::Due)
            .await
            .unwrap();

        assert_eq!(
            server.get_reminder(&rec.id).await.unwrap().status,
            Some(ReminderStatus::Due)
        );
        assert_eq!(
            server.list_reminders().await.unwrap()[0].status,
            Some(ReminderStatus::Due)
        );
    }

    #[tokio::test]
    async fn concurrent_inserts_across_handles_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        let a = std::sync::Arc::new(JsonFileStore::open(&path).await.unwrap());
        let b = std::sync::Arc::new(JsonFileStore::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = if i % 2 == 0 { a.clone() } else { b.clone() };
            handles.push(tokio::spawn(async move {
                store.insert_reminder(oil_change()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(a.list_reminders().await.unwrap().len(), 10);
    }
}
