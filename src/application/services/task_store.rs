use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::{Map, Value};

use crate::application::ports::{KeyValueStore, KeyValueStoreError};
use crate::domain::{Task, TaskStatus};

pub const DEFAULT_STORAGE_KEY: &str = "audioTasks";

/// Receives the full task list after every persisted change.
///
/// Called while the store's write lock is held, so implementations must not
/// await on the store from inside the callback.
pub trait QueueObserver: Send + Sync {
    fn on_queue_changed(&self, tasks: &[Task]);
}

/// The ordered task list, newest first, persisted as one JSON array under a single key.
pub struct TaskStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: tokio::sync::Mutex<()>,
    observers: Mutex<Vec<Weak<dyn QueueObserver>>>,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            write_lock: tokio::sync::Mutex::new(()),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn subscribe(&self, observer: Weak<dyn QueueObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Reads the persisted list. Absent, unreadable or malformed data yields an empty list.
    pub async fn load(&self) -> Vec<Task> {
        match self.backend.get(&self.key).await {
            Ok(Some(raw)) => match decode_records(&raw) {
                Ok(records) => split_records(records).0,
                Err(e) => {
                    tracing::warn!(error = %e, key = %self.key, "Task store is not a JSON array, treating as empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key, "Failed to read task store");
                Vec::new()
            }
        }
    }

    /// Overwrites the persisted list and notifies observers.
    pub async fn save(&self, tasks: &[Task]) -> Result<(), TaskStoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(tasks, &[]).await
    }

    /// Runs one load/mutate/save cycle under the write lock.
    ///
    /// `mutate` returns whether it changed anything; nothing is written otherwise.
    /// Records that do not decode as a [`Task`] are written back verbatim after
    /// the decoded ones. If the stored value cannot be read at all the mutation
    /// is refused instead of replacing it.
    pub async fn modify<F>(&self, mutate: F) -> Result<bool, TaskStoreError>
    where
        F: FnOnce(&mut Vec<Task>) -> bool + Send,
    {
        let _guard = self.write_lock.lock().await;
        let records = match self.backend.get(&self.key).await? {
            Some(raw) => decode_records(&raw).map_err(TaskStoreError::Unreadable)?,
            None => Vec::new(),
        };
        let (mut tasks, retained) = split_records(records);
        if !mutate(&mut tasks) {
            return Ok(false);
        }
        self.write(&tasks, &retained).await?;
        Ok(true)
    }

    /// Drops the whole history.
    pub async fn clear(&self) -> Result<(), TaskStoreError> {
        let _guard = self.write_lock.lock().await;
        self.backend.remove(&self.key).await?;
        tracing::info!(key = %self.key, "Task history cleared");
        self.notify(&[]);
        Ok(())
    }

    /// Repairs legacy records: `taskId` becomes `id`, and a missing or
    /// unrecognised `status` becomes UNKNOWN. Writes only when something
    /// changed and does not notify observers. Returns whether it wrote.
    pub async fn migrate(&self) -> Result<bool, TaskStoreError> {
        let _guard = self.write_lock.lock().await;

        let raw = match self.backend.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(false),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping migration: task store unreadable");
                return Ok(false);
            }
        };

        let Ok(Value::Array(mut records)) = serde_json::from_str::<Value>(&raw) else {
            tracing::warn!(key = %self.key, "Skipping migration: task store is not a JSON array");
            return Ok(false);
        };

        let mut migrated = 0usize;
        for record in records.iter_mut() {
            if let Value::Object(fields) = record {
                if migrate_record(fields) {
                    migrated += 1;
                }
            }
        }

        if migrated == 0 {
            return Ok(false);
        }

        let encoded = serde_json::to_string(&records)?;
        self.backend.put(&self.key, encoded).await?;
        tracing::info!(records = migrated, "Migrated legacy task records");
        Ok(true)
    }

    async fn write(&self, tasks: &[Task], retained: &[Value]) -> Result<(), TaskStoreError> {
        let mut records = Vec::with_capacity(tasks.len() + retained.len());
        for task in tasks {
            records.push(serde_json::to_value(task)?);
        }
        records.extend(retained.iter().cloned());
        let encoded = serde_json::to_string(&records)?;
        self.backend.put(&self.key, encoded).await?;
        tracing::debug!(tasks = tasks.len(), retained = retained.len(), "Task store saved");
        self.notify(tasks);
        Ok(())
    }

    fn notify(&self, tasks: &[Task]) {
        let live: Vec<Arc<dyn QueueObserver>> = {
            let mut observers = self
                .observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.on_queue_changed(tasks);
        }
    }
}

/// A stored entry, decoded or kept as-is.
enum StoredRecord {
    Task(Task),
    Opaque(Value),
}

fn decode_records(raw: &str) -> Result<Vec<StoredRecord>, serde_json::Error> {
    let records = serde_json::from_str::<Vec<Value>>(raw)?;
    Ok(records
        .into_iter()
        .map(|record| match serde_json::from_value::<Task>(record.clone()) {
            Ok(task) => StoredRecord::Task(task),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable task record");
                StoredRecord::Opaque(record)
            }
        })
        .collect())
}

fn split_records(records: Vec<StoredRecord>) -> (Vec<Task>, Vec<Value>) {
    let mut tasks = Vec::with_capacity(records.len());
    let mut retained = Vec::new();
    for record in records {
        match record {
            StoredRecord::Task(task) => tasks.push(task),
            StoredRecord::Opaque(value) => retained.push(value),
        }
    }
    (tasks, retained)
}

fn migrate_record(fields: &mut Map<String, Value>) -> bool {
    let mut changed = false;

    if id_text(fields.get("id")).is_none() {
        if let Some(legacy) = id_text(fields.get("taskId")) {
            fields.insert("id".to_string(), Value::String(legacy));
            fields.remove("taskId");
            changed = true;
        }
    }

    let status_valid = fields
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.parse::<TaskStatus>().is_ok());
    if !status_valid {
        fields.insert(
            "status".to_string(),
            Value::String(TaskStatus::Unknown.as_str().to_string()),
        );
        changed = true;
    }

    changed
}

fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    #[error("storage backend: {0}")]
    Backend(#[from] KeyValueStoreError),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored task list is unreadable, clear the history to reset it: {0}")]
    Unreadable(serde_json::Error),
}
