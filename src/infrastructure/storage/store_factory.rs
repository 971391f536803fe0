use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{KeyValueStore, KeyValueStoreError};
use crate::presentation::config::StorageSettings;

use super::in_memory_key_value_store::InMemoryKeyValueStore;
use super::local_key_value_store::LocalKeyValueStore;

pub struct KeyValueStoreFactory;

impl KeyValueStoreFactory {
    pub fn create(
        settings: &StorageSettings,
        ephemeral: bool,
    ) -> Result<Arc<dyn KeyValueStore>, KeyValueStoreError> {
        if ephemeral {
            tracing::debug!("Using in-memory task storage");
            return Ok(Arc::new(InMemoryKeyValueStore::new()));
        }
        let path = PathBuf::from(&settings.data_dir);
        tracing::debug!(path = %path.display(), "Using on-disk task storage");
        Ok(Arc::new(LocalKeyValueStore::new(path)?))
    }
}
