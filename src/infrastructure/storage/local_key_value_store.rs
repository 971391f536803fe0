use std::path::PathBuf;
use std::sync::Arc;

use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{KeyValueStore, KeyValueStoreError};

/// One JSON file per key under a base directory.
pub struct LocalKeyValueStore {
    inner: Arc<LocalFileSystem>,
}

impl LocalKeyValueStore {
    pub fn new(base_path: PathBuf) -> Result<Self, KeyValueStoreError> {
        std::fs::create_dir_all(&base_path).map_err(KeyValueStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| KeyValueStoreError::Write(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }

    fn path_for(key: &str) -> StorePath {
        StorePath::from(format!("{}.json", key))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for LocalKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let result = match self.inner.get(&Self::path_for(key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(KeyValueStoreError::Read(e.to_string())),
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| KeyValueStoreError::Read(e.to_string()))?;

        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| KeyValueStoreError::Read(e.to_string()))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), KeyValueStoreError> {
        self.inner
            .put(&Self::path_for(key), PutPayload::from(value))
            .await
            .map(|_| ())
            .map_err(|e| KeyValueStoreError::Write(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        match self.inner.delete(&Self::path_for(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(KeyValueStoreError::Write(e.to_string())),
        }
    }
}
