use std::io;

/// Persistent string-valued storage keyed by name, the client's only durable state.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    async fn put(&self, key: &str, value: String) -> Result<(), KeyValueStoreError>;

    /// Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KeyValueStoreError {
    #[error("read failed: {0}")]
    Read(String),
    #[error("write failed: {0}")]
    Write(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
