use bytes::Bytes;

use crate::domain::{StatusReport, TaskId};

/// HTTP surface of the conversion backend.
#[async_trait::async_trait]
pub trait ConversionApi: Send + Sync {
    /// `POST /` with a multipart `file` field; returns the issued job id.
    async fn upload(&self, filename: &str, data: Bytes) -> Result<TaskId, ConversionApiError>;

    async fn status(&self, id: &TaskId) -> Result<StatusReport, ConversionApiError>;

    async fn cancel(&self, id: &TaskId) -> Result<(), ConversionApiError>;

    async fn delete(&self, filename: &str) -> Result<(), ConversionApiError>;

    async fn download(&self, filename: &str) -> Result<Bytes, ConversionApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionApiError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
