use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Response, Url, multipart};
use serde::Deserialize;

use crate::application::ports::{ConversionApi, ConversionApiError};
use crate::domain::{StatusReport, TaskId};

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    task_id: Option<String>,
}

pub struct HttpConversionApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpConversionApi {
    pub fn new(base_url: &str) -> Result<Self, ConversionApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConversionApiError::Transport(format!("base url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConversionApiError::Transport(format!(
                "base url cannot carry paths: {}",
                base_url
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn ensure_success(response: Response) -> Result<Response, ConversionApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(ConversionApiError::UnexpectedStatus { status, body })
    }
}

fn transport(context: &str, e: reqwest::Error) -> ConversionApiError {
    ConversionApiError::Transport(format!("{}: {}", context, e))
}

#[async_trait]
impl ConversionApi for HttpConversionApi {
    async fn upload(&self, filename: &str, data: Bytes) -> Result<TaskId, ConversionApiError> {
        let part = multipart::Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.base_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport("upload", e))?;
        let response = Self::ensure_success(response).await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ConversionApiError::InvalidResponse(format!("upload body: {}", e)))?;

        let task_id = body
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConversionApiError::InvalidResponse("missing task_id".to_string()))?;

        tracing::info!(task_id = %task_id, filename = %filename, "Upload accepted");
        Ok(TaskId::new(task_id))
    }

    async fn status(&self, id: &TaskId) -> Result<StatusReport, ConversionApiError> {
        let response = self
            .client
            .get(self.endpoint(&["status", id.as_str()]))
            .send()
            .await
            .map_err(|e| transport("status", e))?;
        let response = Self::ensure_success(response).await?;

        response
            .json::<StatusReport>()
            .await
            .map_err(|e| ConversionApiError::InvalidResponse(format!("status body: {}", e)))
    }

    async fn cancel(&self, id: &TaskId) -> Result<(), ConversionApiError> {
        let response = self
            .client
            .post(self.endpoint(&["cancel", id.as_str()]))
            .send()
            .await
            .map_err(|e| transport("cancel", e))?;
        Self::ensure_success(response).await?;
        tracing::debug!(task_id = %id, "Cancel request accepted");
        Ok(())
    }

    async fn delete(&self, filename: &str) -> Result<(), ConversionApiError> {
        let response = self
            .client
            .delete(self.endpoint(&["delete", filename]))
            .send()
            .await
            .map_err(|e| transport("delete", e))?;
        Self::ensure_success(response).await?;
        tracing::debug!(filename = %filename, "Server file deleted");
        Ok(())
    }

    async fn download(&self, filename: &str) -> Result<Bytes, ConversionApiError> {
        let response = self
            .client
            .get(self.endpoint(&["download", filename]))
            .send()
            .await
            .map_err(|e| transport("download", e))?;
        let response = Self::ensure_success(response).await?;

        response
            .bytes()
            .await
            .map_err(|e| transport("download body", e))
    }
}
