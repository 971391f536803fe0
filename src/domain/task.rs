use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{TaskId, TaskStatus};

/// One submitted conversion as persisted in the task store.
///
/// Older records may lack `date` or carry a null `filename`; both still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub filename: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_filename: Option<String>,
}

impl Task {
    pub fn new(id: TaskId, filename: String) -> Self {
        Self {
            id,
            filename,
            status: TaskStatus::Pending,
            date: Some(Utc::now()),
            result_filename: None,
        }
    }

    /// Name shown to the user: the output file once there is one.
    pub fn display_name(&self) -> &str {
        self.result_filename.as_deref().unwrap_or(&self.filename)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
