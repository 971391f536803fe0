use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::{ActionMode, DEFAULT_STORAGE_KEY, PollPolicy};

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub polling: PollingSettings,
    pub actions: ActionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub data_dir: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingSettings {
    pub success_delay_ms: u64,
    pub failure_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionModeSetting {
    Optimistic,
    AwaitServer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionSettings {
    pub mode: ActionModeSetting,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Defaults, then `appsettings.{environment}`, then `APP__*` variables.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.base_url", "http://127.0.0.1:5000")?
            .set_default("storage.data_dir", ".audiobook-queue")?
            .set_default("storage.key", DEFAULT_STORAGE_KEY)?
            .set_default("polling.success_delay_ms", 2000)?
            .set_default("polling.failure_delay_ms", 5000)?
            .set_default("actions.mode", "optimistic")?
            .set_default("logging.level", "info,audiobook_queue=debug")?
            .set_default("logging.enable_json", false)?
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

impl PollingSettings {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            success_delay: Duration::from_millis(self.success_delay_ms),
            failure_delay: Duration::from_millis(self.failure_delay_ms),
        }
    }
}

impl From<ActionModeSetting> for ActionMode {
    fn from(setting: ActionModeSetting) -> Self {
        match setting {
            ActionModeSetting::Optimistic => ActionMode::Optimistic,
            ActionModeSetting::AwaitServer => ActionMode::AwaitServer,
        }
    }
}
