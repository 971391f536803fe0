mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    ActionModeSetting, ActionSettings, LoggingSettings, PollingSettings, ServerSettings, Settings,
    StorageSettings,
};
