use crate::presentation::config::{Environment, LoggingSettings};

/// Configuration for tracing initialization.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub default_directive: String,
}

impl TracingConfig {
    /// Settings first, then `LOG_FORMAT` from the process environment.
    pub fn from_settings(settings: &LoggingSettings, environment: Environment) -> Self {
        Self {
            environment: environment.to_string(),
            json_format: settings.enable_json,
            default_directive: settings.level.clone(),
        }
        .with_log_format(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    /// `json` selects the JSON formatter, any other non-empty value the plain one.
    pub fn with_log_format(mut self, format: Option<&str>) -> Self {
        match format.map(str::trim) {
            Some(f) if !f.is_empty() => self.json_format = f.eq_ignore_ascii_case("json"),
            _ => {}
        }
        self
    }
}
