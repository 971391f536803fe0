pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Command};
pub use commands::{CommandError, execute, watch_until_idle};
pub use config::{Environment, Settings};
