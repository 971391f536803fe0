use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "audiobook-queue", version, about = "Submit files for audiobook conversion and track their jobs")]
pub struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Keep task history in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Overrides server.base_url
    #[arg(long, global = true, env = "AUDIOBOOK_QUEUE_SERVER")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a file and queue it for conversion
    Upload {
        file: PathBuf,
        /// Keep running and show progress until the job finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Show active and completed conversions
    List,
    /// Resume polling and show the queues until no job is active
    Watch,
    /// Stop an active conversion
    Cancel { id: String },
    /// Remove a task and its file on the server
    Delete { id: String },
    /// Forget every task
    Clear,
    /// Save the output of a finished conversion
    Download {
        id: String,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}
