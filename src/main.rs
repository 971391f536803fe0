use std::sync::Arc;

use clap::Parser;

use audiobook_queue::application::ports::{Confirmation, ConversionApi};
use audiobook_queue::application::services::{QueueService, TaskStore};
use audiobook_queue::infrastructure::console::{AutoConfirm, StdinConfirmation};
use audiobook_queue::infrastructure::http::HttpConversionApi;
use audiobook_queue::infrastructure::observability::{TracingConfig, init_tracing};
use audiobook_queue::infrastructure::storage::KeyValueStoreFactory;
use audiobook_queue::presentation::{Cli, Environment, Settings, execute};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment)?;

    init_tracing(TracingConfig::from_settings(&settings.logging, environment));

    let base_url = cli
        .server
        .clone()
        .unwrap_or_else(|| settings.server.base_url.clone());
    let api: Arc<dyn ConversionApi> = Arc::new(HttpConversionApi::new(&base_url)?);
    let confirmation: Arc<dyn Confirmation> = if cli.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirmation)
    };

    let backend = KeyValueStoreFactory::create(&settings.storage, cli.ephemeral)?;
    let store = Arc::new(TaskStore::new(backend, settings.storage.key.clone()));

    tracing::info!(
        server = %base_url,
        environment = %environment,
        storage_key = %store.key(),
        "Client initialized"
    );

    let service = QueueService::new(
        store,
        api,
        confirmation,
        settings.polling.policy(),
        settings.actions.mode.into(),
    );

    let result = execute(cli.command, &service).await;
    service.shutdown().await;
    result?;
    Ok(())
}
