use std::io;

use bytes::Bytes;

use crate::application::services::{
    ActionOutcome, DownloadError, QueueService, QueueView, TaskStoreError, UploadError,
};
use crate::domain::TaskId;

use super::cli::Command;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error("task store: {0}")]
    Store(#[from] TaskStoreError),
    #[error("{action} rejected by server: {reason}")]
    Rejected { action: &'static str, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub async fn execute(command: Command, service: &QueueService) -> Result<(), CommandError> {
    match command {
        Command::Upload { file, watch } => {
            service.migrate().await;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            let data = tokio::fs::read(&file).await?;
            let task = service.upload(&filename, Bytes::from(data)).await?;
            println!("Queued {} as {}", task.filename, task.id);
            if watch {
                watch_queues(service).await;
            }
        }
        Command::List => {
            service.migrate().await;
            print_view(&service.snapshot().await);
        }
        Command::Watch => {
            watch_queues(service).await;
        }
        Command::Cancel { id } => {
            service.migrate().await;
            let outcome = service.cancel_task(&TaskId::new(id)).await?;
            report("cancel", outcome)?;
        }
        Command::Delete { id } => {
            service.migrate().await;
            let outcome = service.delete_by_id(&TaskId::new(id)).await?;
            report("delete", outcome)?;
        }
        Command::Clear => {
            let outcome = service.clear_history().await?;
            report("clear", outcome)?;
        }
        Command::Download { id, output } => {
            service.migrate().await;
            let path = service.download(&TaskId::new(id), &output).await?;
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}

fn report(action: &'static str, outcome: ActionOutcome) -> Result<(), CommandError> {
    match outcome {
        ActionOutcome::Applied => Ok(()),
        ActionOutcome::Declined => {
            println!("Nothing changed.");
            Ok(())
        }
        ActionOutcome::Rejected(reason) => Err(CommandError::Rejected { action, reason }),
    }
}

fn print_view(view: &QueueView) {
    print!("{}", view);
}

async fn watch_queues(service: &QueueService) {
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let mut first = true;
    watch_until_idle(service, interrupt, |view| {
        if !first {
            println!();
        }
        first = false;
        print_view(view);
    })
    .await;
}

/// Starts the service and hands every published view to `emit` until nothing
/// is active or `interrupt` resolves.
pub async fn watch_until_idle<I, F>(service: &QueueService, interrupt: I, mut emit: F)
where
    I: Future<Output = ()>,
    F: FnMut(&QueueView),
{
    let mut views = service.subscribe();
    service.start().await;
    let mut view = views.borrow_and_update().clone();
    emit(&view);

    tokio::pin!(interrupt);

    while view.has_active() {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                view = views.borrow_and_update().clone();
                emit(&view);
            }
            _ = &mut interrupt => {
                tracing::info!("Interrupted, stopping pollers");
                break;
            }
        }
    }
}
