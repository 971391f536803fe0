use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::sync::watch;

use crate::domain::{Task, TaskId, TaskStatus};

use super::PollerSupervisor;
use super::task_store::QueueObserver;

pub const ACTIVE_LABEL: &str = "Processing";
const EMPTY_LIBRARY_MESSAGE: &str = "Your library is empty.";

/// A control attached to a rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Cancel { task_id: TaskId },
    Download { href: String },
    Delete { task_id: TaskId, filename: Option<String> },
    Remove { task_id: TaskId, filename: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRow {
    pub task_id: TaskId,
    pub filename: String,
    pub label: &'static str,
    pub action: RowAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRow {
    pub task_id: TaskId,
    pub display_name: String,
    /// Absent on records saved before dates were tracked.
    pub date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    /// Raw status text, shown for everything except SUCCESS.
    pub badge: Option<String>,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueView {
    pub active: Vec<ActiveRow>,
    pub completed: Vec<CompletedRow>,
    pub show_active_section: bool,
    pub show_empty_library: bool,
    pub show_completed_table: bool,
}

impl QueueView {
    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }
}

/// Filename the backend should delete along with the record: the output
/// file for a finished conversion, the stored name otherwise.
pub fn delete_target(task: &Task) -> Option<String> {
    match task.status {
        TaskStatus::Success => task.result_filename.clone(),
        _ => Some(task.filename.clone()),
    }
}

/// Splits tasks into active and completed rows, keeping store order.
pub fn render_queues(tasks: &[Task]) -> QueueView {
    let mut view = QueueView::default();

    for task in tasks {
        if task.status.is_active() {
            view.active.push(ActiveRow {
                task_id: task.id.clone(),
                filename: task.filename.clone(),
                label: ACTIVE_LABEL,
                action: RowAction::Cancel {
                    task_id: task.id.clone(),
                },
            });
            continue;
        }

        let (badge, actions) = if task.status == TaskStatus::Success {
            let mut actions = Vec::with_capacity(2);
            if let Some(result) = &task.result_filename {
                actions.push(RowAction::Download {
                    href: format!("/download/{}", result),
                });
            }
            actions.push(RowAction::Delete {
                task_id: task.id.clone(),
                filename: delete_target(task),
            });
            (None, actions)
        } else {
            let actions = vec![RowAction::Remove {
                task_id: task.id.clone(),
                filename: delete_target(task),
            }];
            (Some(task.status.as_str().to_string()), actions)
        };

        view.completed.push(CompletedRow {
            task_id: task.id.clone(),
            display_name: task.display_name().to_string(),
            date: task.date,
            status: task.status,
            badge,
            actions,
        });
    }

    view.show_active_section = !view.active.is_empty();
    view.show_empty_library = view.completed.is_empty();
    view.show_completed_table = !view.completed.is_empty();
    view
}

/// Re-renders on every store change, resumes polling for active rows and
/// publishes the latest view.
pub struct QueueRenderer {
    supervisor: Arc<PollerSupervisor>,
    views: watch::Sender<QueueView>,
}

impl QueueRenderer {
    pub fn new(supervisor: Arc<PollerSupervisor>) -> Self {
        let (views, _) = watch::channel(QueueView::default());
        Self { supervisor, views }
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueView> {
        self.views.subscribe()
    }

    pub fn render(&self, tasks: &[Task]) -> QueueView {
        let view = render_queues(tasks);
        for row in &view.active {
            self.supervisor.ensure_polling(&row.task_id);
        }
        tracing::debug!(
            active = view.active.len(),
            completed = view.completed.len(),
            "Queues rendered"
        );
        self.views.send_replace(view.clone());
        view
    }
}

impl QueueObserver for QueueRenderer {
    fn on_queue_changed(&self, tasks: &[Task]) {
        self.render(tasks);
    }
}

impl fmt::Display for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowAction::Cancel { .. } => f.write_str("stop"),
            RowAction::Download { href } => write!(f, "download {}", href),
            RowAction::Delete { .. } => f.write_str("delete"),
            RowAction::Remove { .. } => f.write_str("remove"),
        }
    }
}

impl fmt::Display for QueueView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.show_active_section {
            let width = column_width(self.active.iter().map(|r| r.filename.as_str()));
            writeln!(f, "Active conversions")?;
            for row in &self.active {
                writeln!(
                    f,
                    "  {:<width$}  {:<10}  {}  [{}]",
                    row.filename,
                    row.label,
                    row.task_id,
                    row.action,
                    width = width
                )?;
            }
        }

        if self.show_empty_library {
            writeln!(f, "{}", EMPTY_LIBRARY_MESSAGE)?;
        }

        if self.show_completed_table {
            let width = column_width(self.completed.iter().map(|r| r.display_name.as_str()));
            writeln!(f, "Library")?;
            for row in &self.completed {
                let date = row
                    .date
                    .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let badge = row.badge.as_deref().unwrap_or("");
                let actions = row
                    .actions
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(
                    f,
                    "  {:<width$}  {:<9}  {:<10}  {}  [{}]",
                    row.display_name,
                    badge,
                    date,
                    row.task_id,
                    actions,
                    width = width
                )?;
            }
        }

        Ok(())
    }
}

fn column_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(|n| n.chars().count()).max().unwrap_or(0)
}
