mod remote_state;
mod task;
mod task_id;
mod task_status;

pub use remote_state::{RemoteState, StatusReport};
pub use task::Task;
pub use task_id::TaskId;
pub use task_status::TaskStatus;
