//! acsdesk Config
//!
//! This crate contains the serializable types shared by the task drawer:
//! staged and queued device tasks, task status, file catalog records and the
//! console configuration.
//!
//! Tasks can be loaded from:
//! - JSON session files (via the CLI with `acsdesk run session.json`)
//! - A task store backend (as JSON blobs)
//!
//! The drawer takes staged tasks, validates them, splits them per device and
//! commits the resulting queue through a device transport.

mod console;
mod file;
mod status;
mod task;

pub use console::{ConsoleConfig, DEFAULT_GRACE_MS, STANDARD_FILE_TYPES};
pub use file::FileRecord;
pub use status::TaskStatus;
pub use task::{ParameterValue, QueuedTask, StagedTask, TaskId, TaskOperation};
