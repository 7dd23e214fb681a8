//! acsdesk Drawer
//!
//! Orchestration core of the console's task drawer: staged multi-device
//! edits are validated, split into one task per device, committed as a batch
//! and summarized by status.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Drawer                             │
//! │  - stage / edit / cancel staged tasks                       │
//! │  - queue_staged(id) → one queued task per device            │
//! │  - retry / remove / clear, status summary                   │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                      │
//!          ▼                    ▼                      ▼
//! ┌─────────────────┐ ┌──────────────────┐ ┌───────────────────────┐
//! │ ValidityTracker │ │ DeviceSetAnalysis│ │  CommitOrchestrator   │
//! │  side table of  │ │  common oui and  │ │  transport.commit()   │
//! │  invalid ids    │ │  product class   │ │  + report stream      │
//! └─────────────────┘ └──────────────────┘ └───────────────────────┘
//!                                                      │
//!                                                      ▼
//!                                   NotificationSink + RefreshSignal
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let drawer = Drawer::new(services, ConsoleConfig::default());
//!
//! let id = drawer.stage(StagedTask::new(TaskOperation::Reboot, ["dev1", "dev2"]));
//! drawer.queue_staged(&id)?;
//!
//! let summary = drawer.commit().await;
//! ```

mod commit;
mod device_set;
mod download;
mod drawer;
mod error;
mod staging;
mod status;
mod validity;

pub use commit::{CommitOrchestrator, CommitSummary, DeviceOutcome, DeviceVerdict};
pub use device_set::DeviceSetAnalysis;
pub use download::{DownloadChoices, select_file, select_file_type};
pub use drawer::{Drawer, DrawerServices, StagedEntry};
pub use error::DrawerError;
pub use staging::{EditorIntent, ValueEditor, editor_value, set_parameter_input, split};
pub use status::{QueueAction, QueueEntry, StatusCounts, actions_for, group_by_device};
pub use validity::{ValidityTracker, invalid_reason, is_valid};
