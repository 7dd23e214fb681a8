use std::collections::HashMap;

use acsdesk_config::{FileRecord, QueuedTask, StagedTask};
use acsdesk_store::{StoreError, TaskStore};
use acsdesk_transport::DeviceScript;
use serde::Deserialize;

/// A drawer session replayed by the CLI.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionFile {
  /// Staged edits, in staging order.
  pub staging: Vec<StagedTask>,
  /// Tasks already in the queue.
  pub queue: Vec<QueuedTask>,
  /// File catalog offered to download edits.
  pub files: Vec<FileRecord>,
  /// Scripted outcome per device id; unlisted devices commit successfully.
  pub devices: HashMap<String, DeviceScript>,
  /// Reject the whole commit batch with this message.
  pub reject: Option<String>,
}

/// Load previously queued tasks, keeping the status each was recorded with.
pub fn preload_queue(store: &dyn TaskStore, queue: Vec<QueuedTask>) -> Result<(), StoreError> {
  for task in queue {
    let (id, status) = (task.id.clone(), task.status);
    store.queue_task(task);
    store.set_status(&id, status)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::time::Duration;

  use acsdesk_config::{ConsoleConfig, TaskStatus};
  use acsdesk_drawer::{Drawer, DrawerServices};
  use acsdesk_notify::NotificationCenter;
  use acsdesk_store::{InMemoryFileCatalog, InMemoryTaskStore, WatchRefreshSignal};
  use acsdesk_transport::ScriptedTransport;

  #[test]
  fn test_session_from_json() {
    let session: SessionFile = serde_json::from_str(
      r#"{
        "staging": [
          { "name": "reboot", "devices": ["AA-PC1-1", "AA-PC1-2"] },
          { "name": "download", "devices": ["AA-PC1-1"], "fileName": "fw.bin" }
        ],
        "queue": [
          { "name": "factoryReset", "device": "BB-1", "status": "fault" }
        ],
        "files": [
          { "_id": "fw.bin", "metadata.fileType": "1 Firmware Upgrade Image" }
        ],
        "devices": {
          "AA-PC1-2": { "error": "timeout" }
        }
      }"#,
    )
    .unwrap();

    assert_eq!(session.staging.len(), 2);
    assert_eq!(session.queue[0].status, TaskStatus::Fault);
    assert_eq!(session.files[0].file_type(), Some("1 Firmware Upgrade Image"));
    assert_eq!(
      session.devices["AA-PC1-2"].error.as_deref(),
      Some("timeout")
    );
    assert!(session.reject.is_none());
  }

  #[tokio::test]
  async fn test_preloaded_fault_is_not_committed() {
    let session: SessionFile = serde_json::from_str(
      r#"{
        "queue": [
          { "name": "factoryReset", "device": "BB-1", "status": "fault" },
          { "name": "reboot", "device": "BB-2" }
        ]
      }"#,
    )
    .unwrap();

    let store = Arc::new(InMemoryTaskStore::new());
    preload_queue(store.as_ref(), session.queue).unwrap();
    assert_eq!(store.queue()[0].status, TaskStatus::Fault);
    assert_eq!(store.queue()[1].status, TaskStatus::Queued);

    let drawer = Drawer::new(
      DrawerServices {
        store: store.clone(),
        catalog: Arc::new(InMemoryFileCatalog::new(Vec::new())),
        transport: Arc::new(ScriptedTransport::new(store.clone())),
        notifications: Arc::new(NotificationCenter::new(Duration::from_secs(5))),
        refresh: Arc::new(WatchRefreshSignal::new()),
      },
      ConsoleConfig::default(),
    );

    let summary = drawer.commit().await;
    assert_eq!(summary.submitted, 1);
    assert_eq!(summary.devices[0].device_id, "BB-2");

    let queue = store.queue();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].device, "BB-1");
    assert_eq!(queue[0].status, TaskStatus::Fault);
  }
}
