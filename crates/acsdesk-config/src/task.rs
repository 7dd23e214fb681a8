use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::status::TaskStatus;

/// Opaque identity of a staged or queued task.
///
/// Tasks are removed and retried by identity, so copies of a task that share
/// an id refer to the same queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
  pub fn new() -> Self {
    Self(uuid::Uuid::new_v4().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Default for TaskId {
  fn default() -> Self {
    Self::new()
  }
}

impl From<&str> for TaskId {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// One `(parameterName, value, valueType)` entry of a setParameterValues task.
///
/// Serialized as a three-element array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
  from = "(String, serde_json::Value, String)",
  into = "(String, serde_json::Value, String)"
)]
pub struct ParameterValue {
  pub name: String,
  pub value: serde_json::Value,
  /// XSD type, e.g. `xsd:boolean`.
  pub value_type: String,
}

impl ParameterValue {
  pub fn new(
    name: impl Into<String>,
    value: impl Into<serde_json::Value>,
    value_type: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      value: value.into(),
      value_type: value_type.into(),
    }
  }
}

impl From<(String, serde_json::Value, String)> for ParameterValue {
  fn from((name, value, value_type): (String, serde_json::Value, String)) -> Self {
    Self {
      name,
      value,
      value_type,
    }
  }
}

impl From<ParameterValue> for (String, serde_json::Value, String) {
  fn from(p: ParameterValue) -> Self {
    (p.name, p.value, p.value_type)
  }
}

/// The operation a task performs, tagged by its `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TaskOperation {
  SetParameterValues {
    parameter_values: Vec<ParameterValue>,
  },
  Download {
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    file_type: String,
  },
  Reboot,
  FactoryReset,
  AddObject {
    object_name: String,
  },
  DeleteObject {
    object_name: String,
  },
  GetParameterValues {
    parameter_names: Vec<String>,
  },
  RefreshObject {
    parameter_name: String,
  },
}

impl TaskOperation {
  /// The wire name of the operation.
  pub fn name(&self) -> &'static str {
    match self {
      TaskOperation::SetParameterValues { .. } => "setParameterValues",
      TaskOperation::Download { .. } => "download",
      TaskOperation::Reboot => "reboot",
      TaskOperation::FactoryReset => "factoryReset",
      TaskOperation::AddObject { .. } => "addObject",
      TaskOperation::DeleteObject { .. } => "deleteObject",
      TaskOperation::GetParameterValues { .. } => "getParameterValues",
      TaskOperation::RefreshObject { .. } => "refreshObject",
    }
  }

  /// An empty download edit, as opened by the operator.
  pub fn download() -> Self {
    TaskOperation::Download {
      file_name: String::new(),
      file_type: String::new(),
    }
  }
}

/// Human-readable summary shown in the queue list.
impl fmt::Display for TaskOperation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TaskOperation::SetParameterValues { parameter_values } => match parameter_values.first() {
        Some(p) => write!(f, "Set {} to '{}'", p.name, display_value(&p.value)),
        None => f.write_str("Set parameters"),
      },
      TaskOperation::Download {
        file_name,
        file_type,
      } => write!(f, "Push file: {file_name} ({file_type})"),
      TaskOperation::Reboot => f.write_str("Reboot"),
      TaskOperation::FactoryReset => f.write_str("Factory Reset"),
      TaskOperation::AddObject { object_name } => write!(f, "Add {object_name}"),
      TaskOperation::DeleteObject { object_name } => write!(f, "Delete {object_name}"),
      TaskOperation::GetParameterValues { parameter_names } => {
        write!(f, "Refresh {} parameters", parameter_names.len())
      }
      TaskOperation::RefreshObject { parameter_name } => write!(f, "Refresh {parameter_name}"),
    }
  }
}

fn display_value(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// A draft edit targeting one or more devices, not yet queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedTask {
  #[serde(default)]
  pub id: TaskId,
  #[serde(flatten)]
  pub operation: TaskOperation,
  /// Target devices, in the order they were selected.
  pub devices: IndexSet<String>,
}

impl StagedTask {
  pub fn new<I, S>(operation: TaskOperation, devices: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      id: TaskId::new(),
      operation,
      devices: devices.into_iter().map(Into::into).collect(),
    }
  }
}

/// A task bound to exactly one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
  #[serde(default)]
  pub id: TaskId,
  #[serde(flatten)]
  pub operation: TaskOperation,
  pub device: String,
  #[serde(default)]
  pub status: TaskStatus,
}

impl QueuedTask {
  pub fn new(operation: TaskOperation, device: impl Into<String>) -> Self {
    Self {
      id: TaskId::new(),
      operation,
      device: device.into(),
      status: TaskStatus::Queued,
    }
  }

  pub fn with_status(mut self, status: TaskStatus) -> Self {
    self.status = status;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_staged_task_from_json() {
    let task: StagedTask = serde_json::from_value(json!({
      "name": "setParameterValues",
      "parameterValues": [["Device.ManagementServer.PeriodicInformInterval", 300, "xsd:unsignedInt"]],
      "devices": ["202BC1-BM632w-000001", "202BC1-BM632w-000002"]
    }))
    .unwrap();

    assert_eq!(task.devices.len(), 2);
    match &task.operation {
      TaskOperation::SetParameterValues { parameter_values } => {
        assert_eq!(parameter_values[0].name, "Device.ManagementServer.PeriodicInformInterval");
        assert_eq!(parameter_values[0].value, json!(300));
        assert_eq!(parameter_values[0].value_type, "xsd:unsignedInt");
      }
      other => panic!("expected setParameterValues, got {other:?}"),
    }
  }

  #[test]
  fn test_queued_task_serializes_flat() {
    let task = QueuedTask::new(
      TaskOperation::AddObject {
        object_name: "InternetGatewayDevice.WANDevice.1.WANConnectionDevice".to_string(),
      },
      "dev1",
    );

    let value = serde_json::to_value(&task).unwrap();
    assert_eq!(value["name"], "addObject");
    assert_eq!(value["objectName"], "InternetGatewayDevice.WANDevice.1.WANConnectionDevice");
    assert_eq!(value["device"], "dev1");
    assert_eq!(value["status"], "queued");
    assert!(value.get("devices").is_none());
  }

  #[test]
  fn test_download_defaults_to_empty_fields() {
    let task: StagedTask =
      serde_json::from_value(json!({ "name": "download", "devices": ["dev1"] })).unwrap();
    assert_eq!(task.operation, TaskOperation::download());
  }

  #[test]
  fn test_operation_descriptions() {
    let spv = TaskOperation::SetParameterValues {
      parameter_values: vec![ParameterValue::new("A.B", "on", "xsd:string")],
    };
    assert_eq!(spv.to_string(), "Set A.B to 'on'");

    let spv_bool = TaskOperation::SetParameterValues {
      parameter_values: vec![ParameterValue::new("A.Enable", true, "xsd:boolean")],
    };
    assert_eq!(spv_bool.to_string(), "Set A.Enable to 'true'");

    let download = TaskOperation::Download {
      file_name: "fw.bin".to_string(),
      file_type: "1 Firmware Upgrade Image".to_string(),
    };
    assert_eq!(download.to_string(), "Push file: fw.bin (1 Firmware Upgrade Image)");

    let gpv = TaskOperation::GetParameterValues {
      parameter_names: vec!["A".to_string(), "B".to_string()],
    };
    assert_eq!(gpv.to_string(), "Refresh 2 parameters");

    assert_eq!(TaskOperation::Reboot.to_string(), "Reboot");
    assert_eq!(TaskOperation::FactoryReset.to_string(), "Factory Reset");
  }
}
