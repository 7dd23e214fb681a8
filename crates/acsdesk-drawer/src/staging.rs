//! Staged edits: per-device split and parameter value editing.

use acsdesk_config::{ParameterValue, QueuedTask, StagedTask, TaskOperation};
use chrono::DateTime;

/// Split a staged task into one queued task per target device.
///
/// Tasks follow the device order of the staged task. Each copy gets its own
/// identity and starts `queued`.
pub fn split(task: &StagedTask) -> Vec<QueuedTask> {
  task
    .devices
    .iter()
    .map(|device| QueuedTask::new(task.operation.clone(), device.clone()))
    .collect()
}

/// Input control used to edit a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEditor {
  /// `true` / `false` choice.
  Boolean,
  /// Numeric input for integer types.
  Number,
  /// Free text.
  Text,
}

impl ValueEditor {
  pub fn for_type(value_type: &str) -> Self {
    match value_type {
      "xsd:boolean" => ValueEditor::Boolean,
      "xsd:int" | "xsd:unsignedInt" => ValueEditor::Number,
      _ => ValueEditor::Text,
    }
  }
}

/// The value as shown in the editor.
///
/// Numeric `xsd:dateTime` values are epoch millis and shown as RFC 3339.
pub fn editor_value(parameter: &ParameterValue) -> String {
  match &parameter.value {
    serde_json::Value::Number(n) if parameter.value_type == "xsd:dateTime" => n
      .as_i64()
      .or_else(|| n.as_f64().map(|millis| millis.trunc() as i64))
      .and_then(DateTime::from_timestamp_millis)
      .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
      .unwrap_or_else(|| n.to_string()),
    serde_json::Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Store the operator's input as the first parameter's value.
///
/// Returns false if the task is not a setParameterValues edit.
pub fn set_parameter_input(task: &mut StagedTask, input: &str) -> bool {
  match &mut task.operation {
    TaskOperation::SetParameterValues { parameter_values } => match parameter_values.first_mut() {
      Some(parameter) => {
        parameter.value = serde_json::Value::String(input.to_string());
        true
      }
      None => false,
    },
    _ => false,
  }
}

/// What a key press in a staged editor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorIntent {
  Queue,
  Cancel,
}

impl EditorIntent {
  pub fn from_key(key: &str) -> Option<Self> {
    match key {
      "Enter" => Some(EditorIntent::Queue),
      "Escape" => Some(EditorIntent::Cancel),
      _ => None,
    }
  }
}
