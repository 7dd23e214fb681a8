//! File suggestions and selection for download edits.

use acsdesk_config::{ConsoleConfig, FileRecord, StagedTask, TaskOperation};
use acsdesk_store::FileCatalog;
use indexmap::IndexSet;
use serde::Serialize;

use crate::device_set::DeviceSetAnalysis;
use crate::error::DrawerError;

/// What a download edit may choose from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadChoices {
  pub analysis: DeviceSetAnalysis,
  /// Standard types first, then catalog types, without duplicates.
  pub file_types: Vec<String>,
  /// Ids of catalog files compatible with the target devices.
  pub files: Vec<String>,
  /// False while the catalog is still loading.
  pub selection_enabled: bool,
}

impl DownloadChoices {
  pub fn build(task: &StagedTask, catalog: &dyn FileCatalog, config: &ConsoleConfig) -> Self {
    let analysis = DeviceSetAnalysis::analyze(&task.devices);
    let records = catalog.files();

    Self {
      file_types: file_types(config, &records),
      files: records
        .iter()
        .filter(|f| analysis.accepts(f))
        .map(|f| f.id.clone())
        .collect(),
      selection_enabled: !catalog.is_loading(),
      analysis,
    }
  }
}

fn file_types(config: &ConsoleConfig, records: &[FileRecord]) -> Vec<String> {
  let types: IndexSet<&str> = config
    .standard_file_types
    .iter()
    .map(String::as_str)
    .chain(records.iter().filter_map(FileRecord::file_type))
    .collect();
  types.into_iter().map(str::to_string).collect()
}

/// Select the file to push, taking its type from the catalog.
///
/// An unknown or untyped file leaves the type empty, so the operator has to
/// pick one before the task can be queued.
pub fn select_file(
  task: &mut StagedTask,
  file_id: &str,
  catalog: &dyn FileCatalog,
) -> Result<(), DrawerError> {
  if catalog.is_loading() {
    return Err(DrawerError::CatalogLoading);
  }

  let (file_name, file_type) = download_fields(task)?;
  *file_name = file_id.to_string();
  *file_type = catalog
    .file(file_id)
    .and_then(|f| f.file_type().map(str::to_string))
    .unwrap_or_default();
  Ok(())
}

/// Override the file type of a download edit.
pub fn select_file_type(task: &mut StagedTask, file_type: &str) -> Result<(), DrawerError> {
  let (_, current) = download_fields(task)?;
  *current = file_type.to_string();
  Ok(())
}

fn download_fields(task: &mut StagedTask) -> Result<(&mut String, &mut String), DrawerError> {
  match &mut task.operation {
    TaskOperation::Download {
      file_name,
      file_type,
    } => Ok((file_name, file_type)),
    other => Err(DrawerError::WrongOperation {
      task_id: task.id.clone(),
      expected: "download",
      actual: other.name(),
    }),
  }
}
