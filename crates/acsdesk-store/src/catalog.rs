use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use acsdesk_config::FileRecord;

/// Read access to the file-metadata catalog.
pub trait FileCatalog: Send + Sync {
  /// All known files.
  fn files(&self) -> Vec<FileRecord>;

  /// Whether the catalog is still being fetched. Selection controls stay
  /// disabled while this is true.
  fn is_loading(&self) -> bool;

  /// Look up a file by id.
  fn file(&self, id: &str) -> Option<FileRecord> {
    self.files().into_iter().find(|f| f.id == id)
  }
}

/// In-memory file catalog.
#[derive(Debug, Default)]
pub struct InMemoryFileCatalog {
  files: RwLock<Vec<FileRecord>>,
  loading: AtomicBool,
}

impl InMemoryFileCatalog {
  /// A loaded catalog holding `files`.
  pub fn new(files: Vec<FileRecord>) -> Self {
    Self {
      files: RwLock::new(files),
      loading: AtomicBool::new(false),
    }
  }

  /// An empty catalog whose fetch has not completed yet.
  pub fn loading() -> Self {
    Self {
      files: RwLock::new(Vec::new()),
      loading: AtomicBool::new(true),
    }
  }

  /// Replace the catalog contents and mark it loaded.
  pub fn set_files(&self, files: Vec<FileRecord>) {
    *self.files.write().unwrap() = files;
    self.loading.store(false, Ordering::Release);
  }
}

impl FileCatalog for InMemoryFileCatalog {
  fn files(&self) -> Vec<FileRecord> {
    self.files.read().unwrap().clone()
  }

  fn is_loading(&self) -> bool {
    self.loading.load(Ordering::Acquire)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_loading_then_loaded() {
    let catalog = InMemoryFileCatalog::loading();
    assert!(catalog.is_loading());
    assert!(catalog.files().is_empty());

    catalog.set_files(vec![FileRecord::new("fw.bin")]);
    assert!(!catalog.is_loading());
    assert_eq!(catalog.file("fw.bin").map(|f| f.id), Some("fw.bin".to_string()));
    assert!(catalog.file("missing").is_none());
  }
}
