use serde::{Deserialize, Serialize};

/// A file known to the file catalog, as offered for download tasks.
///
/// Metadata keys keep the dotted names used by the catalog backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(
    rename = "metadata.fileType",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub file_type: Option<String>,
  #[serde(
    rename = "metadata.oui",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub oui: Option<String>,
  #[serde(
    rename = "metadata.productClass",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub product_class: Option<String>,
}

impl FileRecord {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      file_type: None,
      oui: None,
      product_class: None,
    }
  }

  pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
    self.file_type = Some(file_type.into());
    self
  }

  pub fn with_oui(mut self, oui: impl Into<String>) -> Self {
    self.oui = Some(oui.into());
    self
  }

  pub fn with_product_class(mut self, product_class: impl Into<String>) -> Self {
    self.product_class = Some(product_class.into());
    self
  }

  /// The file type, treating an empty string as untyped.
  pub fn file_type(&self) -> Option<&str> {
    self.file_type.as_deref().filter(|t| !t.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_dotted_metadata() {
    let json = r#"{
      "_id": "fw-1.2.bin",
      "metadata.fileType": "1 Firmware Upgrade Image",
      "metadata.oui": "202BC1"
    }"#;

    let file: FileRecord = serde_json::from_str(json).unwrap();
    assert_eq!(file.id, "fw-1.2.bin");
    assert_eq!(file.file_type(), Some("1 Firmware Upgrade Image"));
    assert_eq!(file.oui.as_deref(), Some("202BC1"));
    assert_eq!(file.product_class, None);
  }

  #[test]
  fn test_empty_file_type_is_untyped() {
    let file = FileRecord::new("blob").with_file_type("");
    assert_eq!(file.file_type(), None);
  }
}
