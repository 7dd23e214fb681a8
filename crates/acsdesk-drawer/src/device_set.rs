//! Common identity of a set of target devices.
//!
//! Device ids have the form `<oui>-<productClass>-<serial>` or
//! `<oui>-<serial>`, each segment percent-encoded. The analysis is strict:
//! a single disagreement means no default can be derived for that field.

use std::borrow::Cow;

use acsdesk_config::FileRecord;
use serde::Serialize;

/// OUI and product class shared by every device of a set.
///
/// Each field is `Some("")` for an empty set, `Some(value)` when all devices
/// agree and `None` when they do not (or, for the product class, when any id
/// lacks the three-segment form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSetAnalysis {
  pub oui: Option<String>,
  pub product_class: Option<String>,
}

impl DeviceSetAnalysis {
  pub fn analyze<'a>(devices: impl IntoIterator<Item = &'a String>) -> Self {
    let mut oui = Agreement::Empty;
    let mut product_class = Agreement::Empty;

    for device in devices {
      let parts: Vec<Cow<'_, str>> = device.split('-').map(decode).collect();

      oui.observe(Some(&parts[0]));
      product_class.observe((parts.len() == 3).then(|| &parts[1]));
    }

    Self {
      oui: oui.into_common(),
      product_class: product_class.into_common(),
    }
  }

  /// Whether a catalog file may be offered to this device set.
  ///
  /// Untagged files match any set; tagged files must match exactly.
  pub fn accepts(&self, file: &FileRecord) -> bool {
    matches_tag(file.oui.as_deref(), self.oui.as_deref())
      && matches_tag(file.product_class.as_deref(), self.product_class.as_deref())
  }
}

fn matches_tag(tag: Option<&str>, common: Option<&str>) -> bool {
  match tag {
    None | Some("") => true,
    Some(tag) => common == Some(tag),
  }
}

fn decode(segment: &str) -> Cow<'_, str> {
  // Malformed escapes are compared verbatim
  urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

enum Agreement {
  Empty,
  Agreed(String),
  Disagreed,
}

impl Agreement {
  fn observe(&mut self, value: Option<&Cow<'_, str>>) {
    *self = match (std::mem::replace(self, Agreement::Disagreed), value) {
      (_, None) | (Agreement::Disagreed, _) => Agreement::Disagreed,
      (Agreement::Empty, Some(v)) => Agreement::Agreed(v.to_string()),
      (Agreement::Agreed(current), Some(v)) if current == **v => Agreement::Agreed(current),
      (Agreement::Agreed(_), Some(_)) => Agreement::Disagreed,
    };
  }

  fn into_common(self) -> Option<String> {
    match self {
      Agreement::Empty => Some(String::new()),
      Agreement::Agreed(value) => Some(value),
      Agreement::Disagreed => None,
    }
  }
}
