//! Catalog record types and snapshot results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geographic position of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
  pub lat: f64,
  pub lng: f64,
}

/// One catalog record.
///
/// Only `id` is required; the remote catalog is free to evolve its
/// attributes, so everything it sends beyond the known fields is kept
/// verbatim in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub cuisine_type: String,
  #[serde(default)]
  pub neighborhood: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub photograph: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latlng: Option<LatLng>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, Value>,
}

/// Photo file used when a record has no photograph of its own.
pub const PLACEHOLDER_PHOTO: &str = "image-not-found";

impl Restaurant {
  /// Relative URL of this restaurant's photo, optionally at a sized
  /// variant (e.g. `-400`). Falls back to the placeholder image when
  /// the record carries no photograph.
  pub fn image_url(&self, suffix: Option<&str>) -> String {
    let name = self.photograph.as_deref().unwrap_or(PLACEHOLDER_PHOTO);
    let stem = name.trim_end_matches(".jpg");
    format!("img/{}{}.jpg", stem, suffix.unwrap_or(""))
  }
}

/// Where a snapshot's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  /// The local store, possibly stale
  Local,
  /// A completed remote refresh
  Remote,
}

/// Result of a catalog read.
///
/// A forced refresh that fails still produces a snapshot: the stale
/// local records with `refresh_error` recording what went wrong.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub records: Vec<Restaurant>,
  pub source: Source,
  pub refresh_error: Option<String>,
}

impl Snapshot {
  pub fn local(records: Vec<Restaurant>) -> Self {
    Self {
      records,
      source: Source::Local,
      refresh_error: None,
    }
  }

  pub fn remote(records: Vec<Restaurant>) -> Self {
    Self {
      records,
      source: Source::Remote,
      refresh_error: None,
    }
  }

  pub fn stale(records: Vec<Restaurant>, error: String) -> Self {
    Self {
      records,
      source: Source::Local,
      refresh_error: Some(error),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(photograph: Option<&str>) -> Restaurant {
    Restaurant {
      id: 1,
      name: "Mission Chinese Food".to_string(),
      cuisine_type: "Asian".to_string(),
      neighborhood: "Manhattan".to_string(),
      photograph: photograph.map(String::from),
      latlng: None,
      extra: serde_json::Map::new(),
    }
  }

  #[test]
  fn test_image_url_plain() {
    assert_eq!(record(Some("1")).image_url(None), "img/1.jpg");
  }

  #[test]
  fn test_image_url_keeps_extension() {
    assert_eq!(record(Some("1.jpg")).image_url(None), "img/1.jpg");
  }

  #[test]
  fn test_image_url_sized_variant() {
    assert_eq!(record(Some("1")).image_url(Some("-400")), "img/1-400.jpg");
  }

  #[test]
  fn test_image_url_placeholder_when_missing() {
    assert_eq!(record(None).image_url(None), "img/image-not-found.jpg");
  }

  #[test]
  fn test_unknown_attributes_preserved() {
    let json = r#"{"id": 3, "name": "Kang Ho Dong", "operating_hours": {"Monday": "17:00 - 24:00"}}"#;
    let parsed: Restaurant = serde_json::from_str(json).unwrap();
    assert!(parsed.extra.contains_key("operating_hours"));

    let back = serde_json::to_value(&parsed).unwrap();
    assert_eq!(back["operating_hours"]["Monday"], "17:00 - 24:00");
  }
}
