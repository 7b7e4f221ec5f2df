//! Reference markers.
//!
//! The plugin (and third-party field plugins routed through it) embeds small
//! tagged objects wherever an entity is referenced:
//!
//! ```json
//! {"_clutch_type": "post", "id": 12, "post_type": "page"}
//! {"_clutch_type": "taxonomy_term", "id": 3, "taxonomy": "category"}
//! {"_clutch_type": "date", "date": "2024-03-15T10:00:00"}
//! ```
//!
//! Any object carrying the discriminant key is a marker candidate. If it does
//! not deserialize into [`ReferenceMarker`] it is malformed. Ids may arrive as
//! numeric strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Discriminant key of every marker.
pub const MARKER_KEY: &str = "_clutch_type";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_clutch_type", rename_all = "snake_case")]
pub enum ReferenceMarker {
    User {
        #[serde(deserialize_with = "lenient_id")]
        id: u64,
    },
    Media {
        #[serde(deserialize_with = "lenient_id")]
        id: u64,
    },
    Post {
        #[serde(deserialize_with = "lenient_id")]
        id: u64,
        #[serde(default)]
        post_type: Option<String>,
    },
    TaxonomyTerm {
        #[serde(deserialize_with = "lenient_id")]
        id: u64,
        taxonomy: String,
    },
    Date {
        date: String,
    },
    Link {
        url: String,
    },
}

/// Id given as a number or a numeric string.
fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    match Id::deserialize(deserializer)? {
        Id::Number(id) => Ok(id),
        Id::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Outcome of inspecting an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detected {
    /// Plain data, keep walking.
    NotAMarker,
    Marker(ReferenceMarker),
    /// Carries the discriminant but cannot be resolved.
    Malformed,
}

impl ReferenceMarker {
    /// Inspect an object for the marker shape.
    pub fn detect(object: &Map<String, Value>) -> Detected {
        if !object.contains_key(MARKER_KEY) {
            return Detected::NotAMarker;
        }
        match Self::deserialize(Value::Object(object.clone())) {
            Ok(marker) if marker.is_valid() => Detected::Marker(marker),
            _ => Detected::Malformed,
        }
    }

    /// Ids of `0` are the CMS's "none" and cannot be fetched.
    fn is_valid(&self) -> bool {
        match self {
            Self::User { id } | Self::Media { id } | Self::Post { id, .. } => *id != 0,
            Self::TaxonomyTerm { id, taxonomy } => *id != 0 && !taxonomy.is_empty(),
            Self::Date { date } => !date.is_empty(),
            Self::Link { url } => !url.is_empty(),
        }
    }

    /// Build the marker JSON for an entity reference.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Check whether a value is an object carrying the discriminant.
pub fn is_marker(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key(MARKER_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detect(value: Value) -> Detected {
        ReferenceMarker::detect(value.as_object().unwrap())
    }

    #[test]
    fn test_detect_markers() {
        assert_eq!(
            detect(json!({"_clutch_type": "post", "id": 12, "post_type": "page"})),
            Detected::Marker(ReferenceMarker::Post {
                id: 12,
                post_type: Some("page".into())
            })
        );
        assert_eq!(
            detect(json!({"_clutch_type": "taxonomy_term", "id": 3, "taxonomy": "category"})),
            Detected::Marker(ReferenceMarker::TaxonomyTerm {
                id: 3,
                taxonomy: "category".into()
            })
        );
        assert_eq!(
            detect(json!({"_clutch_type": "user", "id": 1, "name": "extra fields are fine"})),
            Detected::Marker(ReferenceMarker::User { id: 1 })
        );
    }

    #[test]
    fn test_detect_string_ids() {
        assert_eq!(
            detect(json!({"_clutch_type": "post", "id": "12", "post_type": "page"})),
            Detected::Marker(ReferenceMarker::Post {
                id: 12,
                post_type: Some("page".into())
            })
        );
        assert_eq!(
            detect(json!({"_clutch_type": "taxonomy_term", "id": " 3", "taxonomy": "category"})),
            Detected::Marker(ReferenceMarker::TaxonomyTerm {
                id: 3,
                taxonomy: "category".into()
            })
        );
        assert_eq!(detect(json!({"_clutch_type": "media", "id": "0"})), Detected::Malformed);
        assert_eq!(detect(json!({"_clutch_type": "media", "id": "-4"})), Detected::Malformed);
    }

    #[test]
    fn test_detect_plain_objects() {
        assert_eq!(detect(json!({"id": 3, "type": "post"})), Detected::NotAMarker);
        assert_eq!(detect(json!({})), Detected::NotAMarker);
    }

    #[test]
    fn test_detect_malformed() {
        assert_eq!(detect(json!({"_clutch_type": "post"})), Detected::Malformed);
        assert_eq!(detect(json!({"_clutch_type": "user", "id": 0})), Detected::Malformed);
        assert_eq!(detect(json!({"_clutch_type": "user", "id": "x"})), Detected::Malformed);
        assert_eq!(
            detect(json!({"_clutch_type": "taxonomy_term", "id": 4})),
            Detected::Malformed
        );
        assert_eq!(detect(json!({"_clutch_type": "widget", "id": 4})), Detected::Malformed);
        assert_eq!(detect(json!({"_clutch_type": 7})), Detected::Malformed);
    }

    #[test]
    fn test_to_value_round_trips_through_detect() {
        let marker = ReferenceMarker::Media { id: 9 };
        let value = marker.to_value();

        assert_eq!(value, json!({"_clutch_type": "media", "id": 9}));
        assert!(is_marker(&value));
        assert_eq!(detect(value), Detected::Marker(marker));
    }
}
