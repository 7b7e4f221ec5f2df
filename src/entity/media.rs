//! Media library items.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityFetch, finish, rendered};
use crate::resolver::{Document, ResolutionPass, SharedFetch};

pub(crate) const TYPE_NAME: &str = "media";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: u64,
    #[serde(default, deserialize_with = "rendered")]
    pub title: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default, deserialize_with = "rendered")]
    pub caption: String,
    /// `image` or `file`.
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hoist the original dimensions out of `media_details`.
fn hoist_dimensions(map: &mut Map<String, Value>) {
    let Some(details) = map.get("media_details").and_then(Value::as_object) else {
        return;
    };
    let width = details.get("width").cloned();
    let height = details.get("height").cloned();
    if let Some(width) = width {
        map.entry("width").or_insert(width);
    }
    if let Some(height) = height {
        map.entry("height").or_insert(height);
    }
}

pub(crate) fn resolve_media(raw: Value, pass: &Arc<ResolutionPass>) -> Arc<Document> {
    finish(raw, pass, hoist_dimensions)
}

pub(crate) fn fetch_by_id(pass: &Arc<ResolutionPass>, id: u64) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    pass.register_fetch::<EntityFetch, _, _>(TYPE_NAME, &id.to_string(), move || async move {
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .media_by_id(&headers, id)
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| resolve_media(raw, &task_pass)))
    })
}
