//! Search results from the core search endpoint.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{finish, rendered};
use crate::resolver::{Document, ResolutionPass};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    #[serde(default, deserialize_with = "rendered")]
    pub title: String,
    /// Destination path of the hit.
    #[serde(default)]
    pub url: String,
    /// `post`, `term` or `post-format`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Post type or taxonomy of the hit.
    #[serde(default)]
    pub subtype: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub(crate) fn resolve_search_result(raw: Value, pass: &Arc<ResolutionPass>) -> Arc<Document> {
    finish(raw, pass, |_| {})
}
