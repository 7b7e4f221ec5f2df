//! Tree reference resolution.
//!
//! [`resolve_references`] walks a JSON tree once and, for every reference it
//! finds, either rewrites the position in place or schedules a task on the
//! pass that will:
//!
//! | Found | Action |
//! |-------|--------|
//! | entity marker | fetch the entity (memoized), splice its resolved document in |
//! | date marker | replace with RFC 3339 UTC, synchronously |
//! | link marker | replace with the resolved destination path |
//! | string that is a site page link | replace with the resolved destination path |
//! | malformed marker | replace with `null` |
//!
//! Entities are never copied into their referrers while the pass runs.
//! A [`Document`] records "position P holds document D" as a splice, and
//! [`Document::materialize`] builds the final tree after the pass has
//! drained. That keeps reference cycles (a post whose related post links
//! back to it) finite: the second visit of a document on the current path is
//! emitted shallow, with its own references set to `null`.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::marker::{Detected, ReferenceMarker, is_marker};
use super::pass::ResolutionPass;
use crate::entity;
use crate::link::is_site_link;
use crate::log;
use crate::utils::date;

/// A position inside a document that will hold another document.
#[derive(Clone)]
struct Splice {
    pointer: String,
    target: Arc<Document>,
}

/// A JSON tree being resolved.
pub struct Document {
    value: Mutex<Value>,
    splices: Mutex<Vec<Splice>>,
}

impl Document {
    pub fn new(value: Value) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value),
            splices: Mutex::new(Vec::new()),
        })
    }

    /// Overwrite the value at a JSON pointer. Missing positions are ignored.
    pub fn set(&self, pointer: &str, replacement: Value) {
        if let Some(slot) = self.value.lock().pointer_mut(pointer) {
            *slot = replacement;
        }
    }

    fn splice(&self, pointer: String, target: Arc<Document>) {
        self.splices.lock().push(Splice { pointer, target });
    }

    /// Forget spliced documents, breaking reference cycles between them.
    pub(crate) fn release_splices(&self) {
        self.splices.lock().clear();
    }

    /// The value as it stands, without spliced documents.
    pub fn snapshot(&self) -> Value {
        self.value.lock().clone()
    }

    /// Read one field of the unspliced value.
    pub fn field(&self, key: &str) -> Option<Value> {
        self.value.lock().get(key).cloned()
    }

    /// Build the fully resolved tree.
    pub fn materialize(self: &Arc<Self>) -> Value {
        let mut path = Vec::new();
        let mut value = self.build(&mut path);
        scrub_markers(&mut value);
        value
    }

    fn build(self: &Arc<Self>, path: &mut Vec<*const Document>) -> Value {
        let mut value = self.snapshot();
        let splices = self.splices.lock().clone();

        if path.contains(&Arc::as_ptr(self)) {
            // Back-edge: keep the document's own fields only
            for splice in &splices {
                put(&mut value, &splice.pointer, Value::Null);
            }
            return value;
        }

        path.push(Arc::as_ptr(self));
        for splice in &splices {
            let resolved = splice.target.build(path);
            put(&mut value, &splice.pointer, resolved);
        }
        path.pop();
        value
    }
}

fn put(value: &mut Value, pointer: &str, replacement: Value) {
    if let Some(slot) = value.pointer_mut(pointer) {
        *slot = replacement;
    }
}

/// Null out anything still shaped like a marker.
fn scrub_markers(value: &mut Value) {
    if is_marker(value) {
        *value = Value::Null;
        return;
    }
    match value {
        Value::Object(map) => map.values_mut().for_each(scrub_markers),
        Value::Array(items) => items.iter_mut().for_each(scrub_markers),
        _ => {}
    }
}

// ============================================================================
// Reference Scan
// ============================================================================

enum Target {
    Entity(ReferenceMarker),
    Link(String),
}

struct Found {
    pointer: String,
    target: Target,
}

/// Escape one JSON pointer token (RFC 6901).
fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn scan(value: &mut Value, pointer: &str, site_host: &str, found: &mut Vec<Found>) {
    if let Value::Object(map) = value {
        match ReferenceMarker::detect(map) {
            Detected::NotAMarker => {}
            Detected::Malformed => {
                *value = Value::Null;
                return;
            }
            Detected::Marker(ReferenceMarker::Date { date }) => {
                *value = date::normalize(&date);
                return;
            }
            Detected::Marker(ReferenceMarker::Link { url }) => {
                found.push(Found {
                    pointer: pointer.to_owned(),
                    target: Target::Link(url),
                });
                return;
            }
            Detected::Marker(marker) => {
                found.push(Found {
                    pointer: pointer.to_owned(),
                    target: Target::Entity(marker),
                });
                return;
            }
        }
    }

    match value {
        Value::Object(map) => scan_object(map, pointer, site_host, found),
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                scan(item, &format!("{pointer}/{index}"), site_host, found);
            }
        }
        Value::String(s) if is_site_link(s, site_host) => found.push(Found {
            pointer: pointer.to_owned(),
            target: Target::Link(s.clone()),
        }),
        _ => {}
    }
}

fn scan_object(map: &mut Map<String, Value>, pointer: &str, site_host: &str, found: &mut Vec<Found>) {
    for (key, child) in map.iter_mut() {
        let child_pointer = format!("{pointer}/{}", escape_token(key));
        scan(child, &child_pointer, site_host, found);
    }
}

/// Find every reference in `doc` and schedule its resolution on `pass`.
///
/// Returns without awaiting anything. The references are settled once
/// [`ResolutionPass::await_all_scheduled`] returns.
pub fn resolve_references(doc: &Arc<Document>, pass: &Arc<ResolutionPass>) {
    pass.track_document(doc);
    let mut found = Vec::new();
    scan(&mut doc.value.lock(), "", pass.site_host(), &mut found);

    for Found { pointer, target } in found {
        let doc = Arc::clone(doc);
        let task_pass = Arc::clone(pass);
        match target {
            Target::Link(url) => pass.schedule_resolution(async move {
                let resolved = task_pass.resolve_link(&url).await;
                doc.set(&pointer, Value::String(resolved));
            }),
            Target::Entity(marker) => pass.schedule_resolution(async move {
                match entity::fetch_reference(&task_pass, &marker).await {
                    Ok(Some(target)) => doc.splice(pointer, target),
                    Ok(None) => doc.set(&pointer, Value::Null),
                    Err(err) => {
                        log!("resolve"; "{marker:?} at `{pointer}`: {err}");
                        doc.set(&pointer, Value::Null);
                    }
                }
            }),
        }
    }
}
