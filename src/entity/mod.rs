//! Typed entities and their resolvers.
//!
//! Each entity module has three parts:
//!
//! - the typed struct handed to callers,
//! - a resolver turning raw JSON into a [`Document`] (strip transport
//!   fields, normalize dates, turn sentinel ids into markers, then
//!   [`resolve_references`](crate::resolver::resolve_references)),
//! - memoized fetchers keyed on the pass.
//!
//! # Finishing Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `_links`, `_embedded` | removed |
//! | `date`, `modified` | RFC 3339 UTC, read from the `_gmt` twin when present |
//! | `date_gmt`, `modified_gmt` | RFC 3339 UTC |
//! | `author`, `featured_media` | `0` → `null`, other ids → marker |

pub mod media;
pub mod menu;
pub mod post;
pub mod search;
pub mod term;
pub mod user;

pub use media::MediaItem;
pub use menu::{Menu, MenuItem};
pub use post::Post;
pub use search::SearchResult;
pub use term::TaxonomyTerm;
pub use user::User;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};
use crate::resolver::{Document, ReferenceMarker, ResolutionPass, SharedFetch};
use crate::utils::date;

/// Outcome of a memoized entity fetch: the resolved document, `None` when
/// the CMS has no such entity.
pub type EntityFetch = std::result::Result<Option<Arc<Document>>, Arc<ClientError>>;

const TRANSPORT_FIELDS: &[&str] = &["_links", "_embedded"];

/// `(field, UTC twin)`
const DATE_FIELDS: &[(&str, &str)] = &[("date", "date_gmt"), ("modified", "modified_gmt")];

// ============================================================================
// Finishing
// ============================================================================

pub(crate) fn strip_transport_fields(map: &mut Map<String, Value>) {
    for field in TRANSPORT_FIELDS {
        map.remove(*field);
    }
}

/// Normalize every known date field. The `_gmt` twin is authoritative since
/// the plain field is in the site's local time.
pub(crate) fn normalize_dates(map: &mut Map<String, Value>) {
    for (field, twin) in DATE_FIELDS {
        let utc = map.get(*twin).map(date_value);
        let local = map.get(*field).map(date_value);

        if let Some(utc) = &utc {
            map.insert((*twin).to_owned(), utc.clone());
        }
        match (utc, local) {
            (Some(utc), _) if !utc.is_null() => {
                map.insert((*field).to_owned(), utc);
            }
            (_, Some(local)) => {
                map.insert((*field).to_owned(), local);
            }
            _ => {}
        }
    }
}

fn date_value(value: &Value) -> Value {
    value.as_str().map_or(Value::Null, date::normalize)
}

/// Rewrite a numeric reference: `0` becomes `null`, any other id a marker.
/// Anything else (an existing marker, an embedded object) is left alone.
pub(crate) fn reference_field(
    map: &mut Map<String, Value>,
    field: &str,
    marker: impl FnOnce(u64) -> ReferenceMarker,
) {
    let Some(slot) = map.get_mut(field) else {
        return;
    };
    match slot.as_u64() {
        Some(0) => *slot = Value::Null,
        Some(id) => *slot = marker(id).to_value(),
        None => {}
    }
}

/// Shared steps of every resolver, then the tree walk.
pub(crate) fn finish(
    mut raw: Value,
    pass: &Arc<ResolutionPass>,
    fields: impl FnOnce(&mut Map<String, Value>),
) -> Arc<Document> {
    if let Value::Object(map) = &mut raw {
        strip_transport_fields(map);
        normalize_dates(map);
        fields(map);
    }
    let doc = Document::new(raw);
    crate::resolver::resolve_references(&doc, pass);
    doc
}

// ============================================================================
// Memo Helpers
// ============================================================================

/// Fetch the entity a marker points at, through the pass memo.
pub(crate) fn fetch_reference(
    pass: &Arc<ResolutionPass>,
    marker: &ReferenceMarker,
) -> SharedFetch<EntityFetch> {
    match marker {
        ReferenceMarker::Post { id, post_type } => {
            post::fetch_by_id(pass, *id, post_type.as_deref())
        }
        ReferenceMarker::TaxonomyTerm { id, taxonomy } => term::fetch_by_id(pass, taxonomy, *id),
        ReferenceMarker::User { id } => user::fetch_by_id(pass, *id),
        ReferenceMarker::Media { id } => media::fetch_by_id(pass, *id),
        ReferenceMarker::Date { .. } | ReferenceMarker::Link { .. } => resolved(None),
    }
}

/// An already settled fetch.
pub(crate) fn resolved(doc: Option<Arc<Document>>) -> SharedFetch<EntityFetch> {
    futures::future::ready::<EntityFetch>(Ok(doc))
        .boxed()
        .shared()
}

/// Register a document fetched some other way (by slug, in a collection)
/// under its id, so markers pointing at it reuse it.
pub(crate) fn remember(pass: &Arc<ResolutionPass>, type_name: &'static str, doc: &Arc<Document>) {
    let Some(id) = doc.field("id").and_then(|id| id.as_u64()) else {
        return;
    };
    let doc = Arc::clone(doc);
    let _ = pass.register_fetch::<EntityFetch, _, _>(type_name, &id.to_string(), move || {
        futures::future::ready::<EntityFetch>(Ok(Some(doc)))
    });
}

/// Deserialize a materialized entity.
pub fn decode<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| ClientError::Decode { kind, source })
}

// ============================================================================
// Serde Helpers
// ============================================================================

/// Text that is either a plain string or WordPress's `{"rendered": ".."}`.
pub(crate) fn rendered<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Plain(String),
        Rendered { rendered: String },
        Other(Value),
    }

    Ok(match Option::<Text>::deserialize(deserializer)? {
        Some(Text::Plain(text) | Text::Rendered { rendered: text }) => text,
        Some(Text::Other(_)) | None => String::new(),
    })
}

/// Id where `0`, `"0"` and `null` mean "none".
pub(crate) fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().filter(|id| *id != 0),
        Some(Value::String(s)) => s.parse().ok().filter(|id| *id != 0),
        _ => None,
    })
}

/// List whose unresolvable entries came back as `null`.
pub(crate) fn skip_nulls<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// `{taxonomy: [term | null, ..]}` with the nulls dropped.
pub(crate) fn term_lists<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, Vec<TaxonomyTerm>>, D::Error>
where
    D: Deserializer<'de>,
{
    type Lists = BTreeMap<String, Option<Vec<Option<TaxonomyTerm>>>>;

    let lists = Option::<Lists>::deserialize(deserializer)?;
    Ok(lists
        .unwrap_or_default()
        .into_iter()
        .map(|(taxonomy, terms)| {
            let terms = terms.unwrap_or_default().into_iter().flatten().collect();
            (taxonomy, terms)
        })
        .collect())
}
