//! Posts of any post type.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::media::MediaItem;
use super::term::TaxonomyTerm;
use super::user::User;
use super::{EntityFetch, finish, reference_field, remember, rendered, term_lists};
use crate::resolver::{Document, ReferenceMarker, ResolutionPass, SharedFetch};

pub(crate) const TYPE_NAME: &str = "post";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default, alias = "type")]
    pub post_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "rendered")]
    pub title: String,
    #[serde(default, deserialize_with = "rendered")]
    pub content: String,
    #[serde(default, deserialize_with = "rendered")]
    pub excerpt: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    /// Permalink, resolved to a destination path.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub featured_media: Option<MediaItem>,
    /// Assigned terms by taxonomy name.
    #[serde(default, deserialize_with = "term_lists")]
    pub taxonomies: BTreeMap<String, Vec<TaxonomyTerm>>,
    /// Custom fields. Nested references are resolved too.
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub seo: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn rewrite_references(map: &mut Map<String, Value>) {
    reference_field(map, "author", |id| ReferenceMarker::User { id });
    reference_field(map, "featured_media", |id| ReferenceMarker::Media { id });
}

pub(crate) fn resolve_post(raw: Value, pass: &Arc<ResolutionPass>) -> Arc<Document> {
    finish(raw, pass, rewrite_references)
}

pub(crate) fn fetch_by_id(
    pass: &Arc<ResolutionPass>,
    id: u64,
    post_type: Option<&str>,
) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    let post_type = post_type.map(str::to_owned);
    pass.register_fetch::<EntityFetch, _, _>(TYPE_NAME, &id.to_string(), move || async move {
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .post_by_id(&headers, id, post_type.as_deref())
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| resolve_post(raw, &task_pass)))
    })
}

pub(crate) fn fetch_by_slug(
    pass: &Arc<ResolutionPass>,
    slug: &str,
    post_type: &str,
) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    let owned = (slug.to_owned(), post_type.to_owned());
    let key = format!("{post_type}/{slug}");
    pass.register_fetch::<EntityFetch, _, _>("post_slug", &key, move || async move {
        let (slug, post_type) = owned;
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .post_by_slug(&headers, &slug, &post_type)
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| {
            let doc = resolve_post(raw, &task_pass);
            remember(&task_pass, TYPE_NAME, &doc);
            doc
        }))
    })
}
