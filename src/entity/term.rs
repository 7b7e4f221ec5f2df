//! Taxonomy terms.
//!
//! Term ids are unique across taxonomies in WordPress, so the memo keys on
//! the id alone.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityFetch, finish, optional_id, remember};
use crate::resolver::{Document, ResolutionPass, SharedFetch};

pub(crate) const TYPE_NAME: &str = "taxonomy_term";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: String,
    #[serde(default)]
    pub description: String,
    /// Number of published objects carrying the term.
    #[serde(default)]
    pub count: u64,
    /// Parent term id, never fetched.
    #[serde(default, deserialize_with = "optional_id")]
    pub parent: Option<u64>,
    /// Term archive, resolved to a destination path.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub meta: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub(crate) fn resolve_term(raw: Value, pass: &Arc<ResolutionPass>) -> Arc<Document> {
    finish(raw, pass, |_| {})
}

pub(crate) fn fetch_by_id(
    pass: &Arc<ResolutionPass>,
    taxonomy: &str,
    id: u64,
) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    let taxonomy = taxonomy.to_owned();
    pass.register_fetch::<EntityFetch, _, _>(TYPE_NAME, &id.to_string(), move || async move {
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .term_by_id(&headers, &taxonomy, id)
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| resolve_term(raw, &task_pass)))
    })
}

pub(crate) fn fetch_by_slug(
    pass: &Arc<ResolutionPass>,
    taxonomy: &str,
    slug: &str,
) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    let owned = (taxonomy.to_owned(), slug.to_owned());
    let key = format!("{taxonomy}/{slug}");
    pass.register_fetch::<EntityFetch, _, _>("taxonomy_term_slug", &key, move || async move {
        let (taxonomy, slug) = owned;
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .term_by_slug(&headers, &taxonomy, &slug)
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| {
            let doc = resolve_term(raw, &task_pass);
            remember(&task_pass, TYPE_NAME, &doc);
            doc
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{context, transport};
    use crate::entity::decode;
    use serde_json::json;

    #[tokio::test]
    async fn test_term_parent_and_link() {
        let transport = transport();
        transport.on(
            "/wp-json/clutch/v1/term?taxonomy=category&slug=news",
            json!({
                "id": 5,
                "name": "News",
                "slug": "news",
                "taxonomy": "category",
                "parent": 0,
                "count": 12,
                "link": "https://cms.test/category/news/",
            }),
        );
        transport.on(
            "/wp-json/clutch/v1/taxonomies",
            json!([{"name": "category", "rest_base": "categories"}]),
        );
        let pass = ResolutionPass::new(context(transport.clone()));

        let doc = fetch_by_slug(&pass, "category", "news").await.unwrap().unwrap();
        pass.await_all_scheduled().await;
        let term: TaxonomyTerm = decode("taxonomy term", doc.materialize()).unwrap();

        assert_eq!(term.parent, None);
        assert_eq!(term.count, 12);
        assert_eq!(term.link, "/category/news");
        assert!(fetch_by_id(&pass, "category", 5).await.unwrap().is_some());
        assert_eq!(
            transport.hits("/wp-json/clutch/v1/term?taxonomy=category&slug=news"),
            1
        );
    }
}
