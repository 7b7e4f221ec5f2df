//! Users (post authors).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityFetch, finish, remember};
use crate::resolver::{Document, ResolutionPass, SharedFetch};

pub(crate) const TYPE_NAME: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Website from the profile.
    #[serde(default)]
    pub url: String,
    /// Author archive, resolved to a destination path.
    #[serde(default)]
    pub link: String,
    /// Size in pixels → avatar URL.
    #[serde(default)]
    pub avatar_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub meta: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub(crate) fn resolve_user(raw: Value, pass: &Arc<ResolutionPass>) -> Arc<Document> {
    finish(raw, pass, |_| {})
}

pub(crate) fn fetch_by_id(pass: &Arc<ResolutionPass>, id: u64) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    pass.register_fetch::<EntityFetch, _, _>(TYPE_NAME, &id.to_string(), move || async move {
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .user_by_id(&headers, id)
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| resolve_user(raw, &task_pass)))
    })
}

pub(crate) fn fetch_by_slug(pass: &Arc<ResolutionPass>, slug: &str) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    let owned = slug.to_owned();
    pass.register_fetch::<EntityFetch, _, _>("user_slug", slug, move || async move {
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .user_by_slug(&headers, &owned)
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| {
            let doc = resolve_user(raw, &task_pass);
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
    async fn test_slug_fetch_is_reused_by_id() {
        let transport = transport();
        transport.on(
            "/wp-json/wp/v2/users?slug=ada",
            json!([{
                "id": 3,
                "name": "Ada",
                "slug": "ada",
                "link": "https://cms.test/author/ada/",
                "avatar_urls": {"24": "https://secure.gravatar.com/a.png"},
                "_links": {"self": []},
            }]),
        );
        let pass = ResolutionPass::new(context(transport.clone()));

        let doc = fetch_by_slug(&pass, "ada").await.unwrap().unwrap();
        let again = fetch_by_id(&pass, 3).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&doc, &again));
        assert_eq!(transport.total_hits(), 1);

        pass.await_all_scheduled().await;
        let user: User = decode("user", doc.materialize()).unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.avatar_urls["24"], "https://secure.gravatar.com/a.png");
        assert!(!user.extra.contains_key("_links"));
    }
}
