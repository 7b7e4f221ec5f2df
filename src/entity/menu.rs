//! Navigation menus.
//!
//! Items come back flat, in menu order, each pointing at its parent. Item
//! URLs on the CMS host are rewritten to destination paths like any other
//! site link.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityFetch, finish, optional_id, rendered, skip_nulls};
use crate::resolver::{Document, ResolutionPass, SharedFetch};

pub(crate) const TYPE_NAME: &str = "menu";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, deserialize_with = "skip_nulls")]
    pub items: Vec<MenuItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Menu {
    /// Direct children of `parent`, or the top level for `None`.
    pub fn children(&self, parent: Option<u64>) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(move |item| item.parent == parent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(default, deserialize_with = "rendered")]
    pub title: String,
    /// Destination path for CMS pages, untouched for external links.
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "menu_item_parent", deserialize_with = "optional_id")]
    pub parent: Option<u64>,
    #[serde(default, alias = "menu_order")]
    pub order: u32,
    /// Object kind behind the item (`page`, `category`, `custom`, ...).
    #[serde(default)]
    pub object: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub object_id: Option<u64>,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub meta: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Menu items carry no dates or sentinels worth rewriting; their transport
/// fields still go.
fn strip_items(map: &mut Map<String, Value>) {
    let Some(Value::Array(items)) = map.get_mut("items") else {
        return;
    };
    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        super::strip_transport_fields(item);
    }
}

pub(crate) fn resolve_menu(raw: Value, pass: &Arc<ResolutionPass>) -> Arc<Document> {
    finish(raw, pass, strip_items)
}

pub(crate) fn fetch_by_id(pass: &Arc<ResolutionPass>, id: u64) -> SharedFetch<EntityFetch> {
    let task_pass = Arc::clone(pass);
    pass.register_fetch::<EntityFetch, _, _>(TYPE_NAME, &id.to_string(), move || async move {
        let headers = task_pass.headers().await;
        let raw = task_pass
            .api()
            .menu_by_id(&headers, id)
            .await
            .map_err(Arc::new)?;
        Ok(raw.map(|raw| resolve_menu(raw, &task_pass)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{context, transport};
    use crate::entity::decode;
    use serde_json::json;

    #[tokio::test]
    async fn test_menu_items() {
        let transport = transport();
        transport.on(
            "/wp-json/clutch/v1/menus/2",
            json!({
                "id": 2,
                "name": "Main",
                "slug": "main",
                "items": [
                    {"ID": 10, "title": "Home", "url": "https://elsewhere.test/", "menu_item_parent": "0", "menu_order": 1},
                    {"ID": 11, "title": "Hello", "url": "https://cms.test/hello-world/", "menu_item_parent": "10", "menu_order": 2, "object_id": "1", "_links": {}},
                ],
            }),
        );
        transport.on(
            "/wp-json/clutch/v1/url-to-post?url=https://cms.test/hello-world/",
            json!({"id": 1, "name": "hello-world", "post_type": "post"}),
        );
        let pass = ResolutionPass::new(context(transport.clone()));

        let doc = fetch_by_id(&pass, 2).await.unwrap().unwrap();
        pass.await_all_scheduled().await;
        let menu: Menu = decode("menu", doc.materialize()).unwrap();

        assert_eq!(menu.items.len(), 2);
        assert_eq!(menu.items[1].url, "/blog/hello-world");
        assert_eq!(menu.items[1].object_id, Some(1));
        assert!(!menu.items[1].extra.contains_key("_links"));

        let top: Vec<u64> = menu.children(None).map(|item| item.id).collect();
        let nested: Vec<u64> = menu.children(Some(10)).map(|item| item.id).collect();
        assert_eq!((top, nested), (vec![10], vec![11]));
    }
}
