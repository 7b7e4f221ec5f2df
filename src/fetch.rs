//! Entity fetchers.
//!
//! One function per entity kind, each a single `GET` against either the
//! Clutch plugin namespace or the core WordPress namespace. Fetchers know
//! nothing about resolution passes; they hand back raw JSON.
//!
//! # Endpoints
//!
//! | Fetcher | Request |
//! |---------|---------|
//! | [`Api::posts`] | `{api}/posts?post_type=..&page=..` |
//! | [`Api::post_by_id`] | `{api}/post?id=..&post_type=..` |
//! | [`Api::post_by_slug`] | `{api}/post?slug=..&post_type=..` |
//! | [`Api::terms`] | `{api}/terms?taxonomy=..` |
//! | [`Api::term_by_id`] | `{api}/term?taxonomy=..&id=..` |
//! | [`Api::term_by_slug`] | `{api}/term?taxonomy=..&slug=..` |
//! | [`Api::taxonomies`] | `{api}/taxonomies` |
//! | [`Api::post_for_url`] | `{api}/url-to-post?url=..` |
//! | [`Api::menu_by_id`] | `{api}/menus/{id}` |
//! | [`Api::users`] | `{wp}/users` |
//! | [`Api::user_by_id`] | `{wp}/users/{id}` |
//! | [`Api::user_by_slug`] | `{wp}/users?slug=..` |
//! | [`Api::media_by_id`] | `{wp}/media/{id}` |
//! | [`Api::search`] | `{wp}/search?search=..` |
//!
//! A zero id or empty slug short-circuits to `Ok(None)` without a request.
//! `404` means "not found" and is `Ok(None)` too. Any other non-success
//! status is an error.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::SiteConfig;
use crate::error::{ClientError, Result};
use crate::link::classify::{PostDetails, TaxonomyDetails};
use crate::query::{PostQuery, QueryPairs, SearchQuery, TermQuery, UserQuery};
use crate::transport::{HeaderMap, Response, Transport};

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// `X-WP-Total`, or the item count when the header is missing.
    pub total_count: u64,
    /// `X-WP-TotalPages`, or `1` when the header is missing.
    pub total_pages: u64,
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            total_pages: 0,
        }
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Base URLs of the two REST namespaces.
#[derive(Debug, Clone)]
pub struct Endpoints {
    api: Url,
    wp: Url,
}

impl Endpoints {
    pub fn new(site: &Url, config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            api: namespace_base(site, &config.rest_prefix, &config.api_namespace)?,
            wp: namespace_base(site, &config.rest_prefix, &config.wp_namespace)?,
        })
    }

    fn api(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        build(&self.api, path, query)
    }

    fn wp(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        build(&self.wp, path, query)
    }
}

/// `https://cms/blog` + `wp-json` + `clutch/v1` -> `https://cms/blog/wp-json/clutch/v1/`
fn namespace_base(site: &Url, prefix: &str, namespace: &str) -> Result<Url> {
    let raw = format!(
        "{}/{}/{}/",
        site.as_str().trim_end_matches('/'),
        prefix.trim_matches('/'),
        namespace.trim_matches('/')
    );
    Url::parse(&raw).map_err(|err| ClientError::Url(raw, err))
}

fn build(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url> {
    let mut url = base
        .join(path)
        .map_err(|err| ClientError::Url(format!("{base}{path}"), err))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn pairs<const N: usize>(pairs: [(&str, &str); N]) -> QueryPairs {
    pairs
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}

// ============================================================================
// Fetchers
// ============================================================================

/// Transport plus endpoints. Cheap to clone.
#[derive(Clone)]
pub struct Api {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
}

impl Api {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    async fn get(&self, url: Url, headers: &HeaderMap) -> Result<Option<Response>> {
        let response = self.transport.get(&url, headers).await?;
        match response.status {
            404 => Ok(None),
            _ if response.is_success() => Ok(Some(response)),
            status => Err(ClientError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }

    async fn get_one(&self, url: Url, headers: &HeaderMap) -> Result<Option<Value>> {
        let body = self.get(url, headers).await?.map(|response| response.body);
        Ok(body.filter(|body| !body.is_null()))
    }

    async fn get_page(&self, url: Url, headers: &HeaderMap) -> Result<Paginated<Value>> {
        let Some(response) = self.get(url.clone(), headers).await? else {
            return Ok(Paginated::default());
        };

        let items: Vec<Value> = match response.body {
            Value::Null => Vec::new(),
            body => serde_json::from_value(body).map_err(|source| ClientError::Json {
                url: url.to_string(),
                source,
            })?,
        };
        Ok(Paginated {
            total_count: response.total.unwrap_or(items.len() as u64),
            total_pages: response.total_pages.unwrap_or(1),
            items,
        })
    }

    // ------------------------------------------------------------------------
    // Plugin namespace
    // ------------------------------------------------------------------------

    pub async fn posts(&self, headers: &HeaderMap, query: &PostQuery) -> Result<Paginated<Value>> {
        let url = self.endpoints.api("posts", &query.to_pairs())?;
        self.get_page(url, headers).await
    }

    pub async fn post_by_id(
        &self,
        headers: &HeaderMap,
        id: u64,
        post_type: Option<&str>,
    ) -> Result<Option<Value>> {
        if id == 0 {
            return Ok(None);
        }
        let id = id.to_string();
        let query = pairs([("id", id.as_str()), ("post_type", post_type.unwrap_or_default())]);
        self.get_one(self.endpoints.api("post", &query)?, headers)
            .await
    }

    pub async fn post_by_slug(
        &self,
        headers: &HeaderMap,
        slug: &str,
        post_type: &str,
    ) -> Result<Option<Value>> {
        if slug.is_empty() {
            return Ok(None);
        }
        let query = pairs([("slug", slug), ("post_type", post_type)]);
        self.get_one(self.endpoints.api("post", &query)?, headers)
            .await
    }

    pub async fn terms(&self, headers: &HeaderMap, query: &TermQuery) -> Result<Paginated<Value>> {
        let url = self.endpoints.api("terms", &query.to_pairs())?;
        self.get_page(url, headers).await
    }

    pub async fn term_by_id(
        &self,
        headers: &HeaderMap,
        taxonomy: &str,
        id: u64,
    ) -> Result<Option<Value>> {
        if id == 0 || taxonomy.is_empty() {
            return Ok(None);
        }
        let id = id.to_string();
        let query = pairs([("taxonomy", taxonomy), ("id", id.as_str())]);
        self.get_one(self.endpoints.api("term", &query)?, headers)
            .await
    }

    pub async fn term_by_slug(
        &self,
        headers: &HeaderMap,
        taxonomy: &str,
        slug: &str,
    ) -> Result<Option<Value>> {
        if slug.is_empty() || taxonomy.is_empty() {
            return Ok(None);
        }
        let query = pairs([("taxonomy", taxonomy), ("slug", slug)]);
        self.get_one(self.endpoints.api("term", &query)?, headers)
            .await
    }

    /// Every registered taxonomy. Accepts both a list and a name-keyed map.
    pub async fn taxonomies(&self, headers: &HeaderMap) -> Result<Vec<TaxonomyDetails>> {
        let url = self.endpoints.api("taxonomies", &[])?;
        let body = match self.get_one(url.clone(), headers).await? {
            Some(Value::Object(map)) => Value::Array(map.into_iter().map(|(_, v)| v).collect()),
            Some(body) => body,
            None => return Ok(Vec::new()),
        };
        serde_json::from_value(body).map_err(|source| ClientError::Json {
            url: url.to_string(),
            source,
        })
    }

    pub async fn post_for_url(&self, headers: &HeaderMap, url: &Url) -> Result<Option<PostDetails>> {
        let request = self
            .endpoints
            .api("url-to-post", &pairs([("url", url.as_str())]))?;
        let Some(body) = self.get_one(request.clone(), headers).await? else {
            return Ok(None);
        };
        serde_json::from_value(body)
            .map(Some)
            .map_err(|source| ClientError::Json {
                url: request.to_string(),
                source,
            })
    }

    pub async fn menu_by_id(&self, headers: &HeaderMap, id: u64) -> Result<Option<Value>> {
        if id == 0 {
            return Ok(None);
        }
        let url = self.endpoints.api(&format!("menus/{id}"), &[])?;
        self.get_one(url, headers).await
    }

    // ------------------------------------------------------------------------
    // Core namespace
    // ------------------------------------------------------------------------

    pub async fn users(&self, headers: &HeaderMap, query: &UserQuery) -> Result<Paginated<Value>> {
        let url = self.endpoints.wp("users", &query.to_pairs())?;
        self.get_page(url, headers).await
    }

    pub async fn user_by_id(&self, headers: &HeaderMap, id: u64) -> Result<Option<Value>> {
        if id == 0 {
            return Ok(None);
        }
        let url = self.endpoints.wp(&format!("users/{id}"), &[])?;
        self.get_one(url, headers).await
    }

    /// The core API only filters the collection by slug, so take its head.
    pub async fn user_by_slug(&self, headers: &HeaderMap, slug: &str) -> Result<Option<Value>> {
        if slug.is_empty() {
            return Ok(None);
        }
        let url = self.endpoints.wp("users", &pairs([("slug", slug)]))?;
        let page = self.get_page(url, headers).await?;
        Ok(page.items.into_iter().next())
    }

    pub async fn media_by_id(&self, headers: &HeaderMap, id: u64) -> Result<Option<Value>> {
        if id == 0 {
            return Ok(None);
        }
        let url = self.endpoints.wp(&format!("media/{id}"), &[])?;
        self.get_one(url, headers).await
    }

    pub async fn search(
        &self,
        headers: &HeaderMap,
        query: &SearchQuery,
    ) -> Result<Paginated<Value>> {
        let url = self.endpoints.wp("search", &query.to_pairs())?;
        self.get_page(url, headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FixtureTransport;
    use serde_json::json;

    fn api(transport: &Arc<FixtureTransport>) -> Api {
        let site = Url::parse("https://cms.test").unwrap();
        let endpoints = Endpoints::new(&site, &SiteConfig::default()).unwrap();
        Api::new(transport.clone(), endpoints)
    }

    #[test]
    fn test_endpoints_with_subdirectory_site() {
        let site = Url::parse("https://cms.test/blog/").unwrap();
        let endpoints = Endpoints::new(&site, &SiteConfig::default()).unwrap();

        let url = endpoints
            .api("post", &pairs([("slug", "a b"), ("post_type", "")]))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.test/blog/wp-json/clutch/v1/post?slug=a+b"
        );
        assert_eq!(
            endpoints.wp("media/3", &[]).unwrap().as_str(),
            "https://cms.test/blog/wp-json/wp/v2/media/3"
        );
    }

    #[tokio::test]
    async fn test_single_fetch_outcomes() {
        let transport = Arc::new(FixtureTransport::new());
        transport.on("/wp-json/wp/v2/users/1", json!({"id": 1, "name": "Ada"}));
        transport.on_status("/wp-json/wp/v2/users/2", 500);
        let api = api(&transport);
        let headers = HeaderMap::new();

        assert_eq!(
            api.user_by_id(&headers, 1).await.unwrap(),
            Some(json!({"id": 1, "name": "Ada"}))
        );
        assert_eq!(api.user_by_id(&headers, 3).await.unwrap(), None);
        assert!(matches!(
            api.user_by_id(&headers, 2).await,
            Err(ClientError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_falsy_keys_skip_request() {
        let transport = Arc::new(FixtureTransport::new());
        let api = api(&transport);
        let headers = HeaderMap::new();

        assert_eq!(api.post_by_id(&headers, 0, None).await.unwrap(), None);
        assert_eq!(api.post_by_slug(&headers, "", "post").await.unwrap(), None);
        assert_eq!(api.media_by_id(&headers, 0).await.unwrap(), None);
        assert_eq!(api.term_by_id(&headers, "", 4).await.unwrap(), None);
        assert_eq!(transport.total_hits(), 0);
    }

    #[tokio::test]
    async fn test_page_totals() {
        let transport = Arc::new(FixtureTransport::new());
        transport.on_page(
            "/wp-json/clutch/v1/posts?post_type=post&page=1&per_page=2",
            json!([{"id": 1}, {"id": 2}]),
            7,
            4,
        );
        transport.on("/wp-json/wp/v2/users", json!([{"id": 1}]));
        let api = api(&transport);
        let headers = HeaderMap::new();

        let page = api
            .posts(&headers, &PostQuery::default().page(1, 2))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!((page.total_count, page.total_pages), (7, 4));

        let page = api.users(&headers, &UserQuery::default()).await.unwrap();
        assert_eq!((page.total_count, page.total_pages), (1, 1));
    }

    #[tokio::test]
    async fn test_user_by_slug_takes_first() {
        let transport = Arc::new(FixtureTransport::new());
        transport.on("/wp-json/wp/v2/users?slug=ada", json!([{"id": 1}, {"id": 9}]));
        let api = api(&transport);

        assert_eq!(
            api.user_by_slug(&HeaderMap::new(), "ada").await.unwrap(),
            Some(json!({"id": 1}))
        );
    }

    #[tokio::test]
    async fn test_taxonomies_map_or_list() {
        let transport = Arc::new(FixtureTransport::new());
        transport.on(
            "/wp-json/clutch/v1/taxonomies",
            json!({"category": {"name": "category", "rest_base": "categories"}}),
        );
        let api = api(&transport);

        let taxonomies = api.taxonomies(&HeaderMap::new()).await.unwrap();
        assert_eq!(taxonomies.len(), 1);
        assert_eq!(taxonomies[0].name, "category");
        assert!(taxonomies[0].public);
    }

    #[tokio::test]
    async fn test_post_for_url() {
        let transport = Arc::new(FixtureTransport::new());
        transport.on(
            "/wp-json/clutch/v1/url-to-post?url=https://cms.test/hello/",
            json!({"id": 4, "name": "hello", "post_type": "post"}),
        );
        let api = api(&transport);
        let headers = HeaderMap::new();

        let found = Url::parse("https://cms.test/hello/").unwrap();
        let post = api.post_for_url(&headers, &found).await.unwrap().unwrap();
        assert_eq!(post.id, 4);

        let missing = Url::parse("https://cms.test/nope/").unwrap();
        assert_eq!(api.post_for_url(&headers, &missing).await.unwrap(), None);
    }
}
