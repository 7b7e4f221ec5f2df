//! Public client facade.
//!
//! Every [`Client`] method runs in a fresh [`Session`], which owns exactly
//! one resolution pass. Keep a session around to share one pass between
//! several calls of the same logical request; entities fetched by the first
//! call are reused by the next.
//!
//! # Failure Reporting
//!
//! | Call | Transport failure | Not found |
//! |------|-------------------|-----------|
//! | single entity | `None` (logged) | `None` |
//! | collection | empty [`Paginated`] (logged) | empty [`Paginated`] |
//! | [`Session::resolve_link`] | input URL | input URL |
//!
//! References inside a result that fail to resolve become `null` (absent
//! for typed fields) without failing the result.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ClientConfig, ConfigError};
use crate::entity::{
    self, EntityFetch, MediaItem, Menu, Post, SearchResult, TaxonomyTerm, User, decode,
};
use crate::fetch::{Api, Endpoints, Paginated};
use crate::query::{PostQuery, SearchQuery, TermQuery, UserQuery};
use crate::resolver::pass::Context;
use crate::resolver::{Document, ResolutionPass, SharedFetch};
use crate::transport::{HttpTransport, Transport};
use crate::{log, log_verbose};

/// Per-item resolver of a collection.
type Resolve = fn(Value, &Arc<ResolutionPass>) -> Arc<Document>;

// ============================================================================
// Client
// ============================================================================

/// Entry point. Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Client {
    context: Arc<Context>,
}

impl Client {
    /// Client talking HTTP to the configured site.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.http)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client over any transport.
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let site = config.site_url()?;
        let site_host = site
            .host_str()
            .ok_or_else(|| anyhow!(ConfigError::Validation("[site.url] has no host".into())))?
            .to_owned();
        let endpoints = Endpoints::new(&site, &config.site)?;

        let context = Context {
            api: Api::new(transport, endpoints),
            site_host,
            destination: config.destination_url()?,
            auth: config.auth.clone(),
            templates: config.routing.templates.clone(),
            templates_file: config.routing.templates_file.clone(),
        };
        Ok(Self {
            context: Arc::new(context),
        })
    }

    /// Start a session with its own resolution pass.
    pub fn session(&self) -> Session {
        Session {
            pass: ResolutionPass::new(Arc::clone(&self.context)),
        }
    }

    pub async fn fetch_posts(&self, query: &PostQuery) -> Paginated<Post> {
        self.session().fetch_posts(query).await
    }

    pub async fn fetch_post_by_slug(&self, slug: &str, post_type: &str) -> Option<Post> {
        self.session().fetch_post_by_slug(slug, post_type).await
    }

    pub async fn fetch_post_by_id(&self, id: u64, post_type: Option<&str>) -> Option<Post> {
        self.session().fetch_post_by_id(id, post_type).await
    }

    pub async fn fetch_users(&self, query: &UserQuery) -> Paginated<User> {
        self.session().fetch_users(query).await
    }

    pub async fn fetch_user_by_slug(&self, slug: &str) -> Option<User> {
        self.session().fetch_user_by_slug(slug).await
    }

    pub async fn fetch_user_by_id(&self, id: u64) -> Option<User> {
        self.session().fetch_user_by_id(id).await
    }

    pub async fn fetch_taxonomy_terms(&self, query: &TermQuery) -> Paginated<TaxonomyTerm> {
        self.session().fetch_taxonomy_terms(query).await
    }

    pub async fn fetch_taxonomy_term_by_slug(
        &self,
        taxonomy: &str,
        slug: &str,
    ) -> Option<TaxonomyTerm> {
        self.session()
            .fetch_taxonomy_term_by_slug(taxonomy, slug)
            .await
    }

    pub async fn fetch_taxonomy_term_by_id(&self, taxonomy: &str, id: u64) -> Option<TaxonomyTerm> {
        self.session().fetch_taxonomy_term_by_id(taxonomy, id).await
    }

    pub async fn fetch_search_results(&self, query: &SearchQuery) -> Paginated<SearchResult> {
        self.session().fetch_search_results(query).await
    }

    pub async fn fetch_menu_by_id(&self, id: u64) -> Option<Menu> {
        self.session().fetch_menu_by_id(id).await
    }

    pub async fn fetch_media_by_id(&self, id: u64) -> Option<MediaItem> {
        self.session().fetch_media_by_id(id).await
    }

    pub async fn resolve_link(&self, url: &str) -> String {
        self.session().resolve_link(url).await
    }
}

// ============================================================================
// Session
// ============================================================================

/// One resolution pass shared by a sequence of calls.
///
/// Dropping the session clears the pass.
pub struct Session {
    pass: Arc<ResolutionPass>,
}

impl Session {
    pub fn pass(&self) -> &Arc<ResolutionPass> {
        &self.pass
    }

    // ------------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------------

    pub async fn fetch_posts(&self, query: &PostQuery) -> Paginated<Post> {
        let headers = self.pass.headers().await;
        let page = self.pass.api().posts(&headers, query).await;
        self.collection("posts", page, Some(entity::post::TYPE_NAME), entity::post::resolve_post)
            .await
    }

    pub async fn fetch_post_by_slug(&self, slug: &str, post_type: &str) -> Option<Post> {
        let fetch = entity::post::fetch_by_slug(&self.pass, slug, post_type);
        self.single("post", fetch).await
    }

    pub async fn fetch_post_by_id(&self, id: u64, post_type: Option<&str>) -> Option<Post> {
        let fetch = entity::post::fetch_by_id(&self.pass, id, post_type);
        self.single("post", fetch).await
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub async fn fetch_users(&self, query: &UserQuery) -> Paginated<User> {
        let headers = self.pass.headers().await;
        let page = self.pass.api().users(&headers, query).await;
        self.collection("users", page, Some(entity::user::TYPE_NAME), entity::user::resolve_user)
            .await
    }

    pub async fn fetch_user_by_slug(&self, slug: &str) -> Option<User> {
        let fetch = entity::user::fetch_by_slug(&self.pass, slug);
        self.single("user", fetch).await
    }

    pub async fn fetch_user_by_id(&self, id: u64) -> Option<User> {
        let fetch = entity::user::fetch_by_id(&self.pass, id);
        self.single("user", fetch).await
    }

    // ------------------------------------------------------------------------
    // Taxonomy terms
    // ------------------------------------------------------------------------

    pub async fn fetch_taxonomy_terms(&self, query: &TermQuery) -> Paginated<TaxonomyTerm> {
        let headers = self.pass.headers().await;
        let page = self.pass.api().terms(&headers, query).await;
        self.collection(
            "taxonomy terms",
            page,
            Some(entity::term::TYPE_NAME),
            entity::term::resolve_term,
        )
        .await
    }

    pub async fn fetch_taxonomy_term_by_slug(
        &self,
        taxonomy: &str,
        slug: &str,
    ) -> Option<TaxonomyTerm> {
        let fetch = entity::term::fetch_by_slug(&self.pass, taxonomy, slug);
        self.single("taxonomy term", fetch).await
    }

    pub async fn fetch_taxonomy_term_by_id(&self, taxonomy: &str, id: u64) -> Option<TaxonomyTerm> {
        let fetch = entity::term::fetch_by_id(&self.pass, taxonomy, id);
        self.single("taxonomy term", fetch).await
    }

    // ------------------------------------------------------------------------
    // Everything else
    // ------------------------------------------------------------------------

    pub async fn fetch_search_results(&self, query: &SearchQuery) -> Paginated<SearchResult> {
        let headers = self.pass.headers().await;
        let page = self.pass.api().search(&headers, query).await;
        self.collection(
            "search results",
            page,
            None,
            entity::search::resolve_search_result,
        )
        .await
    }

    pub async fn fetch_menu_by_id(&self, id: u64) -> Option<Menu> {
        let fetch = entity::menu::fetch_by_id(&self.pass, id);
        self.single("menu", fetch).await
    }

    pub async fn fetch_media_by_id(&self, id: u64) -> Option<MediaItem> {
        let fetch = entity::media::fetch_by_id(&self.pass, id);
        self.single("media", fetch).await
    }

    /// Destination path of a CMS link. Unresolvable links come back as-is.
    pub async fn resolve_link(&self, url: &str) -> String {
        self.pass.resolve_link(url).await
    }

    // ------------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------------

    async fn single<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        fetch: SharedFetch<EntityFetch>,
    ) -> Option<T> {
        let doc = match fetch.await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                log_verbose!("fetch"; "{kind} not found");
                return None;
            }
            Err(err) => {
                log!("fetch"; "{kind}: {err}");
                return None;
            }
        };

        self.pass.await_all_scheduled().await;
        match decode(kind, doc.materialize()) {
            Ok(item) => Some(item),
            Err(err) => {
                log!("fetch"; "{err}");
                None
            }
        }
    }

    async fn collection<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        page: crate::error::Result<Paginated<Value>>,
        type_name: Option<&'static str>,
        resolve: Resolve,
    ) -> Paginated<T> {
        let page = match page {
            Ok(page) => page,
            Err(err) => {
                log!("fetch"; "{kind}: {err}");
                return Paginated::default();
            }
        };

        let Paginated {
            items,
            total_count,
            total_pages,
        } = page;
        let docs: Vec<Arc<Document>> = items
            .into_iter()
            .map(|raw| {
                let doc = resolve(raw, &self.pass);
                if let Some(type_name) = type_name {
                    entity::remember(&self.pass, type_name, &doc);
                }
                doc
            })
            .collect();

        self.pass.await_all_scheduled().await;
        let items = docs
            .iter()
            .filter_map(|doc| match decode(kind, doc.materialize()) {
                Ok(item) => Some(item),
                Err(err) => {
                    log!("fetch"; "dropping item: {err}");
                    None
                }
            })
            .collect();
        Paginated {
            items,
            total_count,
            total_pages,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.pass.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
