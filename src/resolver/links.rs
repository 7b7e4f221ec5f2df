//! Link resolution inside a pass.
//!
//! Every CMS lookup classification needs goes through the pass memo, so a
//! pass asks for the taxonomy list once and for each `(taxonomy, slug)` pair
//! once, however many links it rewrites.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::pass::{ResolutionPass, SharedFetch};
use crate::entity::term;
use crate::error::{ClientError, Result};
use crate::link::LinkResolver;
use crate::link::classify::{PostDetails, SiteLookup, TaxonomyDetails, TermDetails};
use crate::transport::HeaderMap;

type TaxonomyList = std::result::Result<Arc<Vec<TaxonomyDetails>>, Arc<ClientError>>;

/// [`SiteLookup`] backed by a resolution pass.
pub(crate) struct PassLookup<'a> {
    pass: &'a Arc<ResolutionPass>,
    headers: HeaderMap,
}

impl<'a> PassLookup<'a> {
    pub async fn new(pass: &'a Arc<ResolutionPass>) -> Self {
        Self {
            headers: pass.headers().await,
            pass,
        }
    }
}

#[async_trait]
impl SiteLookup for PassLookup<'_> {
    async fn post_for_url(&self, url: &Url) -> Result<Option<PostDetails>> {
        self.pass.api().post_for_url(&self.headers, url).await
    }

    async fn taxonomies(&self) -> Result<Vec<TaxonomyDetails>> {
        let pass = Arc::clone(self.pass);
        let headers = self.headers.clone();
        let fetch = self
            .pass
            .register_fetch::<TaxonomyList, _, _>("taxonomies", "all", move || async move {
                pass.api()
                    .taxonomies(&headers)
                    .await
                    .map(Arc::new)
                    .map_err(Arc::new)
            });

        match fetch.await {
            Ok(list) => Ok(list.as_ref().clone()),
            Err(err) => Err(ClientError::Shared(err)),
        }
    }

    /// Goes through the entity memo, so a term found here is not fetched
    /// again when a marker or a facade call asks for it.
    async fn term_by_slug(
        &self,
        taxonomy: &TaxonomyDetails,
        slug: &str,
    ) -> Result<Option<TermDetails>> {
        let doc = term::fetch_by_slug(self.pass, &taxonomy.name, slug)
            .await
            .map_err(ClientError::Shared)?;
        let id = doc.and_then(|doc| doc.field("id")).and_then(|id| id.as_u64());
        Ok(id.map(|id| TermDetails {
            id,
            name: slug.to_owned(),
            taxonomy: taxonomy.name.clone(),
            rest_base: taxonomy.rest_base.clone(),
            rest_namespace: taxonomy.rest_namespace.clone(),
        }))
    }
}

impl ResolutionPass {
    /// Resolve a CMS link to its destination, at most once per pass.
    ///
    /// Never fails; an unresolvable link comes back unchanged.
    pub fn resolve_link(self: &Arc<Self>, url: &str) -> SharedFetch<String> {
        let pass = Arc::clone(self);
        let raw = url.to_owned();
        self.register_fetch("link", url, move || async move {
            let templates = pass.templates().await;
            let lookup = PassLookup::new(&pass).await;
            let context = pass.context();
            let resolver = LinkResolver {
                site_host: &context.site_host,
                templates: &templates,
                destination: context.destination.as_ref(),
                lookup: &lookup,
            };
            resolver.resolve(&raw).await
        })
    }
}
