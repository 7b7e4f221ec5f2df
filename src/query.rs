//! Collection query parameters.
//!
//! Every collection fetcher takes one of these. Unset fields are left out of
//! the request so the CMS applies its own defaults.

use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Query pairs in request order.
pub type QueryPairs = Vec<(String, String)>;

fn push<T: ToString>(pairs: &mut QueryPairs, key: &str, value: Option<T>) {
    if let Some(value) = value {
        pairs.push((key.to_owned(), value.to_string()));
    }
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Educe)]
#[educe(Default)]
pub struct PostQuery {
    #[educe(Default = defaults::query::post_type())]
    pub post_type: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub order: Option<Order>,
    pub order_by: Option<String>,
    pub status: Option<String>,
    /// Taxonomy filters: `(taxonomy, term ids)`.
    pub taxonomies: Vec<(String, Vec<u64>)>,
}

impl PostQuery {
    pub fn new(post_type: impl Into<String>) -> Self {
        Self {
            post_type: post_type.into(),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn order(mut self, order: Order, order_by: impl Into<String>) -> Self {
        self.order = Some(order);
        self.order_by = Some(order_by.into());
        self
    }

    /// Restrict to posts carrying any of `ids` in `taxonomy`.
    pub fn taxonomy(mut self, taxonomy: impl Into<String>, ids: Vec<u64>) -> Self {
        self.taxonomies.push((taxonomy.into(), ids));
        self
    }

    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = vec![("post_type".to_owned(), self.post_type.clone())];
        push(&mut pairs, "page", self.page);
        push(&mut pairs, "per_page", self.per_page);
        push(&mut pairs, "search", self.search.as_ref());
        push(&mut pairs, "order", self.order.map(Order::as_str));
        push(&mut pairs, "order_by", self.order_by.as_ref());
        push(&mut pairs, "status", self.status.as_ref());
        for (taxonomy, ids) in &self.taxonomies {
            let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
            pairs.push((taxonomy.clone(), ids.join(",")));
        }
        pairs
    }
}

// ============================================================================
// Taxonomy Terms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Educe)]
#[educe(Default)]
pub struct TermQuery {
    #[educe(Default = defaults::query::taxonomy())]
    pub taxonomy: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub parent: Option<u64>,
    pub hide_empty: Option<bool>,
}

impl TermQuery {
    pub fn new(taxonomy: impl Into<String>) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = vec![("taxonomy".to_owned(), self.taxonomy.clone())];
        push(&mut pairs, "page", self.page);
        push(&mut pairs, "per_page", self.per_page);
        push(&mut pairs, "search", self.search.as_ref());
        push(&mut pairs, "parent", self.parent);
        push(&mut pairs, "hide_empty", self.hide_empty);
        pairs
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

impl UserQuery {
    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push(&mut pairs, "page", self.page);
        push(&mut pairs, "per_page", self.per_page);
        push(&mut pairs, "search", self.search.as_ref());
        pairs
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub search: String,
    /// `post`, `term` or `post-format`.
    pub kind: Option<String>,
    pub subtype: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SearchQuery {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Self::default()
        }
    }

    pub fn to_pairs(&self) -> QueryPairs {
        let mut pairs = vec![("search".to_owned(), self.search.clone())];
        push(&mut pairs, "type", self.kind.as_ref());
        push(&mut pairs, "subtype", self.subtype.as_ref());
        push(&mut pairs, "page", self.page);
        push(&mut pairs, "per_page", self.per_page);
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(pairs: &[(&str, &str)]) -> QueryPairs {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_post_query_defaults() {
        let query = PostQuery::default();
        assert_eq!(query.post_type, "post");
        assert_eq!(query.to_pairs(), pairs(&[("post_type", "post")]));
    }

    #[test]
    fn test_post_query_pairs() {
        let query = PostQuery::new("page")
            .page(2, 5)
            .order(Order::Asc, "title")
            .taxonomy("category", vec![3, 4]);

        assert_eq!(
            query.to_pairs(),
            pairs(&[
                ("post_type", "page"),
                ("page", "2"),
                ("per_page", "5"),
                ("order", "asc"),
                ("order_by", "title"),
                ("category", "3,4"),
            ])
        );
    }

    #[test]
    fn test_term_query_pairs() {
        let mut query = TermQuery::new("post_tag");
        query.hide_empty = Some(true);
        query.parent = Some(0);

        assert_eq!(
            query.to_pairs(),
            pairs(&[("taxonomy", "post_tag"), ("parent", "0"), ("hide_empty", "true")])
        );
        assert_eq!(TermQuery::default().taxonomy, "category");
    }

    #[test]
    fn test_search_query_pairs() {
        let mut query = SearchQuery::new("hello world");
        query.kind = Some("post".into());

        assert_eq!(
            query.to_pairs(),
            pairs(&[("search", "hello world"), ("type", "post")])
        );
        assert!(UserQuery::default().to_pairs().is_empty());
    }
}
