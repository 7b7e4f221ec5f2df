//! Permalink classification.
//!
//! Turns an absolute URL into a [`PermalinkInfo`] by asking the CMS what
//! lives at that address.
//!
//! # Lookup Order
//!
//! | Step | Check | Result |
//! |------|-------|--------|
//! | 1 | host differs from the site host | `External` |
//! | 2 | URL-to-post lookup succeeds | `Post` |
//! | 3 | last path segment is a term slug | `TaxonomyTerm` |
//! | 4 | last path segment is a taxonomy rewrite slug | `Taxonomy` |
//! | 5 | path is `YYYY[/MM[/DD]]` | `DateArchive` |
//! | 6 | otherwise | `Unknown` |
//!
//! Taxonomies are always searched in ascending order of their name, so a slug
//! shared by several taxonomies resolves the same way no matter how the CMS
//! enumerates them.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// A post found behind a permalink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetails {
    pub id: u64,
    /// Post slug.
    pub name: String,
    pub post_type: String,
    #[serde(default)]
    pub rest_base: Option<String>,
    #[serde(default)]
    pub rest_namespace: Option<String>,
}

/// A taxonomy as enumerated by the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDetails {
    pub name: String,
    #[serde(default)]
    pub rest_base: Option<String>,
    #[serde(default)]
    pub rest_namespace: Option<String>,
    /// Rewrite slug of the taxonomy archive (`category`, `tag`, ...).
    #[serde(default, skip_serializing)]
    pub rewrite_slug: Option<String>,
    #[serde(default = "crate::config::defaults::r#true", skip_serializing)]
    pub public: bool,
}

/// A taxonomy term found behind a permalink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDetails {
    pub id: u64,
    /// Term slug.
    pub name: String,
    pub taxonomy: String,
    #[serde(default)]
    pub rest_base: Option<String>,
    #[serde(default)]
    pub rest_namespace: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateDetails {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

/// What a permalink points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "object_type", content = "details", rename_all = "snake_case")]
pub enum PermalinkInfo {
    Post(PostDetails),
    Taxonomy(TaxonomyDetails),
    TaxonomyTerm(TermDetails),
    DateArchive(DateDetails),
    External,
    Unknown,
}

/// The CMS lookups classification needs.
#[async_trait]
pub trait SiteLookup: Send + Sync {
    /// URL-to-post facility of the CMS.
    async fn post_for_url(&self, url: &Url) -> Result<Option<PostDetails>>;

    /// Every registered taxonomy, in whatever order the CMS returns them.
    async fn taxonomies(&self) -> Result<Vec<TaxonomyDetails>>;

    async fn term_by_slug(
        &self,
        taxonomy: &TaxonomyDetails,
        slug: &str,
    ) -> Result<Option<TermDetails>>;
}

/// Classify `url` against the site living at `site_host`.
pub async fn classify_url(
    url: &Url,
    site_host: &str,
    lookup: &dyn SiteLookup,
) -> Result<PermalinkInfo> {
    let same_host = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(site_host));
    if !same_host {
        return Ok(PermalinkInfo::External);
    }

    if let Some(post) = lookup.post_for_url(url).await? {
        return Ok(PermalinkInfo::Post(post));
    }

    if let Some(segment) = last_segment(url) {
        let mut taxonomies = lookup.taxonomies().await?;
        taxonomies.retain(|taxonomy| taxonomy.public);
        taxonomies.sort_by(|a, b| a.name.cmp(&b.name));

        let terms = join_all(
            taxonomies
                .iter()
                .map(|taxonomy| lookup.term_by_slug(taxonomy, segment)),
        )
        .await;
        for term in terms {
            if let Some(term) = term? {
                return Ok(PermalinkInfo::TaxonomyTerm(term));
            }
        }

        if let Some(taxonomy) = taxonomies
            .into_iter()
            .find(|taxonomy| taxonomy.rewrite_slug.as_deref() == Some(segment))
        {
            return Ok(PermalinkInfo::Taxonomy(taxonomy));
        }
    }

    Ok(parse_date_archive(url.path()).map_or(PermalinkInfo::Unknown, PermalinkInfo::DateArchive))
}

/// Last non-empty segment of the URL path.
fn last_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.rev().find(|segment| !segment.is_empty())
}

/// Parse `/YYYY`, `/YYYY/MM` or `/YYYY/MM/DD` (trailing slash optional).
///
/// The year must lie in `1000..=9999` and month/day must form a real date.
pub fn parse_date_archive(path: &str) -> Option<DateDetails> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() || segments.len() > 3 {
        return None;
    }
    if !segments.iter().all(|s| s.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let year: i32 = segments[0].parse().ok()?;
    if segments[0].len() != 4 || !(1000..=9999).contains(&year) {
        return None;
    }

    let month = match segments.get(1) {
        Some(s) if s.len() <= 2 => Some(s.parse::<u32>().ok()?),
        Some(_) => return None,
        None => None,
    };
    if let Some(month) = month
        && !(1..=12).contains(&month)
    {
        return None;
    }

    let day = match segments.get(2) {
        Some(s) if s.len() <= 2 => Some(s.parse::<u32>().ok()?),
        Some(_) => return None,
        None => None,
    };
    if let (Some(month), Some(day)) = (month, day) {
        NaiveDate::from_ymd_opt(year, month, day)?;
    }

    Some(DateDetails { year, month, day })
}
