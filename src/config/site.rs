//! `[site]` section configuration.
//!
//! Where the WordPress site lives and which REST namespaces it exposes.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in clutch.toml - the source WordPress site.
///
/// # Example
/// ```toml
/// [site]
/// url = "https://cms.example.com"
/// rest_prefix = "wp-json"
/// api_namespace = "clutch/v1"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Base URL of the WordPress installation. Its host decides which links
    /// are internal.
    #[serde(default)]
    pub url: String,

    /// Path segment the REST API is mounted under.
    #[serde(default = "defaults::site::rest_prefix")]
    #[educe(Default = defaults::site::rest_prefix())]
    pub rest_prefix: String,

    /// Namespace of the plugin endpoints (posts, terms, menus, ...).
    #[serde(default = "defaults::site::api_namespace")]
    #[educe(Default = defaults::site::api_namespace())]
    pub api_namespace: String,

    /// Namespace of the core WordPress endpoints (users, media, search).
    #[serde(default = "defaults::site::wp_namespace")]
    #[educe(Default = defaults::site::wp_namespace())]
    pub wp_namespace: String,
}
