//! `[routing]` section configuration.
//!
//! The page template list the link resolver consults, and whether resolved
//! links are emitted relative or absolute.

use super::defaults;
use crate::link::PageTemplate;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[routing]` section in clutch.toml.
///
/// Templates can be listed inline, loaded from a JSON file, or both (inline
/// entries come first).
///
/// # Example
/// ```toml
/// [routing]
/// destination_url = "https://www.example.com"
/// absolute_links = false
/// templates_file = "templates.json"
///
/// [[routing.templates]]
/// type = "post_type"
/// name = "post"
/// template = "single_any"
/// path = "/blog/[slug]"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Public URL of the destination site.
    #[serde(default)]
    pub destination_url: Option<String>,

    /// Emit `https://www.example.com/blog/x` instead of `/blog/x`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub absolute_links: bool,

    /// JSON file with additional page templates.
    #[serde(default = "defaults::routing::templates_file")]
    #[educe(Default = defaults::routing::templates_file())]
    pub templates_file: Option<PathBuf>,

    #[serde(default)]
    pub templates: Vec<PageTemplate>,
}

#[cfg(test)]
mod tests {
    use super::super::ClientConfig;
    use crate::link::{PageTemplate, TemplateKind};

    #[test]
    fn test_inline_templates() {
        let config = r#"
            [routing]
            destination_url = "https://www.example.com"

            [[routing.templates]]
            type = "post_type"
            name = "post"
            template = "single_any"
            path = "/blog/[slug]"

            [[routing.templates]]
            type = "taxonomy"
            name = "category"
            template = "archive"
            path = "/categories"

            [[routing.templates]]
            type = "search"
            path = "/search"
        "#;
        let config: ClientConfig = toml::from_str(config).unwrap();

        assert_eq!(config.routing.templates.len(), 3);
        assert_eq!(
            config.routing.templates[0],
            PageTemplate::PostType {
                name: "post".into(),
                path: "/blog/[slug]".into(),
                template: TemplateKind::SingleAny,
                slug: None,
            }
        );
        assert_eq!(
            config.routing.templates[2],
            PageTemplate::Search {
                path: Some("/search".into())
            }
        );
        assert!(!config.routing.absolute_links);
    }

    #[test]
    fn test_routing_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();

        assert!(config.routing.templates.is_empty());
        assert!(config.routing.templates_file.is_none());
        assert!(config.routing.destination_url.is_none());
    }
}
