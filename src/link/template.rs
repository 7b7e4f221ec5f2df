//! Page template descriptors.
//!
//! The routing table of the destination site. Each entry tells the link
//! resolver which route renders a given WordPress object.
//!
//! ```toml
//! [[routing.templates]]
//! type = "post_type"
//! name = "post"
//! template = "single_any"
//! path = "/blog/[slug]"
//!
//! [[routing.templates]]
//! type = "taxonomy"
//! name = "category"
//! template = "single_any"
//! path = "/category/[slug]"
//! ```

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the object slug in template paths.
pub const SLUG_PLACEHOLDER: &str = "[slug]";

/// Which view of a post type or taxonomy a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Listing of every object of the type (`/blog`).
    Archive,
    /// Any single object, path contains `[slug]` (`/blog/[slug]`).
    SingleAny,
    /// One particular object, selected by `slug` (`/about`).
    SingleSpecific,
}

/// One entry of the page template list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageTemplate {
    PostType {
        name: String,
        path: String,
        template: TemplateKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slug: Option<String>,
    },
    Taxonomy {
        name: String,
        path: String,
        template: TemplateKind,
    },
    FrontPage {
        #[serde(default)]
        path: Option<String>,
    },
    Author {
        #[serde(default)]
        path: Option<String>,
    },
    Search {
        #[serde(default)]
        path: Option<String>,
    },
    NotFound {
        #[serde(default)]
        path: Option<String>,
    },
    #[serde(rename = "none")]
    Unrouted {
        #[serde(default)]
        path: Option<String>,
    },
}

impl PageTemplate {
    /// Path of a post type template with the given view.
    pub fn post_type_path(&self, post_type: &str, kind: TemplateKind) -> Option<&str> {
        match self {
            Self::PostType {
                name,
                path,
                template,
                ..
            } if name == post_type && *template == kind => Some(path),
            _ => None,
        }
    }

    /// Path of a taxonomy template with the given view.
    pub fn taxonomy_path(&self, taxonomy: &str, kind: TemplateKind) -> Option<&str> {
        match self {
            Self::Taxonomy {
                name,
                path,
                template,
            } if name == taxonomy && *template == kind => Some(path),
            _ => None,
        }
    }
}

/// Replace every `[slug]` in a template path.
pub fn fill_slug(path: &str, slug: &str) -> String {
    path.replace(SLUG_PLACEHOLDER, slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_template_list() {
        let json = r#"[
            {"type": "post_type", "name": "post", "template": "single_any", "path": "/blog/[slug]"},
            {"type": "post_type", "name": "page", "template": "single_specific", "path": "/about", "slug": "about"},
            {"type": "taxonomy", "name": "category", "template": "archive", "path": "/categories"},
            {"type": "front_page", "path": "/"},
            {"type": "not_found"}
        ]"#;
        let templates: Vec<PageTemplate> = serde_json::from_str(json).unwrap();

        assert_eq!(templates.len(), 5);
        assert_eq!(
            templates[1],
            PageTemplate::PostType {
                name: "page".into(),
                path: "/about".into(),
                template: TemplateKind::SingleSpecific,
                slug: Some("about".into()),
            }
        );
        assert_eq!(templates[4], PageTemplate::NotFound { path: None });
    }

    #[test]
    fn test_unknown_template_kind_rejected() {
        let json = r#"{"type": "post_type", "name": "post", "template": "list", "path": "/x"}"#;
        assert!(serde_json::from_str::<PageTemplate>(json).is_err());
    }

    #[test]
    fn test_post_type_path_matches_name_and_kind() {
        let template = PageTemplate::PostType {
            name: "post".into(),
            path: "/blog/[slug]".into(),
            template: TemplateKind::SingleAny,
            slug: None,
        };
        assert_eq!(
            template.post_type_path("post", TemplateKind::SingleAny),
            Some("/blog/[slug]")
        );
        assert_eq!(template.post_type_path("post", TemplateKind::Archive), None);
        assert_eq!(template.post_type_path("page", TemplateKind::SingleAny), None);
        assert_eq!(template.taxonomy_path("post", TemplateKind::SingleAny), None);
    }

    #[test]
    fn test_fill_slug() {
        assert_eq!(fill_slug("/blog/[slug]", "hello-world"), "/blog/hello-world");
        assert_eq!(fill_slug("/static", "ignored"), "/static");
    }
}
