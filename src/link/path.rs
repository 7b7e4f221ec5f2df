//! Destination path selection.
//!
//! # Template Matching
//!
//! | Classification | Preferred template | Fallbacks |
//! |----------------|--------------------|-----------|
//! | `Post` | `single_specific` with the post slug | `single_any`, `archive`, `/` |
//! | `Taxonomy` | `archive` of the taxonomy | `/` |
//! | `TaxonomyTerm` | `single_any` of the taxonomy | `/` |
//! | anything else | | `/` |

use url::Url;

use super::classify::PermalinkInfo;
use super::template::{PageTemplate, TemplateKind, fill_slug};

const ROOT: &str = "/";

/// Pick the destination path for a classified permalink.
pub fn resolve_path_from_info(info: &PermalinkInfo, templates: &[PageTemplate]) -> String {
    match info {
        PermalinkInfo::Post(post) => post_path(&post.post_type, &post.name, templates),
        PermalinkInfo::Taxonomy(taxonomy) => templates
            .iter()
            .find_map(|t| t.taxonomy_path(&taxonomy.name, TemplateKind::Archive))
            .unwrap_or(ROOT)
            .to_owned(),
        PermalinkInfo::TaxonomyTerm(term) => templates
            .iter()
            .find_map(|t| t.taxonomy_path(&term.taxonomy, TemplateKind::SingleAny))
            .map_or_else(|| ROOT.to_owned(), |path| fill_slug(path, &term.name)),
        PermalinkInfo::DateArchive(_) | PermalinkInfo::External | PermalinkInfo::Unknown => {
            ROOT.to_owned()
        }
    }
}

fn post_path(post_type: &str, slug: &str, templates: &[PageTemplate]) -> String {
    let specific = templates.iter().find_map(|template| match template {
        PageTemplate::PostType {
            name,
            path,
            template: TemplateKind::SingleSpecific,
            slug: Some(template_slug),
        } if name == post_type && template_slug == slug => Some(path.as_str()),
        _ => None,
    });
    if let Some(path) = specific {
        return path.to_owned();
    }

    if let Some(path) = templates
        .iter()
        .find_map(|t| t.post_type_path(post_type, TemplateKind::SingleAny))
    {
        return fill_slug(path, slug);
    }

    templates
        .iter()
        .find_map(|t| t.post_type_path(post_type, TemplateKind::Archive))
        .unwrap_or(ROOT)
        .to_owned()
}

/// Append a resolved path to the destination site, keeping any base path
/// the destination is mounted under.
///
/// Falls back to the relative path when the destination cannot carry a path.
pub fn to_absolute(path: &str, destination: &Url) -> String {
    if destination.cannot_be_a_base() {
        return path.to_owned();
    }
    let base = destination.path().trim_end_matches('/');
    let mut url = destination.clone();
    url.set_path(&format!("{base}/{}", path.trim_start_matches('/')));
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::classify::{DateDetails, PostDetails, TaxonomyDetails, TermDetails};

    fn post(post_type: &str, slug: &str) -> PermalinkInfo {
        PermalinkInfo::Post(PostDetails {
            id: 1,
            name: slug.into(),
            post_type: post_type.into(),
            rest_base: None,
            rest_namespace: None,
        })
    }

    fn post_template(name: &str, kind: TemplateKind, path: &str, slug: Option<&str>) -> PageTemplate {
        PageTemplate::PostType {
            name: name.into(),
            path: path.into(),
            template: kind,
            slug: slug.map(Into::into),
        }
    }

    fn taxonomy_template(name: &str, kind: TemplateKind, path: &str) -> PageTemplate {
        PageTemplate::Taxonomy {
            name: name.into(),
            path: path.into(),
            template: kind,
        }
    }

    #[test]
    fn test_post_single_any() {
        let templates = [post_template("post", TemplateKind::SingleAny, "/blog/[slug]", None)];
        assert_eq!(
            resolve_path_from_info(&post("post", "hello-world"), &templates),
            "/blog/hello-world"
        );
    }

    #[test]
    fn test_post_single_specific_wins() {
        let templates = [
            post_template("page", TemplateKind::SingleAny, "/[slug]", None),
            post_template("page", TemplateKind::SingleSpecific, "/company/about", Some("about")),
        ];
        assert_eq!(
            resolve_path_from_info(&post("page", "about"), &templates),
            "/company/about"
        );
        assert_eq!(resolve_path_from_info(&post("page", "team"), &templates), "/team");
    }

    #[test]
    fn test_post_falls_back_to_archive_then_root() {
        let templates = [post_template("event", TemplateKind::Archive, "/events", None)];
        assert_eq!(resolve_path_from_info(&post("event", "launch"), &templates), "/events");
        assert_eq!(resolve_path_from_info(&post("post", "launch"), &templates), "/");
    }

    #[test]
    fn test_taxonomy_paths() {
        let templates = [
            taxonomy_template("category", TemplateKind::Archive, "/categories"),
            taxonomy_template("category", TemplateKind::SingleAny, "/categories/[slug]"),
        ];
        let archive = PermalinkInfo::Taxonomy(TaxonomyDetails {
            name: "category".into(),
            rest_base: None,
            rest_namespace: None,
            rewrite_slug: None,
            public: true,
        });
        let term = PermalinkInfo::TaxonomyTerm(TermDetails {
            id: 4,
            name: "news".into(),
            taxonomy: "category".into(),
            rest_base: None,
            rest_namespace: None,
        });
        let other_term = PermalinkInfo::TaxonomyTerm(TermDetails {
            id: 5,
            name: "rust".into(),
            taxonomy: "post_tag".into(),
            rest_base: None,
            rest_namespace: None,
        });

        assert_eq!(resolve_path_from_info(&archive, &templates), "/categories");
        assert_eq!(resolve_path_from_info(&term, &templates), "/categories/news");
        assert_eq!(resolve_path_from_info(&other_term, &templates), "/");
    }

    #[test]
    fn test_unmapped_kinds_resolve_to_root() {
        let templates = [post_template("post", TemplateKind::SingleAny, "/blog/[slug]", None)];
        let date = PermalinkInfo::DateArchive(DateDetails {
            year: 2024,
            month: None,
            day: None,
        });
        assert_eq!(resolve_path_from_info(&date, &templates), "/");
        assert_eq!(resolve_path_from_info(&PermalinkInfo::External, &templates), "/");
        assert_eq!(resolve_path_from_info(&PermalinkInfo::Unknown, &templates), "/");
    }

    #[test]
    fn test_to_absolute() {
        let destination = Url::parse("https://www.example.com").unwrap();
        assert_eq!(
            to_absolute("/blog/hello-world", &destination),
            "https://www.example.com/blog/hello-world"
        );
        assert_eq!(to_absolute("/", &destination), "https://www.example.com/");
    }

    #[test]
    fn test_to_absolute_keeps_base_path() {
        let destination = Url::parse("https://www.example.com/site/").unwrap();
        assert_eq!(
            to_absolute("/blog/hello-world", &destination),
            "https://www.example.com/site/blog/hello-world"
        );
        assert_eq!(to_absolute("/", &destination), "https://www.example.com/site/");

        let destination = Url::parse("https://www.example.com/site?preview=1").unwrap();
        assert_eq!(
            to_absolute("/blog/x", &destination),
            "https://www.example.com/site/blog/x"
        );
    }
}
