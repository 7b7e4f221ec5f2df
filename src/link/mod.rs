//! Permalink → destination route translation.
//!
//! Two stages:
//!
//! 1. [`classify_url`] asks the CMS what a URL points at.
//! 2. [`resolve_path_from_info`] picks the destination route from the
//!    static page template list.
//!
//! [`LinkResolver::resolve`] runs both and never fails: whenever something
//! goes wrong the input URL comes back unchanged.

pub mod classify;
pub mod path;
pub mod template;

pub use classify::{PermalinkInfo, SiteLookup, classify_url};
pub use path::{resolve_path_from_info, to_absolute};
pub use template::{PageTemplate, TemplateKind};

use url::Url;

use crate::log;

/// Path prefixes on the CMS host that never lead to a routable page.
const NON_PAGE_PREFIXES: &[&str] = &["/wp-content/", "/wp-includes/", "/wp-json/", "/wp-admin/"];

/// Everything one link resolution needs, borrowed from the resolution pass.
pub struct LinkResolver<'a> {
    pub site_host: &'a str,
    pub templates: &'a [PageTemplate],
    /// Set when absolute destination URLs are wanted.
    pub destination: Option<&'a Url>,
    pub lookup: &'a dyn SiteLookup,
}

impl LinkResolver<'_> {
    /// Resolve `raw` to a destination path (or URL in absolute mode).
    pub async fn resolve(&self, raw: &str) -> String {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(err) => {
                log!("link"; "cannot parse `{raw}`: {err}");
                return raw.to_owned();
            }
        };

        let info = match classify_url(&url, self.site_host, self.lookup).await {
            Ok(info) => info,
            Err(err) => {
                log!("link"; "cannot classify `{raw}`: {err}");
                return raw.to_owned();
            }
        };

        let path = resolve_path_from_info(&info, self.templates);
        match self.destination {
            Some(destination) => to_absolute(&path, destination),
            None => path,
        }
    }
}

/// Check whether a string is an absolute page link on the CMS site.
///
/// Uploads, REST endpoints and anything ending in a file extension are not
/// pages and are left for the caller to use as-is.
pub fn is_site_link(value: &str, site_host: &str) -> bool {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return false;
    }
    let Ok(url) = Url::parse(value) else {
        return false;
    };
    if !url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(site_host))
    {
        return false;
    }

    let path = url.path();
    if NON_PAGE_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return false;
    }

    let last = path.rsplit('/').find(|segment| !segment.is_empty());
    !last.is_some_and(|segment| segment.contains('.'))
}
