//! Client configuration management for `clutch.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                         |
//! |--------------|-------------------------------------------------|
//! | `[site]`     | WordPress site URL and REST namespaces          |
//! | `[auth]`     | Bearer token and draft mode                     |
//! | `[http]`     | Transport timeout and user agent                |
//! | `[routing]`  | Page templates and destination URL              |
//!
//! # Example
//!
//! ```toml
//! [site]
//! url = "https://cms.example.com"
//!
//! [auth]
//! token_path = "~/.config/clutch/token"
//!
//! [routing]
//! destination_url = "https://www.example.com"
//! templates_file = "templates.json"
//! ```

mod auth;
pub mod defaults;
mod error;
mod http;
mod routing;
mod site;

pub use auth::AuthConfig;
pub use error::ConfigError;
pub use http::HttpConfig;
pub use routing::RoutingConfig;
pub use site::SiteConfig;

use crate::cli::Cli;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing clutch.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Source WordPress site
    #[serde(default)]
    pub site: SiteConfig,

    /// Credentials and draft mode
    #[serde(default)]
    pub auth: AuthConfig,

    /// Transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Page templates and link output
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl ClientConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path.
    ///
    /// Relative file paths inside the config are resolved against the
    /// directory containing it.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = Self::normalize_path(path);
        config.update_path_with_root();
        Ok(config)
    }

    /// Directory containing the config file
    pub fn get_root(&self) -> &Path {
        self.config_path.parent().unwrap_or(Path::new("./"))
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.site.url, cli.site.as_ref());
        if let Some(destination) = &cli.destination {
            self.routing.destination_url = Some(destination.clone());
        }
        if cli.draft {
            self.auth.draft_mode = true;
        }
        if cli.absolute {
            self.routing.absolute_links = true;
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve file paths relative to the config directory
    fn update_path_with_root(&mut self) {
        let root = self.get_root().to_path_buf();

        if let Some(templates_file) = &self.routing.templates_file {
            self.routing.templates_file = Some(Self::normalize_path(&root.join(templates_file)));
        }

        // Token path may start with `~`
        if let Some(token_path) = &self.auth.token_path {
            let expanded = shellexpand::tilde(&token_path.to_string_lossy()).into_owned();
            let path = PathBuf::from(expanded);
            self.auth.token_path = Some(if path.is_relative() {
                Self::normalize_path(&root.join(path))
            } else {
                Self::normalize_path(&path)
            });
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Parsed `[site.url]`
    pub fn site_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.site.url)?)
    }

    /// Parsed `[routing.destination_url]`, only when absolute links are on
    pub fn destination_url(&self) -> Result<Option<Url>> {
        match (&self.routing.destination_url, self.routing.absolute_links) {
            (Some(url), true) => Ok(Some(Url::parse(url)?)),
            _ => Ok(None),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.site.url.is_empty() {
            bail!(ConfigError::Validation("[site.url] is required".into()));
        }
        if !(self.site.url.starts_with("http://") || self.site.url.starts_with("https://")) {
            bail!(ConfigError::Validation(
                "[site.url] must start with http:// or https://".into()
            ));
        }
        if self.site_url()?.host_str().is_none() {
            bail!(ConfigError::Validation("[site.url] has no host".into()));
        }

        if self.auth.token.is_some() && self.auth.token_path.is_some() {
            bail!(ConfigError::Validation(
                "[auth.token] and [auth.token_path] are mutually exclusive".into()
            ));
        }
        if let Some(path) = &self.auth.token_path
            && !path.is_file()
        {
            bail!(ConfigError::Validation(
                "[auth.token_path] not found or not a file".into()
            ));
        }

        if self.routing.absolute_links && self.routing.destination_url.is_none() {
            bail!(ConfigError::Validation(
                "[routing.absolute_links] = true requires [routing.destination_url]".into()
            ));
        }
        if let Some(path) = &self.routing.templates_file
            && !path.is_file()
        {
            bail!(ConfigError::Validation(
                "[routing.templates_file] not found or not a file".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
