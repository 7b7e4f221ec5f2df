//! `[auth]` section configuration.
//!
//! Credentials and draft mode. Both only ever show up as request headers.

use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[auth]` section in clutch.toml.
///
/// # Example
/// ```toml
/// [auth]
/// token_path = "~/.config/clutch/token"
/// draft_mode = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,

    /// File holding the bearer token. Read lazily, once per resolution pass.
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    /// Ask the plugin for draft content.
    #[serde(default)]
    pub draft_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::super::ClientConfig;
    use std::path::PathBuf;

    #[test]
    fn test_auth_config() {
        let config = r#"
            [site]
            url = "https://cms.example.com"

            [auth]
            token_path = "~/.config/clutch/token"
            draft_mode = true
        "#;
        let config: ClientConfig = toml::from_str(config).unwrap();

        assert_eq!(config.auth.token, None);
        assert_eq!(
            config.auth.token_path,
            Some(PathBuf::from("~/.config/clutch/token"))
        );
        assert!(config.auth.draft_mode);
    }

    #[test]
    fn test_auth_config_defaults() {
        let config: ClientConfig = toml::from_str("[site]\nurl = \"https://a.b\"").unwrap();

        assert_eq!(config.auth.token, None);
        assert_eq!(config.auth.token_path, None);
        assert!(!config.auth.draft_mode);
    }
}
