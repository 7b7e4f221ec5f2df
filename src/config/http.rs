//! `[http]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[http]` section in clutch.toml - transport settings.
///
/// # Example
/// ```toml
/// [http]
/// timeout_secs = 10
/// user_agent = "my-frontend/1.0"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "defaults::http::timeout_secs")]
    #[educe(Default = defaults::http::timeout_secs())]
    pub timeout_secs: u64,

    #[serde(default = "defaults::http::user_agent")]
    #[educe(Default = defaults::http::user_agent())]
    pub user_agent: String,
}
