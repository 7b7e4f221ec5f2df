//! Client error types.

use std::sync::Arc;

use thiserror::Error;

/// Errors produced while talking to the WordPress REST API.
///
/// Inside a resolution pass these are shared between every waiter of the
/// same fetch, so they travel as `Arc<ClientError>` there.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to `{url}` failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("`{url}` responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed JSON from `{url}`")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL `{0}`")]
    Url(String, #[source] url::ParseError),

    #[error("IO error when reading `{0}`")]
    Io(String, #[source] std::io::Error),

    #[error("cannot decode {kind}: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid header value for `{0}`")]
    Header(&'static str),

    /// A failure reported by a memoized fetch to one of its waiters.
    #[error(transparent)]
    Shared(Arc<ClientError>),
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
