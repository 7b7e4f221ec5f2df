//! REST transport.
//!
//! The resolution core only ever issues `GET` requests, so the seam is one
//! async method. [`HttpTransport`] talks to a real site; [`FixtureTransport`]
//! answers from canned JSON and counts requests.

mod fixture;
mod http;

pub use fixture::FixtureTransport;
pub use http::HttpTransport;

use async_trait::async_trait;
pub use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

use crate::error::Result;

/// Total item count header set by WordPress on collection responses.
pub const TOTAL_HEADER: &str = "x-wp-total";
/// Total page count header set by WordPress on collection responses.
pub const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// A decoded response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Parsed body. `Null` for non-success responses without a JSON body.
    pub body: Value,
    /// `X-WP-Total`
    pub total: Option<u64>,
    /// `X-WP-TotalPages`
    pub total_pages: Option<u64>,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            total: None,
            total_pages: None,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a `GET`. Non-success statuses are returned, not raised; only
    /// network and body decoding failures are errors.
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Response>;
}
