//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use reqwest::header::{ACCEPT, HeaderMap};
use serde_json::Value;
use url::Url;

use super::{Response, TOTAL_HEADER, TOTAL_PAGES_HEADER, Transport};
use crate::config::HttpConfig;
use crate::error::{ClientError, Result};
use crate::log_verbose;

/// Transport talking to a live WordPress site.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: ReqwestClient,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let inner = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| ClientError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Response> {
        log_verbose!("fetch"; "GET {url}");

        let response = self
            .inner
            .get(url.clone())
            .headers(headers.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let total = header_number(response.headers(), TOTAL_HEADER);
        let total_pages = header_number(response.headers(), TOTAL_PAGES_HEADER);

        let bytes = response.bytes().await.map_err(|source| ClientError::Http {
            url: url.to_string(),
            source,
        })?;

        let body: Value = if (200..300).contains(&status) {
            serde_json::from_slice(&bytes).map_err(|source| ClientError::Json {
                url: url.to_string(),
                source,
            })?
        } else {
            // Error bodies are informational only
            serde_json::from_slice(&bytes).unwrap_or_default()
        };

        Ok(Response {
            status,
            body,
            total,
            total_pages,
        })
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
