//! In-memory transport answering from canned JSON.
//!
//! Routes are keyed by path plus query string. Query parameters are compared
//! order-insensitively, so `/post?id=1&post_type=post` and
//! `/post?post_type=post&id=1` are the same route. Unknown routes answer 404.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use url::Url;

use super::{HeaderMap, Response, Transport};
use crate::error::{ClientError, Result};

#[derive(Debug, Clone)]
enum Route {
    Respond(Response),
    /// Simulated network failure.
    Fail,
}

/// Canned-response transport with request counting.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    routes: Mutex<FxHashMap<String, Route>>,
    hits: Mutex<FxHashMap<String, usize>>,
    last_headers: Mutex<Option<HeaderMap>>,
    delay: Option<Duration>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before every answer, so concurrent requests overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer `route` with `body` and status 200.
    pub fn on(&self, route: &str, body: Value) -> &Self {
        self.respond(route, Response::ok(body))
    }

    /// Answer a collection route, setting the pagination headers.
    pub fn on_page(&self, route: &str, body: Value, total: u64, total_pages: u64) -> &Self {
        self.respond(
            route,
            Response {
                status: 200,
                body,
                total: Some(total),
                total_pages: Some(total_pages),
            },
        )
    }

    /// Answer `route` with an empty body and `status`.
    pub fn on_status(&self, route: &str, status: u16) -> &Self {
        self.respond(
            route,
            Response {
                status,
                body: Value::Null,
                total: None,
                total_pages: None,
            },
        )
    }

    /// Make `route` fail as if the network dropped.
    pub fn on_failure(&self, route: &str) -> &Self {
        self.routes.lock().insert(normalize_route(route), Route::Fail);
        self
    }

    pub fn respond(&self, route: &str, response: Response) -> &Self {
        self.routes
            .lock()
            .insert(normalize_route(route), Route::Respond(response));
        self
    }

    /// Number of requests seen for `route`.
    pub fn hits(&self, route: &str) -> usize {
        self.hits
            .lock()
            .get(&normalize_route(route))
            .copied()
            .unwrap_or(0)
    }

    /// Number of requests seen overall.
    pub fn total_hits(&self) -> usize {
        self.hits.lock().values().sum()
    }

    /// Headers of the most recent request.
    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.last_headers.lock().clone()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Response> {
        let key = route_key(url);
        *self.hits.lock().entry(key.clone()).or_default() += 1;
        *self.last_headers.lock() = Some(headers.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.lock().get(&key).cloned();
        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail) => Err(ClientError::Status {
                url: url.to_string(),
                status: 599,
            }),
            None => Ok(Response {
                status: 404,
                body: Value::Null,
                total: None,
                total_pages: None,
            }),
        }
    }
}

/// Canonical key for a request URL: decoded path plus sorted query pairs.
fn route_key(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.sort();
    join_route(url.path(), &pairs)
}

/// Canonical key for a route written in a test (`/path?a=1&b=2`).
fn normalize_route(route: &str) -> String {
    match Url::parse("http://fixture.invalid").and_then(|base| base.join(route)) {
        Ok(url) => route_key(&url),
        Err(_) => route.to_owned(),
    }
}

fn join_route(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{path}?{}", query.join("&"))
}
