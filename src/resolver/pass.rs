//! Resolution pass.
//!
//! The state shared by every fetch and resolution of one top-level call:
//!
//! - a two-level memo `type -> key -> shared future`, so each entity is
//!   fetched at most once per pass no matter how many references point at it
//! - a queue of scheduled resolution tasks, drained by [`ResolutionPass::await_all_scheduled`]
//! - lazily loaded context (page templates, request headers)
//! - the documents resolved in it, whose splices are released on clear
//!
//! A pass is never reused across top-level calls; [`Session`](crate::Session)
//! creates one and clears it on drop.

use std::any::Any;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, join_all};
use parking_lot::Mutex;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use rustc_hash::FxHashMap;
use tokio::sync::{Notify, OnceCell};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{ClientError, Result};
use crate::fetch::Api;
use crate::link::PageTemplate;
use crate::resolver::tree::Document;
use crate::transport::HeaderMap;
use crate::{log, log_verbose};

/// Header asking the plugin to serve drafts and previews.
pub const DRAFT_MODE_HEADER: &str = "x-clutch-draft-mode";

/// A memoized fetch. Every waiter gets a clone of the same outcome.
pub type SharedFetch<T> = Shared<BoxFuture<'static, T>>;

type Memo = FxHashMap<&'static str, FxHashMap<String, Box<dyn Any + Send + Sync>>>;

// ============================================================================
// Client Context
// ============================================================================

/// Everything a pass needs from the client, shared by all passes.
pub(crate) struct Context {
    pub api: Api,
    /// Host of the CMS site, used to recognise internal links.
    pub site_host: String,
    /// Set when links resolve to absolute destination URLs.
    pub destination: Option<Url>,
    pub auth: AuthConfig,
    pub templates: Vec<PageTemplate>,
    pub templates_file: Option<PathBuf>,
}

impl Context {
    /// Inline templates followed by the ones in the templates file.
    async fn load_templates(&self) -> Arc<[PageTemplate]> {
        let mut templates = self.templates.clone();
        if let Some(path) = &self.templates_file {
            match read_templates(path).await {
                Ok(loaded) => templates.extend(loaded),
                Err(err) => log!("routing"; "{err}, using inline templates only"),
            }
        }
        templates.into()
    }

    async fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self.bearer_token().await {
            Ok(Some(token)) => match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => log!("auth"; "{}", ClientError::Header("authorization")),
            },
            Ok(None) => {}
            Err(err) => log!("auth"; "{err}, continuing unauthenticated"),
        }
        if self.auth.draft_mode {
            headers.insert(
                HeaderName::from_static(DRAFT_MODE_HEADER),
                HeaderValue::from_static("true"),
            );
        }
        headers
    }

    async fn bearer_token(&self) -> Result<Option<String>> {
        if let Some(token) = &self.auth.token {
            return Ok(Some(token.trim().to_owned()));
        }
        let Some(path) = &self.auth.token_path else {
            return Ok(None);
        };
        let token = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| ClientError::Io(path.display().to_string(), err))?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_owned()))
    }
}

async fn read_templates(path: &Path) -> Result<Vec<PageTemplate>> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|err| ClientError::Io(path.display().to_string(), err))?;
    serde_json::from_slice(&content).map_err(|source| ClientError::Decode {
        kind: "page templates",
        source,
    })
}

// ============================================================================
// Outstanding Task Tracking
// ============================================================================

/// Count of scheduled tasks that have not finished yet.
#[derive(Default)]
struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

/// Held by one scheduled task. Released when the task finishes or is dropped.
struct OutstandingGuard(Arc<Outstanding>);

impl OutstandingGuard {
    fn acquire(outstanding: &Arc<Outstanding>) -> Self {
        outstanding.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(outstanding))
    }
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

// ============================================================================
// Resolution Pass
// ============================================================================

pub struct ResolutionPass {
    context: Arc<Context>,
    fetches: Mutex<Memo>,
    pending: Mutex<Vec<BoxFuture<'static, ()>>>,
    outstanding: Arc<Outstanding>,
    documents: Mutex<Vec<Weak<Document>>>,
    templates: OnceCell<Arc<[PageTemplate]>>,
    headers: OnceCell<HeaderMap>,
}

impl ResolutionPass {
    pub(crate) fn new(context: Arc<Context>) -> Arc<Self> {
        Arc::new(Self {
            context,
            fetches: Mutex::new(Memo::default()),
            pending: Mutex::new(Vec::new()),
            outstanding: Arc::default(),
            documents: Mutex::new(Vec::new()),
            templates: OnceCell::new(),
            headers: OnceCell::new(),
        })
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn api(&self) -> &Api {
        &self.context.api
    }

    pub fn site_host(&self) -> &str {
        &self.context.site_host
    }

    // ------------------------------------------------------------------------
    // Memo
    // ------------------------------------------------------------------------

    /// The in-flight or finished fetch registered under `(type_name, key)`.
    ///
    /// `None` when nothing is registered, or when the registered fetch
    /// produces something other than `T`.
    pub fn get_pending_fetch<T>(&self, type_name: &'static str, key: &str) -> Option<SharedFetch<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.fetches
            .lock()
            .get(type_name)?
            .get(key)?
            .downcast_ref::<SharedFetch<T>>()
            .cloned()
    }

    /// Return the fetch registered under `(type_name, key)`, registering the
    /// one built by `factory` if there is none.
    ///
    /// Check and insert happen under one lock, so two concurrent callers
    /// always share one fetch. `factory` only builds the future; it runs on
    /// first poll and must not touch the pass synchronously.
    pub fn register_fetch<T, F, Fut>(
        &self,
        type_name: &'static str,
        key: &str,
        factory: F,
    ) -> SharedFetch<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut fetches = self.fetches.lock();
        let slot = fetches.entry(type_name).or_default();
        if let Some(existing) = slot.get(key) {
            match existing.downcast_ref::<SharedFetch<T>>() {
                Some(fetch) => return fetch.clone(),
                None => {
                    log!("resolve"; "`{type_name}/{key}` registered with another output type");
                    return factory().boxed().shared();
                }
            }
        }

        let fetch = factory().boxed().shared();
        slot.insert(key.to_owned(), Box::new(fetch.clone()));
        fetch
    }

    // ------------------------------------------------------------------------
    // Scheduled tasks
    // ------------------------------------------------------------------------

    /// Queue a resolution task. It runs during the next drain.
    pub fn schedule_resolution<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = OutstandingGuard::acquire(&self.outstanding);
        self.pending.lock().push(
            async move {
                let _guard = guard;
                task.await;
            }
            .boxed(),
        );
    }

    /// Run scheduled tasks until none are queued or running.
    ///
    /// Tasks may schedule more tasks; those are picked up in the next round.
    /// Several callers may drain the same pass concurrently: each runs the
    /// tasks it took and waits for the others' to finish.
    pub async fn await_all_scheduled(&self) {
        let mut rounds = 0usize;
        loop {
            let batch = std::mem::take(&mut *self.pending.lock());
            if !batch.is_empty() {
                rounds += 1;
                log_verbose!("resolve"; "round {rounds}: {} tasks", batch.len());
                join_all(batch).await;
                continue;
            }

            // Register interest before checking, so a release in between is seen
            let idle = self.outstanding.idle.notified();
            if self.outstanding.count.load(Ordering::SeqCst) == 0 {
                break;
            }
            idle.await;
        }
    }

    /// Remember a document resolved in this pass.
    pub(crate) fn track_document(&self, doc: &Arc<Document>) {
        self.documents.lock().push(Arc::downgrade(doc));
    }

    /// Drop memoized fetches and queued tasks.
    ///
    /// Splices of every document resolved in the pass are released too, so
    /// documents referencing each other in a cycle are freed with their last
    /// outside handle. Materialize before clearing.
    pub fn clear(&self) {
        let fetches = std::mem::take(&mut *self.fetches.lock());
        let pending = std::mem::take(&mut *self.pending.lock());
        let documents = std::mem::take(&mut *self.documents.lock());
        drop(fetches);
        drop(pending);
        for doc in documents.iter().filter_map(Weak::upgrade) {
            doc.release_splices();
        }
    }

    // ------------------------------------------------------------------------
    // Lazy context
    // ------------------------------------------------------------------------

    /// Page templates, loaded on first use.
    pub async fn templates(&self) -> Arc<[PageTemplate]> {
        self.templates
            .get_or_init(|| self.context.load_templates())
            .await
            .clone()
    }

    /// Request headers (auth, draft mode), built on first use.
    pub async fn headers(&self) -> HeaderMap {
        self.headers
            .get_or_init(|| self.context.request_headers())
            .await
            .clone()
    }
}

impl Drop for ResolutionPass {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::context;
    use crate::transport::FixtureTransport;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn pass() -> Arc<ResolutionPass> {
        ResolutionPass::new(context(Arc::new(FixtureTransport::new())))
    }

    #[tokio::test]
    async fn test_register_fetch_runs_once() {
        let pass = pass();
        let runs = Arc::new(AtomicUsize::new(0));

        let make = |runs: Arc<AtomicUsize>| {
            move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                7u64
            }
        };
        let a = pass.register_fetch("post", "1", make(runs.clone()));
        let b = pass.register_fetch("post", "1", make(runs.clone()));

        assert_eq!(futures::join!(a, b), (7, 7));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(pass.get_pending_fetch::<u64>("post", "1").is_some());
    }

    #[tokio::test]
    async fn test_get_pending_fetch_type_mismatch() {
        let pass = pass();
        let _ = pass.register_fetch("post", "1", || async { 1u64 });

        assert!(pass.get_pending_fetch::<String>("post", "1").is_none());
        assert!(pass.get_pending_fetch::<u64>("post", "2").is_none());
        assert!(pass.get_pending_fetch::<u64>("user", "1").is_none());

        let fresh = pass.register_fetch("post", "1", || async { "x".to_owned() });
        assert_eq!(fresh.await, "x");
    }

    #[tokio::test]
    async fn test_drain_reaches_fixed_point() {
        let pass = pass();
        let log = Arc::new(Mutex::new(Vec::new()));

        let (inner_pass, inner_log) = (Arc::clone(&pass), Arc::clone(&log));
        pass.schedule_resolution(async move {
            inner_log.lock().push("a");
            let nested_log = Arc::clone(&inner_log);
            inner_pass.schedule_resolution(async move {
                nested_log.lock().push("b");
            });
        });
        pass.await_all_scheduled().await;

        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert_eq!(pass.outstanding.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_drains() {
        let pass = pass();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = Arc::clone(&done);
            pass.schedule_resolution(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        futures::join!(pass.await_all_scheduled(), pass.await_all_scheduled());
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_clear_releases_pending() {
        let pass = pass();
        pass.schedule_resolution(async {});
        let _ = pass.register_fetch("post", "1", || async { 1u64 });

        pass.clear();
        assert_eq!(pass.outstanding.count.load(Ordering::SeqCst), 0);
        assert!(pass.get_pending_fetch::<u64>("post", "1").is_none());
        pass.await_all_scheduled().await;
    }

    #[tokio::test]
    async fn test_headers() {
        let mut ctx = Arc::into_inner(context(Arc::new(FixtureTransport::new()))).unwrap();
        ctx.auth.token = Some("secret".into());
        ctx.auth.draft_mode = true;
        let pass = ResolutionPass::new(Arc::new(ctx));

        let headers = pass.headers().await;
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer secret");
        assert_eq!(headers.get(DRAFT_MODE_HEADER).unwrap(), "true");
    }

    #[tokio::test]
    async fn test_token_path_and_missing_templates_file() {
        let dir = tempfile::tempdir().unwrap();
        let token = dir.path().join("token");
        std::fs::write(&token, "from-file\n").unwrap();

        let mut ctx = Arc::into_inner(context(Arc::new(FixtureTransport::new()))).unwrap();
        ctx.auth.token_path = Some(token);
        ctx.templates_file = Some(dir.path().join("missing.json"));
        let pass = ResolutionPass::new(Arc::new(ctx));

        assert_eq!(
            pass.headers().await.get(AUTHORIZATION).unwrap(),
            "Bearer from-file"
        );
        assert!(pass.headers().await.get(DRAFT_MODE_HEADER).is_none());
        assert_eq!(pass.templates().await.len(), 2);
    }

    #[tokio::test]
    async fn test_templates_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("templates.json");
        std::fs::write(
            &file,
            r#"[{"type": "taxonomy", "name": "category", "template": "single_any", "path": "/c/[slug]"}]"#,
        )
        .unwrap();

        let mut ctx = Arc::into_inner(context(Arc::new(FixtureTransport::new()))).unwrap();
        ctx.templates_file = Some(file);
        let pass = ResolutionPass::new(Arc::new(ctx));

        let templates = pass.templates().await;
        assert_eq!(templates.len(), 3);
        assert!(matches!(
            &templates[2],
            PageTemplate::Taxonomy { path, .. } if path == "/c/[slug]"
        ));
    }
}
