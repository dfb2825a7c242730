//! Request routing: map HTTP methods and URL paths to handler functions.
//!
//! This module provides [`Router`], which owns a [`RouteTable`], resolves
//! incoming requests through a [`Resolver`], and runs the matched handler
//! inside a request-scoped [`Context`]. Three path styles are supported:
//!
//! | Pattern              | Example match              | Captured params              |
//! |----------------------|----------------------------|------------------------------|
//! | `/users`             | `/users`                   | *(none)*                     |
//! | `/users/:id`         | `/users/42`                | `id → "42"`                  |
//! | `/files/*/raw`       | `/files/readme/raw`        | *(none)*                     |
//!
//! Literal paths are looked up directly and always beat templates. Templates
//! are matched segment by segment in registration order; the first template
//! whose method and shape both match the request wins. A wildcard matches
//! exactly one segment.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::context::{self, Context};
use crate::{Method, Request, Response, StatusCode};

mod handler;
pub mod pattern;
mod resolve;
mod table;

pub use handler::{BoxFuture, Effect, Handler, HandlerError, HandlerResult, handler};
pub use pattern::PathPattern;
pub use resolve::{MatchKind, Resolver, RouteMatch};
pub use table::{PatternRoute, RouteError, RouteTable};

/// Errors produced while dispatching one request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route for {method} {path}")]
    NoRoute { method: Method, path: String },

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),

    #[error("redirect location contains CR or LF: {location:?}")]
    InvalidLocation { location: String },

    #[error("redirect with non-3xx status {status}")]
    InvalidRedirectStatus { status: StatusCode },

    #[error("request forwarded more than {limit} times (last target {path})")]
    TooManyForwards { limit: usize, path: String },
}

/// HTTP request router that dispatches requests to registered handler functions.
///
/// Cloning a `Router` is cheap and every clone shares the same routes, so a
/// router can keep accepting registrations while server tasks resolve
/// requests against it.
///
/// # Examples
///
/// ```rust,no_run
/// use waymark::{Router, StatusCode};
/// use waymark::router::Effect;
///
/// let router = Router::new();
///
/// router.get("/ping", |_ctx| async { Ok(Effect::status(StatusCode::Ok)) }).unwrap();
///
/// router.get("/users/:id", |ctx| async move {
///     let id = ctx.param("id").unwrap_or("unknown").to_owned();
///     Ok(Effect::body(id))
/// }).unwrap();
///
/// router.alias(waymark::Method::Get, "/members/:id", "/users/:id").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
    resolver: Resolver,
    max_forwards: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new, empty `Router` with default configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use waymark::Router;
    ///
    /// let router = Router::new();
    /// assert!(router.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self::with_table(Arc::new(RouteTable::new()), config)
    }

    /// Build a router over an existing, possibly shared, route table.
    pub fn with_table(table: Arc<RouteTable>, config: &Config) -> Self {
        Self {
            resolver: Resolver::new(Arc::clone(&table)),
            table,
            max_forwards: config.max_forwards,
        }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Register a handler for `method` requests matching `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if `path` is empty or is a malformed template.
    pub fn route<H, F>(&self, method: Method, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.table.route(Some(method), path, handler::handler(handler))
    }

    /// Register a handler for any method matching `path`.
    ///
    /// Method-agnostic routes are only consulted after the method-specific
    /// routes of the same kind (exact or pattern) miss.
    pub fn any<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.table.route(None, path, handler::handler(handler))
    }

    /// Register a handler for `GET` requests matching `path`.
    pub fn get<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// Register a handler for `POST` requests matching `path`.
    ///
    /// A plain [`Effect::Body`] from this handler is sent as `201 Created`
    /// instead of `200 OK`. Every other effect keeps the status it names.
    pub fn post<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        let created = move |ctx: Context| {
            let effect = handler(ctx);
            async move { effect.await.map(|effect| effect.default_status(StatusCode::Created)) }
        };
        self.table.route(Some(Method::Post), path, handler::handler(created))
    }

    /// Register a handler for `PUT` requests matching `path`.
    pub fn put<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::Put, path, handler)
    }

    /// Register a handler for `DELETE` requests matching `path`.
    pub fn delete<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::Delete, path, handler)
    }

    /// Register a handler for `PATCH` requests matching `path`.
    pub fn patch<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::Patch, path, handler)
    }

    /// Register a handler for `HEAD` requests matching `path`.
    pub fn head<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::Head, path, handler)
    }

    /// Register a handler for `OPTIONS` requests matching `path`.
    pub fn options<H, F>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::Options, path, handler)
    }

    /// Register a route that always answers with the fixed text `body`.
    ///
    /// Goes through the same helper as the closure form, so a `POST` route
    /// answers `201 Created`.
    ///
    /// ```rust
    /// use waymark::{Method, Router};
    ///
    /// let router = Router::new();
    /// router.text(Method::Get, "/health", "ok").unwrap();
    /// router.text(Method::Post, "/jobs", "queued").unwrap();
    /// ```
    pub fn text(&self, method: Method, path: &str, body: impl Into<String>) -> Result<(), RouteError> {
        let body: Arc<str> = Arc::from(body.into());
        let respond = move |_ctx: Context| {
            let body = Arc::clone(&body);
            async move { Ok::<_, HandlerError>(Effect::body(&*body)) }
        };
        match method {
            Method::Post => self.post(path, respond),
            method => self.route(method, path, respond),
        }
    }

    /// Register `new_path` for `method` with the handler already registered
    /// under `target_path`.
    ///
    /// # Errors
    ///
    /// [`RouteError::UnknownMethod`] if nothing is registered for `method`,
    /// [`RouteError::UnknownTarget`] if `target_path` is not registered.
    pub fn alias(&self, method: Method, new_path: &str, target_path: &str) -> Result<(), RouteError> {
        self.table.alias(Some(method), new_path, target_path)
    }

    /// Set the handler used when no route matches.
    pub fn not_found<H, F>(&self, handler: H)
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        self.table.set_fallback(handler::handler(handler));
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Resolve `method` and `path` without running anything.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.resolver.resolve(method, path)
    }

    /// Dispatch `request` to its handler and apply the returned [`Effect`].
    ///
    /// The handler runs with a fresh [`Context`] bound to the current task;
    /// the binding is released when the handler finishes, whatever the
    /// outcome. A [`Effect::Forward`] re-resolves the same request against
    /// the target path and runs that handler in a new context.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NoRoute`] — nothing matched and no fallback is set.
    /// - [`DispatchError::Handler`] — the handler's own error, unmodified.
    /// - [`DispatchError::InvalidRedirectStatus`] — a redirect carries a non-3xx status.
    /// - [`DispatchError::InvalidLocation`] — a redirect target contains CR/LF.
    /// - [`DispatchError::TooManyForwards`] — the forward chain exceeded the limit.
    pub async fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        let request = Arc::new(request);
        let method = request.method().clone();
        let mut path = request.path().to_owned();
        let mut forwards = 0;

        loop {
            let matched = self
                .resolver
                .resolve(&method, &path)
                .ok_or_else(|| DispatchError::NoRoute {
                    method: method.clone(),
                    path: path.clone(),
                })?;

            debug!(%method, path = %path, kind = ?matched.kind, "dispatching request");
            let ctx = Context::new(Arc::clone(&request), path.as_str(), matched.params);
            let handler = matched.handler;
            // The handler call itself, not only its future, runs inside the binding.
            let effect = context::scope(ctx.clone(), async move { handler(ctx).await }).await?;

            match effect {
                Effect::Forward(target) => {
                    forwards += 1;
                    if forwards > self.max_forwards {
                        return Err(DispatchError::TooManyForwards {
                            limit: self.max_forwards,
                            path: target,
                        });
                    }
                    debug!(%method, from = %path, to = %target, "forwarding request");
                    path = target;
                }
                Effect::Redirect { status, location } => {
                    if !status.is_redirection() {
                        return Err(DispatchError::InvalidRedirectStatus { status });
                    }
                    if !handler::is_valid_location(&location) {
                        return Err(DispatchError::InvalidLocation { location });
                    }
                    return Ok(Response::new(status).header("Location", location));
                }
                Effect::Body(body) => return Ok(Response::new(StatusCode::Ok).body(body)),
                Effect::Status(status) => return Ok(Response::new(status)),
                Effect::Respond(response) => return Ok(response),
            }
        }
    }

    /// Dispatch `request` and turn any failure into an HTTP response.
    ///
    /// No route becomes `404 Not Found`; every other [`DispatchError`] is
    /// logged and becomes `500 Internal Server Error`.
    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(response) => {
                if response.status().is_error() {
                    debug!(status = response.status().as_u16(), "handler answered with an error status");
                }
                response
            }
            Err(DispatchError::NoRoute { method, path }) => {
                debug!(%method, path = %path, "no route — sending 404");
                Response::new(StatusCode::NotFound).body("Not Found")
            }
            Err(e @ (DispatchError::InvalidLocation { .. } | DispatchError::InvalidRedirectStatus { .. })) => {
                warn!(error = %e, "rejected redirect");
                Response::new(StatusCode::InternalServerError).body("Internal Server Error")
            }
            Err(e) => {
                error!(error = %e, "request dispatch failed");
                Response::new(StatusCode::InternalServerError).body("Internal Server Error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::http::request::Request;

    fn make_request(method: &str, path: &str) -> Request {
        let raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    fn body_of(response: &Response) -> &str {
        std::str::from_utf8(response.content()).unwrap()
    }

    // ── registration ──────────────────────────────────────────────────────────

    #[test]
    fn router_starts_empty() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn router_default_is_empty() {
        let router = Router::default();
        assert!(router.is_empty());
    }

    #[test]
    fn router_len_counts_exact_and_pattern_routes() {
        let router = Router::new();
        router.get("/a", |_ctx| async { Ok(Effect::body("a")) }).unwrap();
        router.post("/b/:id", |_ctx| async { Ok(Effect::body("b")) }).unwrap();
        assert_eq!(router.len(), 2);
        assert!(!router.is_empty());
    }

    #[test]
    fn clones_share_routes() {
        let router = Router::new();
        let clone = router.clone();
        clone.get("/late", |_ctx| async { Ok(Effect::body("late")) }).unwrap();
        assert!(router.resolve(&Method::Get, "/late").is_some());
    }

    #[test]
    fn malformed_template_rejected() {
        let router = Router::new();
        let err = router
            .get("/a/:id/b/:id", |_ctx| async { Ok(Effect::body("")) })
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateParameter { .. }));
        assert!(router.is_empty());
    }

    // ── dispatch ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn router_empty_returns_404() {
        let router = Router::new();
        let res = router.handle(make_request("GET", "/")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn dispatch_without_fallback_reports_no_route() {
        let router = Router::new();
        let err = router.dispatch(make_request("GET", "/nowhere")).await.unwrap_err();
        match err {
            DispatchError::NoRoute { method, path } => {
                assert_eq!(method, Method::Get);
                assert_eq!(path, "/nowhere");
            }
            other => panic!("expected NoRoute, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn router_get_matches() {
        let router = Router::new();
        router.get("/hello", |_ctx| async { Ok(Effect::body("hi")) }).unwrap();
        let res = router.handle(make_request("GET", "/hello")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(body_of(&res), "hi");
    }

    #[tokio::test]
    async fn router_get_does_not_match_post() {
        let router = Router::new();
        router.get("/hello", |_ctx| async { Ok(Effect::body("hi")) }).unwrap();
        let res = router.handle(make_request("POST", "/hello")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn any_route_catches_other_methods() {
        let router = Router::new();
        router.get("/hello", |_ctx| async { Ok(Effect::body("get")) }).unwrap();
        router.any("/hello", |_ctx| async { Ok(Effect::body("any")) }).unwrap();
        let get = router.handle(make_request("GET", "/hello")).await;
        let post = router.handle(make_request("POST", "/hello")).await;
        assert_eq!(body_of(&get), "get");
        assert_eq!(body_of(&post), "any");
    }

    #[tokio::test]
    async fn parameterized_route_receives_params() {
        let router = Router::new();
        router
            .get("/users/:id", |ctx| async move {
                let id = ctx.param("id").unwrap_or("").to_owned();
                Ok(Effect::body(id))
            })
            .unwrap();
        let res = router.handle(make_request("GET", "/users/42")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(body_of(&res), "42");
    }

    #[tokio::test]
    async fn task_bound_context_matches_handler_argument() {
        let router = Router::new();
        router
            .get("/users/:id", |ctx| async move {
                let bound = match context::param("id") {
                    Ok(bound) => bound,
                    Err(e) => return Err(HandlerError::from(e)),
                };
                assert_eq!(bound.as_deref(), ctx.param("id"));
                Ok(Effect::body(bound.unwrap_or_default()))
            })
            .unwrap();
        let res = router.handle(make_request("GET", "/users/9")).await;
        assert_eq!(body_of(&res), "9");
        assert!(context::current().is_err());
    }

    #[tokio::test]
    async fn param_falls_back_to_query() {
        let router = Router::new();
        router
            .get("/search", |ctx| async move {
                Ok(Effect::body(ctx.param("q").unwrap_or("-").to_owned()))
            })
            .unwrap();
        let res = router.handle(make_request("GET", "/search?q=rust")).await;
        assert_eq!(body_of(&res), "rust");
    }

    #[tokio::test]
    async fn custom_not_found_handler() {
        let router = Router::new();
        router.not_found(|ctx| async move {
            let body = format!("missing {}", ctx.path());
            Ok(Effect::from(Response::new(StatusCode::NotFound).body(body)))
        });
        let res = router.handle(make_request("GET", "/nope")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
        assert_eq!(body_of(&res), "missing /nope");
    }

    #[tokio::test]
    async fn handler_error_propagates_unmodified() {
        let router = Router::new();
        router
            .get("/boom", |_ctx| async { Err(HandlerError::msg("exploded")) })
            .unwrap();
        let err = router.dispatch(make_request("GET", "/boom")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler(HandlerError::Message(ref m)) if m == "exploded"));

        let res = router.handle(make_request("GET", "/boom")).await;
        assert_eq!(res.status(), StatusCode::InternalServerError);
    }

    #[tokio::test]
    async fn status_effect() {
        let router = Router::new();
        router
            .delete("/items/:id", |_ctx| async { Ok(Effect::status(StatusCode::NoContent)) })
            .unwrap();
        let res = router.handle(make_request("DELETE", "/items/1")).await;
        assert_eq!(res.status(), StatusCode::NoContent);
        assert!(res.content().is_empty());
    }

    #[tokio::test]
    async fn redirect_effect_sets_location() {
        let router = Router::new();
        router
            .get("/old", |_ctx| async { Ok(Effect::moved_permanently("/new")) })
            .unwrap();
        let res = router.handle(make_request("GET", "/old")).await;
        assert_eq!(res.status(), StatusCode::MovedPermanently);
        assert_eq!(res.headers().get("location"), Some("/new"));
    }

    #[tokio::test]
    async fn redirect_with_crlf_is_rejected() {
        let router = Router::new();
        router
            .get("/evil", |_ctx| async { Ok(Effect::redirect("/x\r\nSet-Cookie: a=b")) })
            .unwrap();
        let err = router.dispatch(make_request("GET", "/evil")).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidLocation { .. }));
        let res = router.handle(make_request("GET", "/evil")).await;
        assert_eq!(res.status(), StatusCode::InternalServerError);
        assert!(res.headers().get("location").is_none());
    }

    #[tokio::test]
    async fn forward_runs_target_with_fresh_params() {
        let router = Router::new();
        router
            .get("/profile/:name", |ctx| async move {
                let id = ctx.params().get("id").map(str::to_owned);
                Ok(Effect::body(format!(
                    "{}:{}:{}",
                    ctx.path(),
                    ctx.param("name").unwrap_or(""),
                    id.unwrap_or_default()
                )))
            })
            .unwrap();
        router
            .get("/u/:id", |ctx| async move {
                Ok(Effect::forward(format!("/profile/user{}", ctx.param("id").unwrap_or(""))))
            })
            .unwrap();

        let res = router.handle(make_request("GET", "/u/5")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(body_of(&res), "/profile/user5:user5:");
    }

    #[tokio::test]
    async fn forward_loop_is_bounded() {
        let config = Config {
            max_forwards: 3,
            ..Config::default()
        };
        let router = Router::with_config(&config);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        router
            .get("/loop", move |_ctx| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Effect::forward("/loop"))
                }
            })
            .unwrap();

        let err = router.dispatch(make_request("GET", "/loop")).await.unwrap_err();
        assert!(matches!(err, DispatchError::TooManyForwards { limit: 3, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn alias_dispatches_to_original_handler() {
        let router = Router::new();
        router
            .get("/orig/:id", |ctx| async move {
                Ok(Effect::body(ctx.param("id").unwrap_or("").to_owned()))
            })
            .unwrap();
        router.alias(Method::Get, "/alias/:id", "/orig/:id").unwrap();
        let res = router.handle(make_request("GET", "/alias/7")).await;
        assert_eq!(body_of(&res), "7");
    }

    #[tokio::test]
    async fn respond_effect_passes_response_through() {
        let router = Router::new();
        router
            .post("/items", |_ctx| async {
                Ok(Effect::from(
                    Response::new(StatusCode::Created)
                        .header("X-Item", "1")
                        .body("created"),
                ))
            })
            .unwrap();
        let res = router.handle(make_request("POST", "/items")).await;
        assert_eq!(res.status(), StatusCode::Created);
        assert_eq!(res.headers().get("x-item"), Some("1"));
    }

    #[tokio::test]
    async fn handler_prologue_sees_bound_context() {
        let router = Router::new();
        router
            .get("/u/:id", |_ctx| {
                let bound = context::is_bound();
                let id = context::param("id").ok().flatten();
                async move {
                    let answer = if bound { "bound" } else { "unbound" };
                    Ok(Effect::body(format!("{answer}:{}", id.unwrap_or_default())))
                }
            })
            .unwrap();
        let res = router.handle(make_request("GET", "/u/1")).await;
        assert_eq!(body_of(&res), "bound:1");
        assert!(!context::is_bound());
    }

    #[tokio::test]
    async fn post_body_defaults_to_created() {
        let router = Router::new();
        router
            .post("/items", |_ctx| async { Ok(Effect::body("made")) })
            .unwrap();
        router
            .post("/items/:id/touch", |_ctx| async { Ok(Effect::status(StatusCode::NoContent)) })
            .unwrap();
        router
            .route(Method::Post, "/raw", |_ctx| async { Ok(Effect::body("raw")) })
            .unwrap();

        let made = router.handle(make_request("POST", "/items")).await;
        assert_eq!(made.status(), StatusCode::Created);
        assert_eq!(body_of(&made), "made");

        let touched = router.handle(make_request("POST", "/items/3/touch")).await;
        assert_eq!(touched.status(), StatusCode::NoContent);

        let raw = router.handle(make_request("POST", "/raw")).await;
        assert_eq!(raw.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn fixed_text_routes() {
        let router = Router::new();
        router.text(Method::Get, "/health", "ok").unwrap();
        router.text(Method::Post, "/jobs", "queued").unwrap();
        router.text(Method::Put, "/jobs/:id", "replaced").unwrap();
        router.text(Method::Delete, "/jobs/:id", "gone").unwrap();
        router.text(Method::Patch, "/jobs/:id", "patched").unwrap();

        let health = router.handle(make_request("GET", "/health")).await;
        assert_eq!(health.status(), StatusCode::Ok);
        assert_eq!(body_of(&health), "ok");

        let queued = router.handle(make_request("POST", "/jobs")).await;
        assert_eq!(queued.status(), StatusCode::Created);
        assert_eq!(body_of(&queued), "queued");

        for (method, expected) in [("PUT", "replaced"), ("DELETE", "gone"), ("PATCH", "patched")] {
            let res = router.handle(make_request(method, "/jobs/9")).await;
            assert_eq!(res.status(), StatusCode::Ok);
            assert_eq!(body_of(&res), expected);
        }
    }

    #[tokio::test]
    async fn redirect_with_non_redirect_status_is_rejected() {
        let router = Router::new();
        router
            .get("/odd", |_ctx| async { Ok(Effect::redirect_with(StatusCode::Ok, "/x")) })
            .unwrap();
        let err = router.dispatch(make_request("GET", "/odd")).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidRedirectStatus { status: StatusCode::Ok }
        ));
    }

    #[tokio::test]
    async fn extension_method_routes() {
        let router = Router::new();
        let purge = Method::Custom("PURGE".to_owned());
        router
            .route(purge.clone(), "/cache/:key", |ctx| async move {
                Ok(Effect::body(format!("purged {}", ctx.param("key").unwrap_or(""))))
            })
            .unwrap();
        let res = router.handle(make_request("PURGE", "/cache/home")).await;
        assert_eq!(body_of(&res), "purged home");
        assert!(router.resolve(&Method::Get, "/cache/home").is_none());
        assert!(router.resolve(&purge, "/cache/home").is_some());
    }

    #[tokio::test]
    async fn method_variants_registered() {
        let router = Router::new();
        router.put("/r", |_ctx| async { Ok(Effect::body("put")) }).unwrap();
        router.delete("/r", |_ctx| async { Ok(Effect::body("delete")) }).unwrap();
        router.patch("/r", |_ctx| async { Ok(Effect::body("patch")) }).unwrap();
        router.options("/r", |_ctx| async { Ok(Effect::body("options")) }).unwrap();
        router.head("/r", |_ctx| async { Ok(Effect::status(StatusCode::Ok)) }).unwrap();
        assert_eq!(router.len(), 5);
        for (method, expected) in [
            ("PUT", "put"),
            ("DELETE", "delete"),
            ("PATCH", "patch"),
            ("OPTIONS", "options"),
        ] {
            let res = router.handle(make_request(method, "/r")).await;
            assert_eq!(body_of(&res), expected);
        }
        let head = router.handle(make_request("HEAD", "/r")).await;
        assert_eq!(head.status(), StatusCode::Ok);
    }
}
