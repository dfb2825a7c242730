//! Per-request context: path parameters and request data for the handler being run.
//!
//! A [`Context`] is created by the router for every dispatch and handed to the
//! handler by value. The same context is also bound to the running task for
//! the lifetime of the handler future, so code deeper in the call graph can
//! reach it through [`current`] or [`param`] without threading it through
//! every signature.
//!
//! The binding is scoped: it exists only while the handler future is being
//! polled and is removed when that future completes, returns an error, panics,
//! or is dropped. Outside of a dispatch the free functions fail with
//! [`ContextError::NoActiveRequest`].
//!
//! ```rust,no_run
//! use waymark::context;
//!
//! fn audit_user() -> Result<(), context::ContextError> {
//!     // Works anywhere inside a running handler.
//!     let id = context::param("id")?.unwrap_or_default();
//!     tracing::info!(user = %id, "audited");
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::http::{Method, Request};

tokio::task_local! {
    static CURRENT: Context;
}

/// Errors raised when reading the task-bound context.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("no request is bound to the current task")]
    NoActiveRequest,
}

/// Path parameters extracted from the matched route.
///
/// Keys are unique; iteration order is unspecified.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PathParams {
    map: HashMap<String, String>,
}

impl PathParams {
    /// Create a new empty parameters map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a value, replacing any previous value under the same name
    pub fn insert(&mut self, key: String, value: String) {
        self.map.insert(key, value);
    }

    /// Get a value from the parameters map
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for PathParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    request: Arc<Request>,
    path: String,
    params: PathParams,
}

/// The context of one in-flight request.
///
/// Cheap to clone; all clones share the same request and parameters.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Create a context for `request` dispatched to `path` with the resolved
    /// path parameters.
    ///
    /// `path` differs from `request.path()` when the request was forwarded.
    pub fn new(request: Arc<Request>, path: impl Into<String>, params: PathParams) -> Self {
        Self {
            inner: Arc::new(Inner {
                request,
                path: path.into(),
                params,
            }),
        }
    }

    /// HTTP method of the request.
    pub fn method(&self) -> &Method {
        self.inner.request.method()
    }

    /// The path this context was dispatched to.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    /// Path parameters captured by the matched route.
    pub fn params(&self) -> &PathParams {
        &self.inner.params
    }

    /// Look up a parameter by name.
    ///
    /// Path parameters win; otherwise the request's own query and form
    /// parameters are consulted.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.inner
            .params
            .get(name)
            .or_else(|| self.inner.request.param(name))
    }

    /// Query string parameter by name.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.inner.request.query_param(name)
    }

    /// Request header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.request.headers().get(name)
    }

    /// Deserialize the request body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(self.inner.request.body())
    }
}

/// Run `future` with `ctx` bound as the current request context.
///
/// The binding is released when `future` finishes, on every exit path.
pub async fn scope<F>(ctx: Context, future: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, future).await
}

/// The context bound to the current task.
///
/// # Errors
///
/// [`ContextError::NoActiveRequest`] when called outside a dispatched handler.
pub fn current() -> Result<Context, ContextError> {
    CURRENT
        .try_with(Context::clone)
        .map_err(|_| ContextError::NoActiveRequest)
}

/// Returns `true` if a request context is bound to the current task.
pub fn is_bound() -> bool {
    CURRENT.try_with(|_| ()).is_ok()
}

/// Parameter lookup on the current context, see [`Context::param`].
///
/// `Ok(None)` means the request is bound but carries no such parameter.
pub fn param(name: &str) -> Result<Option<String>, ContextError> {
    CURRENT
        .try_with(|ctx| ctx.param(name).map(str::to_owned))
        .map_err(|_| ContextError::NoActiveRequest)
}

/// HTTP method of the current request.
pub fn method() -> Result<Method, ContextError> {
    CURRENT
        .try_with(|ctx| ctx.method().clone())
        .map_err(|_| ContextError::NoActiveRequest)
}

/// Path of the current request.
pub fn path() -> Result<String, ContextError> {
    CURRENT
        .try_with(|ctx| ctx.path().to_owned())
        .map_err(|_| ContextError::NoActiveRequest)
}
