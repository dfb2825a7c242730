//! Handler signature, handler errors, and the response effects handlers return.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::context::{Context, ContextError};
use crate::{Response, StatusCode};

/// Boxed, `Send` future returned by every [`Handler`].
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// What a handler produces: an [`Effect`] to apply, or an error to propagate.
pub type HandlerResult = Result<Effect, HandlerError>;

/// Type-erased, heap-allocated async handler that processes a [`Context`] and
/// returns an [`Effect`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be shared between
/// routes (aliases reuse the same `Arc`) and across threads without copying
/// the underlying closure. Build one with [`handler`] or let the
/// [`Router`](super::Router) helpers do it.
pub type Handler = Arc<dyn Fn(Context) -> BoxFuture<HandlerResult> + Send + Sync + 'static>;

/// Erase the concrete type of an async handler function.
///
/// # Examples
///
/// ```rust
/// use waymark::router::{handler, Effect, Handler};
///
/// let h: Handler = handler(|_ctx| async { Ok(Effect::body("pong")) });
/// ```
pub fn handler<H, F>(f: H) -> Handler
where
    H: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Failures raised by handler code.
///
/// They travel through the route table and resolver untouched and surface as
/// [`DispatchError::Handler`](super::DispatchError::Handler).
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl HandlerError {
    /// A plain error message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap any error type.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(err))
    }
}

/// The outcome of a handler, applied by the router after the handler returns.
///
/// A closed set: the router turns each variant into a response (or a second
/// dispatch, for [`Effect::Forward`]) in a single `match`.
#[derive(Debug)]
pub enum Effect {
    /// Dispatch the same request to another path, with fresh path parameters.
    Forward(String),
    /// Reply with `status` and a `Location` header.
    Redirect { status: StatusCode, location: String },
    /// Reply `200 OK` with a text body.
    Body(String),
    /// Reply with an empty body and the given status.
    Status(StatusCode),
    /// Reply with a fully built response.
    Respond(Response),
}

impl Effect {
    pub fn forward(path: impl Into<String>) -> Self {
        Self::Forward(path.into())
    }

    /// `302 Found` redirect.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::redirect_with(StatusCode::Found, location)
    }

    /// `301 Moved Permanently` redirect.
    pub fn moved_permanently(location: impl Into<String>) -> Self {
        Self::redirect_with(StatusCode::MovedPermanently, location)
    }

    pub fn redirect_with(status: StatusCode, location: impl Into<String>) -> Self {
        Self::Redirect {
            status,
            location: location.into(),
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self::Body(body.into())
    }

    pub fn status(status: StatusCode) -> Self {
        Self::Status(status)
    }
}

impl Effect {
    /// Send a bare [`Effect::Body`] with `status` instead of `200 OK`.
    pub(crate) fn default_status(self, status: StatusCode) -> Self {
        match self {
            Self::Body(body) => Self::Respond(Response::new(status).body(body)),
            other => other,
        }
    }
}

impl From<Response> for Effect {
    fn from(response: Response) -> Self {
        Self::Respond(response)
    }
}

impl From<StatusCode> for Effect {
    fn from(status: StatusCode) -> Self {
        Self::Status(status)
    }
}

/// Rejects redirect targets that would split the response header block.
pub(crate) fn is_valid_location(location: &str) -> bool {
    !location.contains(['\r', '\n'])
}
