//! # waymark
//!
//! A request-routing engine for async HTTP/1.1 services.
//!
//! Routes map an HTTP method and a path template (`/users/:id`, `/files/*/raw`)
//! to an async handler. Literal paths resolve through a hash index, templates
//! are tried in registration order, and a fallback catches everything else.
//! While a handler runs, its request, method and captured parameters are
//! available from [`context`] without being passed around explicitly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waymark::{Router, Server};
//! use waymark::router::Effect;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new();
//!     router.get("/", |_ctx| async { Ok(Effect::body("Hello, World!")) })?;
//!     router.get("/users/:id", |ctx| async move {
//!         Ok(Effect::body(format!("user {}", ctx.param("id").unwrap_or("?"))))
//!     })?;
//!
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     println!("Listening on http://127.0.0.1:8080");
//!     server.serve(router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod http;
pub mod router;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{Config, ConfigError};
pub use context::{Context, ContextError, PathParams};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::{DispatchError, Effect, HandlerError, HandlerResult, RouteError, Router};
pub use server::{Server, ServerError};
