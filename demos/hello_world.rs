//! Minimal waymark service.
//!
//! ```text
//! RUST_LOG=waymark=debug cargo run --example hello_world
//! curl localhost:8080/users/42
//! curl -i localhost:8080/old/42
//! ```

use tracing_subscriber::EnvFilter;
use waymark::router::Effect;
use waymark::{Config, HandlerError, Method, Router, Server, StatusCode, context};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let router = Router::with_config(&config);

    router.get("/", |_ctx| async { Ok(Effect::body("Hello, World!")) })?;
    router.text(Method::Get, "/health", "ok")?;

    router.get("/users/:id", |ctx| async move {
        Ok(Effect::body(format!("user {}", ctx.param("id").unwrap_or("?"))))
    })?;
    router.alias(Method::Get, "/members/:id", "/users/:id")?;

    // Reads the parameter from the task-bound context instead of the argument.
    router.get("/files/*/owner/:name", |_ctx| async {
        match context::param("name") {
            Ok(name) => Ok(Effect::body(name.unwrap_or_default())),
            Err(e) => Err(HandlerError::from(e)),
        }
    })?;

    router.get("/old/:id", |ctx| async move {
        Ok(Effect::moved_permanently(format!(
            "/users/{}",
            ctx.param("id").unwrap_or("")
        )))
    })?;

    router.get("/home", |_ctx| async { Ok(Effect::forward("/")) })?;

    router.not_found(|ctx| async move {
        tracing::info!(path = %ctx.path(), "unmatched request");
        Ok(Effect::status(StatusCode::NotFound))
    });

    let server = Server::bind_with("127.0.0.1:8080", config).await?;
    println!("Listening on http://{}", server.local_addr());
    server.serve(router).await?;
    Ok(())
}
