//! Built-in middleware.
//!
//! Middleware is just a handler that usually ends with
//! [`ctx.next()`](crate::Context::next) — the right place for cross-cutting
//! concerns: request logging, timestamps, request-id injection,
//! authentication-header inspection. Register with
//! [`Router::middleware`](crate::Router::middleware) (every request) or
//! [`Router::middleware_at`](crate::Router::middleware_at) (a path scope).
//!
//! Two small ones ship in the box:
//!
//! ```rust,no_run
//! use ruta::{middleware, Context, Response, Router};
//!
//! async fn home(ctx: Context) -> Response {
//!     let at = ctx.local(middleware::REQUEST_TIME_MS).unwrap_or("unknown");
//!     Response::html(format!("Hello world<br/><small>Requested at: {at}</small>"))
//! }
//!
//! # fn main() -> Result<(), ruta::Error> {
//! let app = Router::new()
//!     .middleware((middleware::log, middleware::request_time))
//!     .get("/", home)?;
//! # Ok(()) }
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::context::Context;
use crate::flow::Flow;

/// Locals key under which [`request_time`] stores its timestamp.
pub const REQUEST_TIME_MS: &str = "request_time_ms";

/// Logs one structured line per request, then continues.
pub async fn log(ctx: Context) -> Flow {
    info!(method = %ctx.method(), path = ctx.original_path(), "request");
    ctx.next()
}

/// Stamps the context with the wall-clock arrival time, in milliseconds
/// since the Unix epoch, under [`REQUEST_TIME_MS`]. Later handlers read it
/// with [`Context::local`].
pub async fn request_time(mut ctx: Context) -> Flow {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    ctx.set_local(REQUEST_TIME_MS, now.to_string());
    ctx.next()
}
