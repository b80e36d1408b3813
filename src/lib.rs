//! # ruta
//!
//! An ordered, Express-style request router and middleware dispatcher.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! ruta is the dispatch core, not the whole stack. hyper parses the wire,
//! the reverse proxy in front of you does proxy things, and ruta decides
//! exactly one question: *which handlers run for this request, in what
//! order, and who gets to stop the music.* What that buys you:
//!
//! - **Ordered matching** — one flat registration stack; the earliest
//!   matching entry always wins. No specificity scoring to reason about.
//! - **Handler chains** — a route owns an ordered chain; each handler
//!   continues, skips the rest of the route, responds, or fails. The
//!   context is threaded by value, so a handler that forgets to signal is
//!   a compile error, not a hung request.
//! - **Expressive patterns** — `:name` parameters, `:name(regex)`
//!   constraints, compound `:from-:to` segments, raw regex routes. All
//!   compiled once at registration.
//! - **Mounting** — routers nest under path prefixes; the child's
//!   middleware and routes run before the scan falls through to siblings.
//! - **Error routing** — a failing handler jumps to the nearest `catch`
//!   chain, bubbling outward through mounts.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ruta::{Context, Flow, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ruta::Error> {
//!     let app = Router::new()
//!         .middleware(ruta::middleware::log)
//!         .get("/users/:id", get_user)?
//!         .get(r"/user/:id(\d+)", get_user_strict)?;
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(ctx: Context) -> Response {
//!     let id = ctx.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn get_user_strict(ctx: Context) -> Flow {
//!     // `:id(\d+)` already guaranteed digits; veto zero and let the
//!     // scan move on to the next matching registration.
//!     if ctx.param("id") == Some("0") {
//!         return ctx.skip_route();
//!     }
//!     Flow::Respond(Response::text("regular"))
//! }
//! ```

mod context;
mod error;
mod flow;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;

pub use context::Context;
pub use error::Error;
pub use flow::{Flow, IntoFlow};
pub use handler::{ErrorHandler, Handler, Handlers};
pub use method::Method;
pub use pattern::{IntoPattern, Pattern};
pub use request::Request;
pub use response::{ContentType, Response, ResponseBuilder};
pub use router::{Dispatch, RouteScope, Router};
pub use server::Server;
