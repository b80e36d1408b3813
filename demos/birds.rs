//! Mounted sub-router and skip-to-next-route control flow.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example birds
//!
//! Try:
//!   curl http://localhost:3000/birds            # Birds home page
//!   curl http://localhost:3000/birds/about      # About birds
//!   curl http://localhost:3000/user/7           # regular
//!   curl http://localhost:3000/user/0           # special — skipped route

use ruta::{middleware, Context, Flow, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), ruta::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .middleware(middleware::request_time)
        // middleware scoped to a pattern prefix; binds `id` for its own chain
        .middleware_at("/user/:id", log_request_kind)?
        // first registration: veto id 0, otherwise answer "regular"
        .get("/user/:id", (gate_zero, regular))?
        // second registration for the same pattern: only reached via skip_route
        .get("/user/:id", special)?
        .mount("/birds", birds());

    Server::bind("0.0.0.0:3000").serve(app).await
}

/// The sub-router: its own middleware, then its own routes, all relative
/// to wherever it gets mounted.
fn birds() -> Router {
    Router::new()
        .middleware(middleware::log)
        .get("/", |_ctx: Context| async { Response::html("Birds home page") })
        .expect("static route")
        .get("/about", |_ctx: Context| async { Response::html("About birds") })
        .expect("static route")
}

async fn log_request_kind(ctx: Context) -> Flow {
    tracing::info!(method = %ctx.method(), id = ctx.param("id").unwrap_or("?"), "user request");
    ctx.next()
}

/// If the user id is 0, skip to the next route; otherwise pass control to
/// the next handler in this chain.
async fn gate_zero(ctx: Context) -> Flow {
    if ctx.param("id") == Some("0") {
        ctx.skip_route()
    } else {
        ctx.next()
    }
}

async fn regular(_ctx: Context) -> Response {
    Response::text("regular")
}

async fn special(_ctx: Context) -> Response {
    Response::text("special")
}
