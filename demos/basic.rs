//! Routing tour — patterns, chains, and the `route()` builder.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/users/42/books/7
//!   curl http://localhost:3000/flights/LAX-JFK
//!   curl http://localhost:3000/user/123        # matches :userId(\d+)
//!   curl http://localhost:3000/user/abc        # falls through → 404
//!   curl http://localhost:3000/example/c
//!   curl -X POST http://localhost:3000/book

use ruta::{middleware, Context, Flow, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), ruta::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .middleware(middleware::log)
        .get("/", home)?
        .get("/about", about)?
        .get("/users/:userId/books/:bookId", params_echo)?
        .get("/flights/:from-:to", params_echo)?
        .get(r"/user/:userId(\d+)", params_echo)?
        // two-step chain: the first handler defers to the second
        .get("/example/b", (announce, hello_b))?
        // a flat chain of three
        .get("/example/c", (cb0, cb1, cb2))?
        // nested chains flatten in order: cb0, cb1, announce, hello_d
        .get("/example/d", ((cb0, cb1), announce, hello_d))?
        // per-method registration on one pattern
        .route("/book")?
        .get(get_book)
        .post(add_book)
        .put(update_book)
        .done();

    Server::bind("0.0.0.0:3000").serve(app).await
}

async fn home(_ctx: Context) -> Response {
    Response::html("<h1>GET route</h1>")
}

async fn about(_ctx: Context) -> Response {
    Response::text("/about")
}

/// Echoes whatever the matched pattern captured.
async fn params_echo(ctx: Context) -> Response {
    let mut pairs: Vec<String> = ctx
        .params()
        .iter()
        .map(|(k, v)| format!(r#""{k}":"{v}""#))
        .collect();
    pairs.sort();
    Response::json(format!("{{{}}}", pairs.join(",")).into_bytes())
}

async fn announce(ctx: Context) -> Flow {
    tracing::info!("the response will be sent by the next function...");
    ctx.next()
}

async fn hello_b(_ctx: Context) -> Response {
    Response::text("Hello from b")
}

async fn cb0(ctx: Context) -> Flow {
    tracing::info!("CB0");
    ctx.next()
}

async fn cb1(ctx: Context) -> Flow {
    tracing::info!("CB1");
    ctx.next()
}

async fn cb2(_ctx: Context) -> Response {
    Response::text("Hello from c")
}

async fn hello_d(_ctx: Context) -> Response {
    Response::text("Hello from D")
}

async fn get_book(_ctx: Context) -> Response {
    Response::text("Get a random book")
}

async fn add_book(_ctx: Context) -> Response {
    Response::text("Add a book")
}

async fn update_book(_ctx: Context) -> Response {
    Response::text("Update the book")
}
