//! End-to-end dispatch semantics, driven through `Router::dispatch` the
//! same way the server collaborator drives it.

use std::sync::{Arc, Mutex};

use http::StatusCode;
use regex::Regex;
use ruta::{middleware, Context, Dispatch, Error, Flow, Method, Request, Response, Router};

/// Shared execution log for asserting handler order.
type Log = Arc<Mutex<Vec<&'static str>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

type BoxedFlow = std::pin::Pin<Box<dyn std::future::Future<Output = Flow> + Send>>;

/// A middleware-style closure that records `name` and continues.
fn recorder(log: &Log, name: &'static str) -> impl Fn(Context) -> BoxedFlow + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |ctx: Context| -> BoxedFlow {
        let log = Arc::clone(&log);
        Box::pin(async move {
            log.lock().unwrap().push(name);
            ctx.next()
        })
    }
}

async fn get(router: &Router, path: &str) -> Result<Dispatch, Error> {
    router.dispatch(Request::new(Method::Get, path)).await
}

fn body_of(dispatch: Dispatch) -> String {
    match dispatch {
        Dispatch::Response(res) => String::from_utf8(res.body().to_vec()).unwrap(),
        Dispatch::Unhandled => panic!("expected a response, request was unhandled"),
    }
}

// ── Matching and precedence ───────────────────────────────────────────────────

#[tokio::test]
async fn single_match_runs_that_registrations_chain() {
    let app = Router::new()
        .get("/about", |_: Context| async { Response::text("/about") })
        .unwrap();

    assert_eq!(body_of(get(&app, "/about").await.unwrap()), "/about");
}

#[tokio::test]
async fn earlier_registration_wins() {
    let app = Router::new()
        .get("/users/:id", |_: Context| async { Response::text("first") })
        .unwrap()
        .get("/users/42", |_: Context| async { Response::text("second") })
        .unwrap();

    // Both patterns match; registration order decides, not specificity.
    assert_eq!(body_of(get(&app, "/users/42").await.unwrap()), "first");
}

#[tokio::test]
async fn method_mismatch_is_unhandled() {
    let app = Router::new()
        .get("/users", |_: Context| async { Response::text("list") })
        .unwrap();

    let out = app.dispatch(Request::new(Method::Post, "/users")).await.unwrap();
    assert!(matches!(out, Dispatch::Unhandled));
}

#[tokio::test]
async fn wildcard_method_matches_anything() {
    let app = Router::new()
        .all("/secret", |_: Context| async { Response::text("any") })
        .unwrap();

    for method in [Method::Get, Method::Post, Method::Delete] {
        let out = app.dispatch(Request::new(method, "/secret")).await.unwrap();
        assert_eq!(body_of(out), "any");
    }
}

#[tokio::test]
async fn no_match_is_unhandled() {
    let app = Router::new()
        .get("/", |_: Context| async { Response::text("home") })
        .unwrap();

    let out = get(&app, "/nonexistent").await.unwrap();
    assert!(matches!(out, Dispatch::Unhandled));
}

#[tokio::test]
async fn raw_regex_matches_by_search() {
    let app = Router::new()
        .get(Regex::new("a").unwrap(), |_: Context| async { Response::text("/a/") })
        .unwrap();

    assert_eq!(body_of(get(&app, "/random").await.unwrap()), "/a/");
    assert!(matches!(get(&app, "/book").await.unwrap(), Dispatch::Unhandled));
}

// ── Parameter extraction ──────────────────────────────────────────────────────

#[tokio::test]
async fn named_params_bind_by_name() {
    let app = Router::new()
        .get("/users/:userId/books/:bookId", |ctx: Context| async move {
            Response::text(format!(
                "{}/{}",
                ctx.param("userId").unwrap(),
                ctx.param("bookId").unwrap(),
            ))
        })
        .unwrap();

    assert_eq!(body_of(get(&app, "/users/42/books/7").await.unwrap()), "42/7");
}

#[tokio::test]
async fn compound_segment_binds_both_params() {
    let app = Router::new()
        .get("/flights/:from-:to", |ctx: Context| async move {
            Response::text(format!(
                "{}>{}",
                ctx.param("from").unwrap(),
                ctx.param("to").unwrap(),
            ))
        })
        .unwrap();

    assert_eq!(body_of(get(&app, "/flights/LAX-JFK").await.unwrap()), "LAX>JFK");
}

#[tokio::test]
async fn regex_constraint_fails_the_match_not_the_request() {
    let app = Router::new()
        .get(r"/user/:userId(\d+)", |ctx: Context| async move {
            Response::text(format!("digits:{}", ctx.param("userId").unwrap()))
        })
        .unwrap()
        .get("/user/:userId", |ctx: Context| async move {
            Response::text(format!("fallback:{}", ctx.param("userId").unwrap()))
        })
        .unwrap();

    assert_eq!(body_of(get(&app, "/user/123").await.unwrap()), "digits:123");
    // Constraint fails → that registration is non-matching, scan continues.
    assert_eq!(body_of(get(&app, "/user/abc").await.unwrap()), "fallback:abc");
}

#[tokio::test]
async fn unmatched_constraint_without_fallback_is_unhandled() {
    let app = Router::new()
        .get(r"/user/:userId(\d+)", |_: Context| async { Response::text("digits") })
        .unwrap();

    assert!(matches!(get(&app, "/user/abc").await.unwrap(), Dispatch::Unhandled));
}

// ── Chains ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tuple_chain_runs_in_order() {
    let log = new_log();
    let finish = |_: Context| async { Response::text("Hello from c") };

    let app = Router::new()
        .get("/example/c", (recorder(&log, "cb0"), recorder(&log, "cb1"), finish))
        .unwrap();

    assert_eq!(body_of(get(&app, "/example/c").await.unwrap()), "Hello from c");
    assert_eq!(entries(&log), ["cb0", "cb1"]);
}

#[tokio::test]
async fn nested_tuples_flatten_in_order() {
    let log = new_log();
    let finish = |_: Context| async { Response::text("Hello from D") };

    let app = Router::new()
        .get(
            "/example/d",
            ((recorder(&log, "cb0"), recorder(&log, "cb1")), recorder(&log, "cb2"), finish),
        )
        .unwrap();

    assert_eq!(body_of(get(&app, "/example/d").await.unwrap()), "Hello from D");
    assert_eq!(entries(&log), ["cb0", "cb1", "cb2"]);
}

#[tokio::test]
async fn exhausted_chain_falls_through_to_next_registration() {
    let log = new_log();

    let app = Router::new()
        .get("/user/:id", recorder(&log, "first"))
        .unwrap()
        .get("/user/:id", (recorder(&log, "second"), |_: Context| async {
            Response::text("answered")
        }))
        .unwrap();

    // First chain continues off the end, second registration answers —
    // successive, distinct chains for the same pattern.
    assert_eq!(body_of(get(&app, "/user/9").await.unwrap()), "answered");
    assert_eq!(entries(&log), ["first", "second"]);
}

#[tokio::test]
async fn skip_route_resumes_at_next_matching_registration() {
    let log = new_log();
    let l = Arc::clone(&log);
    let gate = move |ctx: Context| {
        let log = Arc::clone(&l);
        async move {
            log.lock().unwrap().push("gate");
            if ctx.param("id") == Some("0") {
                ctx.skip_route()
            } else {
                ctx.next()
            }
        }
    };

    let app = Router::new()
        .get("/user/:id", (gate, |_: Context| async { Response::text("regular") }))
        .unwrap()
        .get("/user/:id", |_: Context| async { Response::text("special") })
        .unwrap();

    assert_eq!(body_of(get(&app, "/user/7").await.unwrap()), "regular");
    assert_eq!(body_of(get(&app, "/user/0").await.unwrap()), "special");
    // The gate ran once per request; the skipped chain never re-entered.
    assert_eq!(entries(&log), ["gate", "gate"]);
}

// ── Middleware ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn middleware_runs_before_routes_and_shares_locals() {
    let app = Router::new()
        .middleware(middleware::request_time)
        .get("/", |ctx: Context| async move {
            let at = ctx.local(middleware::REQUEST_TIME_MS).unwrap().to_owned();
            Response::text(at)
        })
        .unwrap();

    let stamp = body_of(get(&app, "/").await.unwrap());
    assert!(stamp.parse::<u128>().is_ok(), "expected a millisecond stamp, got {stamp:?}");
}

#[tokio::test]
async fn scoped_middleware_binds_its_own_params() {
    let app = Router::new()
        .middleware_at("/user/:id", |mut ctx: Context| async move {
            let id = ctx.param("id").unwrap().to_owned();
            ctx.set_local("seen_id", id);
            ctx.next()
        })
        .unwrap()
        .get("/user/:id/books", |ctx: Context| async move {
            Response::text(ctx.local("seen_id").unwrap().to_owned())
        })
        .unwrap()
        .get("/other", |ctx: Context| async move {
            Response::text(ctx.local("seen_id").unwrap_or("none").to_owned())
        })
        .unwrap();

    assert_eq!(body_of(get(&app, "/user/42/books").await.unwrap()), "42");
    // Outside the prefix the middleware never ran.
    assert_eq!(body_of(get(&app, "/other").await.unwrap()), "none");
}

// ── Mounting ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mounted_router_resolves_prefixed_paths() {
    let log = new_log();

    let birds = Router::new()
        .middleware(recorder(&log, "birds-middleware"))
        .get("/", |_: Context| async { Response::html("Birds home page") })
        .unwrap()
        .get("/about", |_: Context| async { Response::html("About birds") })
        .unwrap();

    let app = Router::new().mount("/birds", birds);

    assert_eq!(body_of(get(&app, "/birds/about").await.unwrap()), "About birds");
    // The child middleware ran exactly once for the one request.
    assert_eq!(entries(&log), ["birds-middleware"]);

    assert_eq!(body_of(get(&app, "/birds").await.unwrap()), "Birds home page");
    assert!(matches!(get(&app, "/birdseed").await.unwrap(), Dispatch::Unhandled));
}

#[tokio::test]
async fn unhandled_mount_falls_through_to_later_registrations() {
    let birds = Router::new()
        .get("/about", |_: Context| async { Response::text("About birds") })
        .unwrap();

    let app = Router::new()
        .mount("/birds", birds)
        .all("/birds/:rest", |ctx: Context| async move {
            // Sees the original path again: the mount restored it.
            Response::text(format!("outer:{}", ctx.path()))
        })
        .unwrap();

    assert_eq!(body_of(get(&app, "/birds/about").await.unwrap()), "About birds");
    assert_eq!(body_of(get(&app, "/birds/missing").await.unwrap()), "outer:/birds/missing");
}

// ── Error routing ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn handler_failure_reaches_the_catcher() {
    let app = Router::new()
        .get("/boom", |ctx: Context| async move { ctx.fail("database gone") })
        .unwrap()
        .catch(|_ctx: Context, err: Error| async move {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .text(format!("caught: {err}"))
        });

    match get(&app, "/boom").await.unwrap() {
        Dispatch::Response(res) => {
            assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = String::from_utf8(res.body().to_vec()).unwrap();
            assert!(body.contains("database gone"), "unexpected body {body:?}");
        }
        Dispatch::Unhandled => panic!("catcher should have responded"),
    }
}

#[tokio::test]
async fn failure_without_catcher_propagates_to_the_caller() {
    let app = Router::new()
        .get("/boom", |ctx: Context| async move { ctx.fail("nope") })
        .unwrap();

    let err = get(&app, "/boom").await.unwrap_err();
    assert!(matches!(err, Error::Handler(_)));
}

#[tokio::test]
async fn child_failure_bubbles_to_parent_catcher() {
    let child = Router::new()
        .get("/explode", |ctx: Context| async move { ctx.fail("inner fault") })
        .unwrap();

    let app = Router::new().mount("/sub", child).catch(|_ctx: Context, _err: Error| async {
        Response::builder().status(StatusCode::BAD_GATEWAY).text("recovered")
    });

    match get(&app, "/sub/explode").await.unwrap() {
        Dispatch::Response(res) => assert_eq!(res.status_code(), StatusCode::BAD_GATEWAY),
        Dispatch::Unhandled => panic!("parent catcher should have responded"),
    }
}

#[tokio::test]
async fn catcher_may_swallow_the_error_without_responding() {
    let app = Router::new()
        .get("/boom", |ctx: Context| async move { ctx.fail("shrug") })
        .unwrap()
        .catch(|ctx: Context, _err: Error| async move { ctx.next() });

    let out = get(&app, "/boom").await.unwrap();
    assert!(matches!(out, Dispatch::Unhandled));
}

// ── Registration-time failures ────────────────────────────────────────────────

#[tokio::test]
async fn malformed_pattern_is_rejected_at_registration() {
    let err = Router::new()
        .get("/users/:", |_: Context| async { Response::text("never") })
        .unwrap_err();
    assert!(matches!(err, Error::Pattern { .. }));

    let err = Router::new()
        .get("/user/:id([)", |_: Context| async { Response::text("never") })
        .unwrap_err();
    assert!(matches!(err, Error::Pattern { .. }));
}

// ── Odds and ends ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn trailing_slash_is_tolerated() {
    let app = Router::new()
        .get("/about", |_: Context| async { Response::text("/about") })
        .unwrap();

    assert_eq!(body_of(get(&app, "/about/").await.unwrap()), "/about");
}

#[tokio::test]
async fn route_scope_registers_per_method_on_one_pattern() {
    let app = Router::new()
        .route("/book")
        .unwrap()
        .get(|_: Context| async { Response::text("Get a random book") })
        .post(|_: Context| async { Response::text("Add a book") })
        .put(|_: Context| async { Response::text("Update the book") })
        .done();

    assert_eq!(body_of(get(&app, "/book").await.unwrap()), "Get a random book");
    let posted = app.dispatch(Request::new(Method::Post, "/book")).await.unwrap();
    assert_eq!(body_of(posted), "Add a book");
    let put = app.dispatch(Request::new(Method::Put, "/book")).await.unwrap();
    assert_eq!(body_of(put), "Update the book");
}

#[tokio::test]
async fn concurrent_dispatches_share_one_router() {
    let app = Arc::new(
        Router::new()
            .get("/users/:id", |ctx: Context| async move {
                Response::text(ctx.param("id").unwrap().to_owned())
            })
            .unwrap(),
    );

    let mut joins = Vec::new();
    for i in 0..16 {
        let app = Arc::clone(&app);
        joins.push(tokio::spawn(async move {
            let out = app
                .dispatch(Request::new(Method::Get, format!("/users/{i}")))
                .await
                .unwrap();
            assert_eq!(body_of(out), i.to_string());
        }));
    }
    for join in joins {
        join.await.unwrap();
    }
}
