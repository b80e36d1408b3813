//! Ordered request router and middleware dispatcher.
//!
//! One flat stack per router. Routes, scoped middleware, and mounted
//! sub-routers all live in the same ordered list, and that registration
//! order *is* the dispatch precedence — the earliest matching entry always
//! runs first. No tree rebalancing, no specificity scoring, no magic.
//!
//! Dispatch walks the stack, runs each matching entry's handler chain, and
//! obeys the [`Flow`] each handler returns: `Continue` moves down the
//! chain, `SkipRoute` abandons the chain and resumes the scan,
//! `Respond` ends the dispatch, `Fail` jumps to the nearest error handlers.
//! A chain that runs out of handlers without responding falls through to
//! the next matching entry — several registrations of the same pattern
//! execute as successive, distinct chains.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::context::Context;
use crate::error::Error;
use crate::flow::Flow;
use crate::handler::{BoxedErrorHandler, BoxedHandler, ErrorHandler, Handlers};
use crate::method::Method;
use crate::pattern::{Anchor, IntoPattern, Pattern};
use crate::request::Request;
use crate::response::Response;

// ── Dispatch result ───────────────────────────────────────────────────────────

/// The outcome of a dispatch.
pub enum Dispatch {
    /// A terminal handler produced this response.
    Response(Response),
    /// No registration matched, or every matching chain exhausted without
    /// responding. The embedder maps this to a 404-class outcome.
    Unhandled,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatch::Response(_) => f.write_str("Dispatch::Response(..)"),
            Dispatch::Unhandled => f.write_str("Dispatch::Unhandled"),
        }
    }
}

// ── Stack entries ─────────────────────────────────────────────────────────────

/// A route registration: method filter, compiled pattern, handler chain.
/// Immutable once pushed.
struct Route {
    /// `None` is the any-method wildcard.
    method: Option<Method>,
    pattern: Pattern,
    chain: Vec<BoxedHandler>,
}

/// Middleware: runs for every request (no pattern) or for every request
/// under a prefix pattern, in stack order, regardless of method.
struct Scoped {
    pattern: Option<Pattern>,
    chain: Vec<BoxedHandler>,
}

/// A sub-router mounted under a literal path prefix.
struct MountPoint {
    /// Normalized: no trailing slash; empty string mounts at `/`.
    prefix: String,
    router: Router,
}

enum Layer {
    Route(Route),
    Middleware(Scoped),
    Mount(MountPoint),
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Build it once at startup — every registration method consumes and
/// returns the router, so registrations chain naturally — then share it
/// read-only across concurrent dispatches. Pattern compilation happens
/// here, at registration time; a malformed pattern is an immediate
/// [`Error::Pattern`] and nothing is registered.
///
/// ```rust,no_run
/// use ruta::{Context, Flow, Response, Router};
///
/// async fn log_time(ctx: Context) -> Flow {
///     tracing::info!("time: {:?}", std::time::SystemTime::now());
///     ctx.next()
/// }
///
/// async fn home(_ctx: Context) -> Response {
///     Response::html("Birds home page")
/// }
///
/// async fn about(_ctx: Context) -> Response {
///     Response::html("About birds")
/// }
///
/// # fn main() -> Result<(), ruta::Error> {
/// let birds = Router::new()
///     .middleware(log_time)
///     .get("/", home)?
///     .get("/about", about)?;
///
/// let app = Router::new().mount("/birds", birds);
/// # Ok(()) }
/// ```
pub struct Router {
    stack: Vec<Layer>,
    catchers: Vec<BoxedErrorHandler>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("stack_len", &self.stack.len())
            .field("catchers_len", &self.catchers.len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { stack: Vec::new(), catchers: Vec::new() }
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Registers a handler chain for a method + pattern pair.
    ///
    /// `pattern` is a string template (`/users/:id`, `/user/:id(\d+)`,
    /// `/flights/:from-:to`) or a raw [`regex::Regex`]. `handlers` is one
    /// handler or a tuple of handlers run in order.
    pub fn on<M>(
        self,
        method: Method,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.register(Some(method), pattern, handlers)
    }

    /// Like [`on`](Self::on), but matches any method at this position in
    /// the registration order.
    pub fn all<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.register(None, pattern, handlers)
    }

    pub fn get<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.on(Method::Get, pattern, handlers)
    }

    pub fn post<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.on(Method::Post, pattern, handlers)
    }

    pub fn put<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.on(Method::Put, pattern, handlers)
    }

    pub fn delete<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.on(Method::Delete, pattern, handlers)
    }

    pub fn patch<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.on(Method::Patch, pattern, handlers)
    }

    pub fn head<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.on(Method::Head, pattern, handlers)
    }

    pub fn options<M>(
        self,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        self.on(Method::Options, pattern, handlers)
    }

    fn register<M>(
        mut self,
        method: Option<Method>,
        pattern: impl IntoPattern,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        let pattern = pattern.into_pattern()?;
        self.stack.push(Layer::Route(Route { method, pattern, chain: handlers.into_chain() }));
        Ok(self)
    }

    /// Compiles `pattern` once and opens a [`RouteScope`] for chained
    /// per-method registration on it:
    ///
    /// ```rust,no_run
    /// # use ruta::{Context, Response, Router};
    /// # async fn get_book(_: Context) -> Response { Response::text("Get a random book") }
    /// # async fn add_book(_: Context) -> Response { Response::text("Add a book") }
    /// # fn main() -> Result<(), ruta::Error> {
    /// let app = Router::new()
    ///     .route("/book")?
    ///     .get(get_book)
    ///     .post(add_book)
    ///     .done();
    /// # Ok(()) }
    /// ```
    pub fn route(self, pattern: &str) -> Result<RouteScope, Error> {
        let pattern = Pattern::template(pattern, Anchor::Full)?;
        Ok(RouteScope { router: self, pattern })
    }

    /// Registers middleware that runs for every request reaching this
    /// router, at this position in the registration order.
    pub fn middleware<M>(mut self, handlers: impl Handlers<M>) -> Self {
        self.stack.push(Layer::Middleware(Scoped { pattern: None, chain: handlers.into_chain() }));
        self
    }

    /// Registers middleware scoped to a path prefix. The prefix is a
    /// template and may bind parameters (`/user/:id`); it matches at
    /// segment boundaries, so `/user` scopes `/user/42` but not
    /// `/username`.
    pub fn middleware_at<M>(
        mut self,
        prefix: &str,
        handlers: impl Handlers<M>,
    ) -> Result<Self, Error> {
        let pattern = Pattern::template(prefix, Anchor::Prefix)?;
        self.stack.push(Layer::Middleware(Scoped { pattern: Some(pattern), chain: handlers.into_chain() }));
        Ok(self)
    }

    /// Mounts `router` under a literal path prefix. The prefix is stripped
    /// before the child scans its own stack, so the child's patterns are
    /// written relative to the mount point. If the child leaves the request
    /// unhandled, the scan resumes at this router's next entry.
    pub fn mount(mut self, prefix: &str, router: Router) -> Self {
        let prefix = prefix.trim_end_matches('/').to_owned();
        self.stack.push(Layer::Mount(MountPoint { prefix, router }));
        self
    }

    /// Appends an error handler. When a handler in this router (or a
    /// mounted child with no catcher of its own) signals
    /// [`Flow::Fail`], the catchers run in registration order. A catcher
    /// may respond, re-`Fail` to pass the error along, or `Continue` to
    /// swallow the error without a response (the dispatch then reports
    /// [`Dispatch::Unhandled`]). If every catcher declines, the error
    /// propagates — to the parent router's catchers, or out of
    /// [`dispatch`](Self::dispatch) as `Err`.
    pub fn catch(mut self, handler: impl ErrorHandler) -> Self {
        self.catchers.push(handler.into_boxed_error_handler());
        self
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Routes one request through the stack.
    ///
    /// Returns the first terminal response a handler produced,
    /// [`Dispatch::Unhandled`] if nothing matched (or every matching chain
    /// exhausted), or `Err` if a handler failed and no catcher recovered.
    ///
    /// `&self` only — a router is immutable once serving begins and is
    /// shared freely across concurrent dispatches.
    pub async fn dispatch(&self, request: Request) -> Result<Dispatch, Error> {
        let ctx = Context::new(request);
        match self.dispatch_stack(ctx).await {
            Outcome::Responded(res) => Ok(Dispatch::Response(res)),
            Outcome::Exhausted(ctx) => {
                debug!(method = %ctx.method(), path = ctx.original_path(), "unhandled");
                Ok(Dispatch::Unhandled)
            }
            Outcome::Failed(_, err) => Err(err),
        }
    }

    /// The scan. Boxed return type because mounts recurse.
    fn dispatch_stack<'a>(
        &'a self,
        mut ctx: Context,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send + 'a>> {
        Box::pin(async move {
            for layer in &self.stack {
                match layer {
                    Layer::Route(route) => {
                        if let Some(required) = route.method {
                            if required != ctx.method() {
                                continue;
                            }
                        }
                        let Some(params) = route.pattern.matches(ctx.path()) else {
                            continue;
                        };
                        debug!(pattern = %route.pattern, path = ctx.path(), "route matched");
                        ctx.set_params(params);
                        match run_chain(&route.chain, ctx).await {
                            ChainEnd::Responded(res) => return Outcome::Responded(res),
                            // Exhausted and SkipRoute both resume the scan
                            // at the next entry.
                            ChainEnd::Exhausted(c) | ChainEnd::Skipped(c) => ctx = c,
                            ChainEnd::Failed(c, err) => return self.recover(c, err).await,
                        }
                    }

                    Layer::Middleware(scoped) => {
                        if let Some(pattern) = &scoped.pattern {
                            let Some(params) = pattern.matches(ctx.path()) else {
                                continue;
                            };
                            ctx.set_params(params);
                        }
                        match run_chain(&scoped.chain, ctx).await {
                            ChainEnd::Responded(res) => return Outcome::Responded(res),
                            ChainEnd::Exhausted(c) | ChainEnd::Skipped(c) => ctx = c,
                            ChainEnd::Failed(c, err) => return self.recover(c, err).await,
                        }
                    }

                    Layer::Mount(mount) => {
                        let Some(rest) = strip_mount(ctx.path(), &mount.prefix) else {
                            continue;
                        };
                        let saved = ctx.swap_path(rest);
                        match mount.router.dispatch_stack(ctx).await {
                            Outcome::Responded(res) => return Outcome::Responded(res),
                            Outcome::Exhausted(mut c) => {
                                c.swap_path(saved);
                                ctx = c;
                            }
                            // The child already gave its own catchers a
                            // shot; ours are next.
                            Outcome::Failed(c, err) => return self.recover(c, err).await,
                        }
                    }
                }
            }
            Outcome::Exhausted(ctx)
        })
    }

    /// Runs the catcher list on a failed dispatch.
    async fn recover(&self, mut ctx: Context, mut err: Error) -> Outcome {
        for catcher in &self.catchers {
            match catcher.call(ctx, err).await {
                Flow::Respond(res) => return Outcome::Responded(res),
                Flow::Fail(c, e) => {
                    ctx = c;
                    err = e;
                }
                Flow::Continue(c) | Flow::SkipRoute(c) => return Outcome::Exhausted(c),
            }
        }
        Outcome::Failed(ctx, err)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// ── RouteScope ────────────────────────────────────────────────────────────────

/// Chained per-method registration on one compiled pattern.
///
/// Created by [`Router::route`]; the pattern compiled once, so the
/// per-method registrations are infallible. [`done`](Self::done) hands the
/// router back.
pub struct RouteScope {
    router: Router,
    pattern: Pattern,
}

impl RouteScope {
    pub fn on<M>(mut self, method: Method, handlers: impl Handlers<M>) -> Self {
        self.router.stack.push(Layer::Route(Route {
            method: Some(method),
            pattern: self.pattern.clone(),
            chain: handlers.into_chain(),
        }));
        self
    }

    /// Any-method wildcard on this pattern.
    pub fn all<M>(mut self, handlers: impl Handlers<M>) -> Self {
        self.router.stack.push(Layer::Route(Route {
            method: None,
            pattern: self.pattern.clone(),
            chain: handlers.into_chain(),
        }));
        self
    }

    pub fn get<M>(self, handlers: impl Handlers<M>) -> Self {
        self.on(Method::Get, handlers)
    }

    pub fn post<M>(self, handlers: impl Handlers<M>) -> Self {
        self.on(Method::Post, handlers)
    }

    pub fn put<M>(self, handlers: impl Handlers<M>) -> Self {
        self.on(Method::Put, handlers)
    }

    pub fn delete<M>(self, handlers: impl Handlers<M>) -> Self {
        self.on(Method::Delete, handlers)
    }

    pub fn patch<M>(self, handlers: impl Handlers<M>) -> Self {
        self.on(Method::Patch, handlers)
    }

    pub fn done(self) -> Router {
        self.router
    }
}

// ── Chain execution ───────────────────────────────────────────────────────────

enum ChainEnd {
    Responded(Response),
    /// Every handler continued; no response.
    Exhausted(Context),
    /// A handler skipped the rest of this route.
    Skipped(Context),
    Failed(Context, Error),
}

async fn run_chain(chain: &[BoxedHandler], mut ctx: Context) -> ChainEnd {
    for handler in chain {
        match handler.call(ctx).await {
            Flow::Continue(c) => ctx = c,
            Flow::SkipRoute(c) => return ChainEnd::Skipped(c),
            Flow::Respond(res) => return ChainEnd::Responded(res),
            Flow::Fail(c, err) => return ChainEnd::Failed(c, err),
        }
    }
    ChainEnd::Exhausted(ctx)
}

enum Outcome {
    Responded(Response),
    Exhausted(Context),
    Failed(Context, Error),
}

// ── Mount prefix stripping ────────────────────────────────────────────────────

/// `/birds` + `/birds/about` → `/about`; `/birds` alone → `/`;
/// `/birdseed` → no match. An empty prefix mounts at the root and passes
/// the path through untouched.
fn strip_mount(path: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return Some(path.to_owned());
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/".to_owned())
    } else if rest.starts_with('/') {
        Some(rest.to_owned())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::strip_mount;

    #[test]
    fn mount_prefix_respects_segment_boundaries() {
        assert_eq!(strip_mount("/birds/about", "/birds"), Some("/about".to_owned()));
        assert_eq!(strip_mount("/birds", "/birds"), Some("/".to_owned()));
        assert_eq!(strip_mount("/birdseed", "/birds"), None);
        assert_eq!(strip_mount("/other", "/birds"), None);
        assert_eq!(strip_mount("/anything", ""), Some("/anything".to_owned()));
    }
}
