//! Per-request dispatch context.
//!
//! A [`Context`] is created fresh for each dispatched request and threaded
//! *by value* through the handler chain: every handler takes ownership and
//! gives it back inside the [`Flow`] it returns. One request, one context —
//! no handler can ever see another request's state, and a handler that
//! "forgets" to signal simply does not compile.

use std::collections::HashMap;

use crate::error::Error;
use crate::flow::Flow;
use crate::method::Method;
use crate::request::Request;

/// Request-scoped state owned by one in-flight dispatch.
///
/// Holds the immutable [`Request`], the parameters bound by the currently
/// matched pattern, and a mutable string key-value bag (`locals`) for data
/// handlers want to pass down the chain — a computed timestamp, an
/// authenticated user id.
pub struct Context {
    request: Request,
    /// Current path; mounts strip their prefix before recursing.
    path: String,
    params: HashMap<String, String>,
    locals: HashMap<String, String>,
}

impl Context {
    pub(crate) fn new(request: Request) -> Self {
        let path = request.path().to_owned();
        Self { request, path, params: HashMap::new(), locals: HashMap::new() }
    }

    // ── Request data ─────────────────────────────────────────────────────────

    pub fn method(&self) -> Method {
        self.request.method()
    }

    /// The path as the current router sees it. Inside a router mounted at
    /// `/birds`, the external path `/birds/about` reads as `/about`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The full path as the client sent it, unaffected by mounting.
    pub fn original_path(&self) -> &str {
        self.request.path()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    // ── Matched parameters ───────────────────────────────────────────────────

    /// A path parameter bound by the matched pattern.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All parameters bound by the matched pattern.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    // ── Locals bag ───────────────────────────────────────────────────────────

    /// Stores a request-scoped value visible to every later handler in the
    /// dispatch, including handlers of other matching registrations.
    pub fn set_local(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.locals.insert(key.into(), value.into());
    }

    /// Reads a value a previous handler stored with [`set_local`](Self::set_local).
    pub fn local(&self, key: &str) -> Option<&str> {
        self.locals.get(key).map(String::as_str)
    }

    // ── Control signals ──────────────────────────────────────────────────────

    /// Hands control to the next handler in the current chain. If this was
    /// the last handler, the dispatcher keeps scanning later registrations.
    pub fn next(self) -> Flow {
        Flow::Continue(self)
    }

    /// Abandons the rest of the current route's chain and resumes the scan
    /// at the next matching registration.
    pub fn skip_route(self) -> Flow {
        Flow::SkipRoute(self)
    }

    /// Signals a handler failure; the dispatcher routes it to the nearest
    /// error handlers (see [`Router::catch`](crate::Router::catch)).
    pub fn fail(self, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Flow {
        Flow::Fail(self, Error::Handler(err.into()))
    }

    // ── Dispatcher internals ─────────────────────────────────────────────────

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Enters a mounted router: replaces the visible path with the
    /// prefix-stripped remainder, returning the previous value so the
    /// dispatcher can restore it when the mount falls through.
    pub(crate) fn swap_path(&mut self, path: String) -> String {
        std::mem::replace(&mut self.path, path)
    }
}
