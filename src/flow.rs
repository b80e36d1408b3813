//! Handler control signals.

use http::StatusCode;

use crate::context::Context;
use crate::error::Error;
use crate::response::Response;

/// What a handler decided to do with the request.
///
/// Returned by every handler invocation and consumed immediately by the
/// dispatcher — a `Flow` is never stored. The non-terminal variants carry
/// the [`Context`] back so the next handler can take it over; construct
/// them through [`Context::next`], [`Context::skip_route`] and
/// [`Context::fail`] rather than naming the variants directly.
pub enum Flow {
    /// Proceed to the next handler in the same chain; after the last
    /// handler, the dispatcher keeps scanning later registrations.
    Continue(Context),
    /// Abandon the rest of this route's chain; resume the scan at the next
    /// matching registration. Never skips inward across a mount boundary.
    SkipRoute(Context),
    /// Terminal response. Dispatch stops entirely.
    Respond(Response),
    /// Handler failure, routed to the nearest error handlers.
    Fail(Context, Error),
}

/// Conversion into a [`Flow`], so plain endpoint handlers can return a
/// [`Response`] (or a status, or a string) without ever naming the enum:
///
/// ```rust
/// use ruta::{Context, Response};
///
/// // an endpoint — implicitly terminal
/// async fn home(_ctx: Context) -> Response {
///     Response::html("<h1>Birds home page</h1>")
/// }
///
/// // middleware — explicit control signal
/// async fn stamp(mut ctx: Context) -> ruta::Flow {
///     ctx.set_local("seen", "true");
///     ctx.next()
/// }
/// ```
pub trait IntoFlow {
    fn into_flow(self) -> Flow;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Flow {
        self
    }
}

impl IntoFlow for Response {
    fn into_flow(self) -> Flow {
        Flow::Respond(self)
    }
}

impl IntoFlow for StatusCode {
    fn into_flow(self) -> Flow {
        Flow::Respond(Response::status(self))
    }
}

impl IntoFlow for &'static str {
    fn into_flow(self) -> Flow {
        Flow::Respond(Response::text(self))
    }
}

impl IntoFlow for String {
    fn into_flow(self) -> Flow {
        Flow::Respond(Response::text(self))
    }
}
