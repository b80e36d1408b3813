//! Handler traits and type erasure.
//!
//! # How async handlers are stored
//!
//! A chain holds handlers of *different* concrete types in one `Vec`, so
//! each handler is hidden behind a trait object (`dyn ErasedHandler`) at
//! registration time:
//!
//! ```text
//! async fn stamp(ctx: Context) -> Flow { … }       ← user writes this
//!        ↓ router.get("/", stamp)
//! stamp.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(stamp))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(ctx)  at dispatch time              ← one vtable dispatch
//!        ↓
//! Box::pin(async { stamp(ctx).await.into_flow() })  ← BoxFuture
//! ```
//!
//! The per-invocation cost is one `Arc` clone plus one virtual call —
//! negligible next to network I/O.
//!
//! Registrations accept either a single handler or a tuple of handlers
//! (tuples may nest); the [`Handlers`] trait flattens whatever shape it is
//! given into one ordered chain at registration time.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::flow::{Flow, IntoFlow};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to a [`Flow`].
///
/// `Pin<Box<…>>` because the runtime polls the future in place; `Send +
/// 'static` so tokio may move it across threads. The context is owned, so
/// no borrowed lifetime leaks into the future.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Flow> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler`.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: Context) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure) with the signature:
///
/// ```text
/// async fn name(ctx: Context) -> impl IntoFlow
/// ```
///
/// Endpoints return a [`Response`](crate::Response) (implicitly terminal);
/// middleware returns a [`Flow`] built with [`Context::next`],
/// [`Context::skip_route`] or [`Context::fail`].
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// Because these supertraits are private, external crates cannot implement
/// [`Handler`] or [`ErrorHandler`] on their own types.
mod private {
    pub trait Sealed {}
    pub trait SealedErr {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype bridging a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture {
        let fut = (self.0)(ctx);
        Box::pin(async move { fut.await.into_flow() })
    }
}

// ── Handler chains ────────────────────────────────────────────────────────────

/// One handler, or a (possibly nested) tuple of handlers, flattened into an
/// ordered chain at registration time:
///
/// ```rust,no_run
/// # use ruta::{Context, Flow, Response, Router};
/// # async fn cb0(ctx: Context) -> Flow { ctx.next() }
/// # async fn cb1(ctx: Context) -> Flow { ctx.next() }
/// # async fn cb2(_ctx: Context) -> Response { Response::text("Hello from c") }
/// # fn main() -> Result<(), ruta::Error> {
/// let app = Router::new()
///     .get("/example/c", (cb0, cb1, cb2))?        // flat
///     .get("/example/d", ((cb0, cb1), cb2))?;     // nested — same chain
/// # Ok(()) }
/// ```
///
/// The `M` parameter is an inference marker distinguishing the single-
/// handler case from the tuple cases; it never appears in user code.
pub trait Handlers<M> {
    #[doc(hidden)]
    fn into_chain(self) -> Vec<BoxedHandler>;
}

/// Inference marker for a lone handler.
#[doc(hidden)]
pub struct Lone;

impl<H: Handler> Handlers<Lone> for H {
    fn into_chain(self) -> Vec<BoxedHandler> {
        vec![self.into_boxed_handler()]
    }
}

macro_rules! impl_handlers_for_tuple {
    ($(($h:ident, $m:ident)),+) => {
        impl<$($h,)+ $($m,)+> Handlers<($($m,)+)> for ($($h,)+)
        where
            $($h: Handlers<$m>,)+
        {
            fn into_chain(self) -> Vec<BoxedHandler> {
                #[allow(non_snake_case)]
                let ($($h,)+) = self;
                let mut chain = Vec::new();
                $(chain.extend($h.into_chain());)+
                chain
            }
        }
    };
}

impl_handlers_for_tuple!((H0, M0), (H1, M1));
impl_handlers_for_tuple!((H0, M0), (H1, M1), (H2, M2));
impl_handlers_for_tuple!((H0, M0), (H1, M1), (H2, M2), (H3, M3));
impl_handlers_for_tuple!((H0, M0), (H1, M1), (H2, M2), (H3, M3), (H4, M4));
impl_handlers_for_tuple!((H0, M0), (H1, M1), (H2, M2), (H3, M3), (H4, M4), (H5, M5));

// ── Error handlers ────────────────────────────────────────────────────────────

/// Internal dispatch interface for error handlers.
#[doc(hidden)]
pub trait ErasedErrorHandler {
    fn call(&self, ctx: Context, err: Error) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedErrorHandler = Arc<dyn ErasedErrorHandler + Send + Sync + 'static>;

/// Implemented for every valid error handler — the error is a first-class
/// argument rather than an arity convention:
///
/// ```text
/// async fn on_error(ctx: Context, err: ruta::Error) -> impl IntoFlow
/// ```
///
/// Registered with [`Router::catch`](crate::Router::catch). Sealed, like
/// [`Handler`].
pub trait ErrorHandler: private::SealedErr + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_error_handler(self) -> BoxedErrorHandler;
}

impl<F, Fut, R> private::SealedErr for F
where
    F: Fn(Context, Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
}

impl<F, Fut, R> ErrorHandler for F
where
    F: Fn(Context, Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
    fn into_boxed_error_handler(self) -> BoxedErrorHandler {
        Arc::new(FnErrorHandler(self))
    }
}

struct FnErrorHandler<F>(F);

impl<F, Fut, R> ErasedErrorHandler for FnErrorHandler<F>
where
    F: Fn(Context, Error) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
    fn call(&self, ctx: Context, err: Error) -> BoxFuture {
        let fut = (self.0)(ctx, err);
        Box::pin(async move { fut.await.into_flow() })
    }
}
