//! Unified error type.

/// The error type returned by ruta's fallible operations.
///
/// Two failure classes flow through here:
///
/// - **Registration time** — a route pattern that does not compile
///   ([`Error::Pattern`]). Reported synchronously by `Router::on` and
///   friends; the registration is rejected and nothing is partially added.
/// - **Dispatch time** — a handler signalled [`Flow::Fail`](crate::Flow)
///   and no catcher produced a response ([`Error::Handler`]), or the server
///   collaborator hit an I/O failure ([`Error::Io`]).
///
/// A request that simply matches no route is *not* an error — dispatch
/// reports [`Dispatch::Unhandled`](crate::Dispatch) and the embedder maps
/// it to a 404-class outcome.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A route pattern failed to compile: malformed parameter syntax,
    /// unbalanced constraint parentheses, or an invalid embedded regex.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    /// A handler failed and no error handler recovered.
    #[error("handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Infrastructure failure in the server collaborator: binding a port,
    /// accepting a connection.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::Pattern { pattern: pattern.to_owned(), reason: reason.into() }
    }
}
