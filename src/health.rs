//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Register them like any other handler:
//!
//! ```rust,no_run
//! use ruta::{health, Router};
//!
//! # fn main() -> Result<(), ruta::Error> {
//! let app = Router::new()
//!     .get("/healthz", health::liveness)?
//!     .get("/readyz", health::readiness)?;
//! # Ok(()) }
//! ```
//!
//! Override `readiness` with your own handler if you need to gate on
//! dependency availability (database connections, downstream services).

use crate::context::Context;
use crate::response::Response;

/// Kubernetes liveness probe handler.
///
/// Always `200 OK` with body `"ok"`. If the process can respond to HTTP at
/// all, it is alive — this handler intentionally has no dependencies.
pub async fn liveness(_ctx: Context) -> Response {
    Response::text("ok")
}

/// Kubernetes readiness probe handler (default implementation).
///
/// `200 OK` with body `"ready"`. Replace it if your application needs a
/// warm-up period or must verify dependency health first.
pub async fn readiness(_ctx: Context) -> Response {
    Response::text("ready")
}
