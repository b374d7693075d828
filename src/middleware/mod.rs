//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: authentication, identity tagging, timing.
//!
//! Layers run in registration order, the first one registered being the
//! outermost:
//!
//! ```rust,no_run
//! use wayfarer::Router;
//! use wayfarer::middleware::{ForwardedAuth, IdentityTagging, RequestTiming};
//! # async fn list_trips(_: wayfarer::Request) -> &'static str { "" }
//!
//! let app = Router::new()
//!     .layer(RequestTiming::default())
//!     .layer(ForwardedAuth::default())
//!     .layer(IdentityTagging)          // after authentication
//!     .get("/trips", list_trips);
//! ```
//!
//! Each layer receives the request by value together with a [`Next`]. `Next`
//! is consumed by [`Next::run`], so a layer can continue the chain at most
//! once. Returning without calling it short-circuits the request.

mod forwarded;
mod identity;
mod timing;

use std::future::Future;
use std::sync::Arc;

pub use forwarded::ForwardedAuth;
pub use identity::IdentityTagging;
pub use timing::RequestTiming;

use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// A request-pipeline stage.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the pipeline after the current layer.
pub struct Next {
    router: Arc<Router>,
    index: usize,
}

impl Next {
    pub(crate) fn new(router: Arc<Router>) -> Self {
        Self { router, index: 0 }
    }

    /// Runs the remaining layers and then the matched route.
    pub fn run(self, req: Request) -> BoxFuture {
        let Some(layer) = self.router.layer_at(self.index) else {
            let router = self.router;
            return Box::pin(async move { router.route(req).await });
        };
        layer.call(req, Next { router: self.router, index: self.index + 1 })
    }
}

/// Middleware built from an async closure. See [`from_fn`].
pub struct FromFn<F>(F);

/// Wraps an `async` closure taking `(Request, Next)` as middleware.
///
/// ```rust,no_run
/// use wayfarer::{Router, middleware};
///
/// let app = Router::new().layer(middleware::from_fn(|req, next: middleware::Next| async move {
///     let mut res = next.run(req).await;
///     res.headers_mut().insert("x-served-by", "wayfarer".parse().unwrap());
///     res
/// }));
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, next))
    }
}
