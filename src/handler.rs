//! Route handlers.
//!
//! A handler is the last stage of the pipeline: it gets the request after
//! every middleware layer has run and turns it into a response. Handlers and
//! middleware are stored the same way, as `Arc<dyn …>` objects returning a
//! [`BoxFuture`], so [`Next`](crate::middleware::Next) ends the chain with a
//! plain trait-object call.
//!
//! Any `async fn(Request) -> impl IntoResponse` is a handler. So is a struct
//! that implements [`Handler`] itself, which is the way to give a handler its
//! own state:
//!
//! ```rust
//! use wayfarer::{BoxFuture, Handler, Request, Response};
//!
//! struct Greeting(&'static str);
//!
//! impl Handler for Greeting {
//!     fn call(&self, _req: Request) -> BoxFuture {
//!         let text = self.0;
//!         Box::pin(async move { Response::text(text) })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Future returned by every pipeline stage.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A route handler, as stored by the router.
pub(crate) type BoxedHandler = Arc<dyn Handler>;

/// The final stage of a request: produce the response.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = self(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
