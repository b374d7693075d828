//! # wayfarer
//!
//! The request pipeline of the trip-planning service: routing, middleware,
//! and per-request user identity.
//!
//! ## The contract
//!
//! A reverse proxy in front of the service authenticates users and forwards
//! who they are as headers. wayfarer turns those headers into a
//! [`Principal`](identity::Principal), tags the request with the user's
//! numeric id, and hands handlers a request from which that id can be read.
//!
//! - Radix-tree routing via [`matchit`]
//! - HTTP/1.1 and HTTP/2 via hyper, on tokio
//! - Ordered middleware with an explicit [`Next`](middleware::Next)
//! - Graceful shutdown on SIGTERM / Ctrl-C
//!
//! A missing identity is `None`, never an error. Whether that means "guest"
//! or `401` is up to each handler.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use wayfarer::{Method, Request, Response, Router, Server, StatusCode};
//! use wayfarer::identity::RequestIdentityExt;
//! use wayfarer::middleware::{ForwardedAuth, IdentityTagging, RequestTiming};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .layer(RequestTiming::default())
//!         .layer(ForwardedAuth::default())
//!         .layer(IdentityTagging)
//!         .on(Method::GET, "/trips", my_trips);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn my_trips(req: Request) -> Response {
//!     match req.identity().get() {
//!         Some(user) => Response::json(format!(r#"{{"owner":{user},"trips":[]}}"#)),
//!         None => Response::status(StatusCode::UNAUTHORIZED),
//!     }
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod identity;
pub mod middleware;

pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use http::{Method, StatusCode};
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
