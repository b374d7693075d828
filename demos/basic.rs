//! Minimal wayfarer example — trip endpoints behind forwarded authentication.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/trips                                  # 401
//!   curl -H 'x-auth-request-user: 42' http://localhost:3000/trips     # owner 42
//!   curl -H 'x-auth-request-sub: 7' http://localhost:3000/trips/3     # owner 7
//!   curl -X POST -H 'x-auth-request-user: 42' http://localhost:3000/account/login
//!                                                        # logs an "auth request timing" line

use wayfarer::identity::{RequestIdentityExt, tagged_user_id};
use wayfarer::middleware::{ForwardedAuth, IdentityTagging, RequestTiming};
use wayfarer::{Request, Response, Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .layer(RequestTiming::default())
        .layer(ForwardedAuth::default())
        .layer(IdentityTagging)
        .get("/trips",          list_trips)
        .get("/trips/{id}",     get_trip)
        .post("/account/login", login);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /trips — reads the accessor directly.
async fn list_trips(req: Request) -> Response {
    let Some(owner) = req.identity().get() else {
        return Response::status(StatusCode::UNAUTHORIZED);
    };
    Response::json(format!(r#"{{"owner":{owner},"trips":[]}}"#))
}

// GET /trips/{id} — goes through the lookup helper, as code without the
// accessor in hand would.
async fn get_trip(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    match req.current_user_id() {
        Some(owner) => Response::json(format!(r#"{{"id":"{id}","owner":{owner}}}"#)),
        None => Response::status(StatusCode::UNAUTHORIZED),
    }
}

// POST /account/login — anonymous callers are fine here.
async fn login(req: Request) -> Response {
    match tagged_user_id(Some(&req)) {
        Some(user) => Response::text(format!("welcome back, user {user}")),
        None => Response::text("welcome, guest"),
    }
}
