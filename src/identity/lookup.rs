//! Read-side lookup for code that holds a request but not the accessor.

use crate::identity::{UserId, parse_claim};
use crate::request::Request;

/// The current user's id, from whatever request context is at hand.
///
/// Fallback order:
/// 1. no request → `None`
/// 2. the tagged id written by [`IdentityTagging`](crate::middleware::IdentityTagging)
/// 3. the authenticated principal's claims (name-identifier, then `sub`)
///
/// Never writes, so repeated calls within one request agree.
pub fn tagged_user_id(ctx: Option<&Request>) -> Option<UserId> {
    let req = ctx?;
    if let Some(id) = req.tagged_user_id() {
        return Some(id);
    }
    let principal = req.principal();
    if !principal.is_authenticated() {
        return None;
    }
    principal.user_id_claim().and_then(parse_claim)
}

/// Extension for reading the current user's id off a request.
///
/// ```rust,no_run
/// use wayfarer::{Request, Response, StatusCode};
/// use wayfarer::identity::RequestIdentityExt;
///
/// async fn my_trips(req: Request) -> Response {
///     let Some(user) = req.current_user_id() else {
///         return Response::status(StatusCode::UNAUTHORIZED);
///     };
///     Response::text(format!("trips of {user}"))
/// }
/// ```
pub trait RequestIdentityExt {
    fn current_user_id(&self) -> Option<UserId>;
}

impl RequestIdentityExt for Request {
    fn current_user_id(&self) -> Option<UserId> {
        tagged_user_id(Some(self))
    }
}

impl RequestIdentityExt for Option<&Request> {
    fn current_user_id(&self) -> Option<UserId> {
        tagged_user_id(*self)
    }
}
