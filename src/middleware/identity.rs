//! Tags requests with the authenticated user's numeric id.

use crate::handler::BoxFuture;
use crate::identity::parse_claim;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Tags each request with the authenticated user's numeric id.
///
/// Reads the name-identifier claim (falling back to `sub`), parses it as an
/// integer and stores it in the request's
/// [`IdentityAccessor`](crate::identity::IdentityAccessor). Anonymous
/// requests and claims that do not parse are left untagged. The chain always
/// continues.
///
/// Register it after the authentication layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTagging;

impl IdentityTagging {
    fn tag(req: &mut Request) {
        let principal = req.principal();
        if !principal.is_authenticated() {
            return;
        }
        if let Some(id) = principal.user_id_claim().and_then(parse_claim) {
            req.identity_mut().set(id);
        }
    }
}

impl Middleware for IdentityTagging {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        Self::tag(&mut req);
        next.run(req)
    }
}
