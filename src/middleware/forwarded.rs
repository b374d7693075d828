//! Authentication from headers set by a trusted reverse proxy.
//!
//! The proxy (oauth2-proxy, nginx `auth_request`, an ingress controller)
//! authenticates the user and forwards what it verified as request headers.
//! This layer turns those headers into the request's [`Principal`].
//!
//! The proxy must strip these headers from client traffic. Anything that can
//! reach the service directly can claim to be anyone.

use std::sync::Arc;

use tracing::debug;

use crate::handler::BoxFuture;
use crate::identity::claims::{EMAIL, NAME_IDENTIFIER, SUBJECT};
use crate::identity::{Claim, Principal};
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Builds the principal from forwarded identity headers.
///
/// Each configured header maps onto one claim type. If at least one mapped
/// header carries a non-empty value the request's principal is replaced by
/// an authenticated one holding those claims. Without such headers the
/// principal is left as it was, so an earlier layer's principal survives.
/// The chain always continues.
///
/// Default mapping:
///
/// | Header | Claim |
/// |---|---|
/// | `x-auth-request-user` | name-identifier |
/// | `x-auth-request-sub` | `sub` |
/// | `x-auth-request-email` | `email` |
#[derive(Clone, Debug)]
pub struct ForwardedAuth {
    mappings: Arc<Vec<(String, String)>>,
}

impl ForwardedAuth {
    /// No mappings: every request stays anonymous until headers are added.
    pub fn new() -> Self {
        Self { mappings: Arc::new(Vec::new()) }
    }

    /// Maps `header` onto claim type `claim`.
    pub fn claim_header(mut self, header: &str, claim: &str) -> Self {
        Arc::make_mut(&mut self.mappings).push((header.to_ascii_lowercase(), claim.to_owned()));
        self
    }

    fn principal_for(&self, req: &Request) -> Option<Principal> {
        let claims: Vec<Claim> = self.mappings.iter()
            .filter_map(|(header, claim)| {
                req.header(header)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| Claim::new(claim.as_str(), v))
            })
            .collect();

        (!claims.is_empty()).then(|| Principal::authenticated(claims))
    }
}

impl Default for ForwardedAuth {
    fn default() -> Self {
        Self::new()
            .claim_header("x-auth-request-user", NAME_IDENTIFIER)
            .claim_header("x-auth-request-sub", SUBJECT)
            .claim_header("x-auth-request-email", EMAIL)
    }
}

impl Middleware for ForwardedAuth {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        match self.principal_for(&req) {
            Some(principal) => {
                debug!(path = req.path(), claims = principal.claims().len(), "forwarded authentication");
                req.set_principal(principal);
            }
            None => debug!(path = req.path(), "no forwarded identity"),
        }
        next.run(req)
    }
}
