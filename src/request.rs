//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;

use crate::identity::{IdentityAccessor, Principal, UserId};

/// An incoming HTTP request, with its body fully read.
///
/// Besides the wire data it carries the request-scoped state middleware
/// fills in: the [`Principal`] set by authentication and the
/// [`IdentityAccessor`] set by identity tagging. Both start empty.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    principal: Principal,
    identity: IdentityAccessor,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            params: HashMap::new(),
            principal: Principal::anonymous(),
            identity: IdentityAccessor::default(),
        }
    }

    /// Builder for requests constructed in-process (tests, internal calls).
    pub fn builder() -> RequestBuilder {
        RequestBuilder { inner: Request {
            method: Method::GET,
            path: "/".to_owned(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            principal: Principal::anonymous(),
            identity: IdentityAccessor::default(),
        } }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/trips/{id}`, `req.param("id")` on `/trips/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn principal(&self) -> &Principal { &self.principal }

    /// Replaces the principal. Meant for authentication middleware.
    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = principal;
    }

    /// The current user's id holder.
    pub fn identity(&self) -> &IdentityAccessor { &self.identity }
    pub fn identity_mut(&mut self) -> &mut IdentityAccessor { &mut self.identity }

    /// The id written by identity tagging, if any.
    ///
    /// A view over [`identity`](Self::identity), not a separate slot, so the
    /// two can never disagree.
    pub fn tagged_user_id(&self) -> Option<UserId> {
        self.identity.get()
    }
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.inner.method = method;
        self
    }

    /// Sets the path, splitting off any `?query`.
    pub fn path(mut self, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q.to_owned())),
            None => (path_and_query, None),
        };
        self.inner.path = path.to_owned();
        self.inner.query = query;
        self
    }

    /// Appends a header.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `value` is not a valid header name / value.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::try_from(name).expect("invalid header name");
        let value = HeaderValue::try_from(value).expect("invalid header value");
        self.inner.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.inner.body = body.into();
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.inner.principal = principal;
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_anonymous_get_root() {
        let req = Request::builder().build();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "/");
        assert!(!req.principal().is_authenticated());
        assert_eq!(req.tagged_user_id(), None);
    }

    #[test]
    fn builder_splits_query() {
        let req = Request::builder().path("/trips?page=2").build();
        assert_eq!(req.path(), "/trips");
        assert_eq!(req.query(), Some("page=2"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::builder().header("X-Auth-Request-User", "42").build();
        assert_eq!(req.header("x-auth-request-user"), Some("42"));
    }

    #[test]
    fn tagged_user_id_mirrors_accessor() {
        let mut req = Request::builder().build();
        req.identity_mut().set(UserId(3));
        assert_eq!(req.tagged_user_id(), req.identity().get());
        assert_eq!(req.tagged_user_id(), Some(UserId(3)));
    }
}
