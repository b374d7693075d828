//! Claims and the principal they describe.
//!
//! The authentication layer owns the [`Principal`]; everything downstream of
//! it only reads. A principal that carries no authentication is *anonymous*,
//! and every request starts out that way.

/// Standard name-identifier claim type. Primary source of the user id.
pub const NAME_IDENTIFIER: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// JWT-style subject claim type. Secondary source of the user id.
pub const SUBJECT: &str = "sub";

/// Email claim type.
pub const EMAIL: &str = "email";

/// Claim types consulted for the user id, in order.
pub(crate) const USER_ID_CLAIMS: [&str; 2] = [NAME_IDENTIFIER, SUBJECT];

/// A typed fact about a principal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Claim {
    kind: String,
    value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self { kind: kind.into(), value: value.into() }
    }

    pub fn kind(&self) -> &str { &self.kind }
    pub fn value(&self) -> &str { &self.value }
}

/// The identity attached to a request by the authentication layer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Principal {
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Principal {
    /// A principal with no authentication and no claims.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated principal carrying `claims`.
    pub fn authenticated(claims: impl IntoIterator<Item = Claim>) -> Self {
        Self { authenticated: true, claims: claims.into_iter().collect() }
    }

    pub fn is_authenticated(&self) -> bool { self.authenticated }
    pub fn claims(&self) -> &[Claim] { &self.claims }

    /// Value of the first claim of type `kind`. Claim types compare exactly.
    pub fn find_first(&self, kind: &str) -> Option<&str> {
        self.claims.iter()
            .find(|c| c.kind == kind)
            .map(Claim::value)
    }

    /// First non-blank value among the user-id claim types, trimmed.
    ///
    /// Name-identifier wins over `sub`. A missing or whitespace-only
    /// name-identifier falls through to `sub`; a present but non-numeric one
    /// does not.
    pub(crate) fn user_id_claim(&self) -> Option<&str> {
        USER_ID_CLAIMS.iter()
            .filter_map(|kind| self.find_first(kind))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}
