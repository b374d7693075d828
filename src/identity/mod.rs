//! Per-request user identity.
//!
//! Every [`Request`](crate::Request) owns one [`IdentityAccessor`]. The
//! [`IdentityTagging`](crate::middleware::IdentityTagging) middleware fills it
//! from the principal's claims; handlers read it back through
//! [`Request::identity`](crate::Request::identity) or, where they only hold
//! an optional request reference, through [`tagged_user_id`].
//!
//! ```text
//! ForwardedAuth      principal ← proxy headers
//!      ↓
//! IdentityTagging    accessor  ← parse(nameidentifier | sub)
//!      ↓
//! handler            req.identity().get()  /  req.tagged_user_id()
//! ```
//!
//! "No identity" is always `None`. Anonymous requests, missing claims and
//! claims that are not integers all end up there, and none of them is an
//! error.

pub mod claims;
mod lookup;

use std::fmt;
use std::str::FromStr;

pub use claims::{Claim, Principal};
pub use lookup::{RequestIdentityExt, tagged_user_id};

/// Numeric id of an application user.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UserId(pub i32);

impl UserId {
    pub fn get(self) -> i32 { self.0 }
}

/// Lenient integer parse, the way claim values are usually written.
///
/// Surrounding ASCII whitespace and a single leading sign are accepted. Empty
/// strings, GUIDs, decimals and anything outside `i32` are rejected.
impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_ascii().parse().map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self { Self(id) }
}

/// Parses a claim value into a [`UserId`], folding every failure into `None`.
pub(crate) fn parse_claim(value: &str) -> Option<UserId> {
    value.parse().ok()
}

/// Request-scoped holder of the current user's id.
///
/// Owned by the request, so there is exactly one per request and no locking.
/// [`set`](Self::set) is last-write-wins; the tagging middleware writes it
/// once, before any handler runs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IdentityAccessor {
    user_id: Option<UserId>,
}

impl IdentityAccessor {
    pub fn set(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    pub fn get(&self) -> Option<UserId> {
        self.user_id
    }
}
