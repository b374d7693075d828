//! Latency logging for authentication endpoints.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

const DEFAULT_PREFIXES: [&str; 3] = ["/identity/account/", "/account/", "/api/auth/"];
const DEFAULT_CONTAINS: [&str; 3] = ["login", "logout", "register"];

/// Logs how long authentication-related requests take.
///
/// Only paths matching one of the configured rules are timed; everything
/// else passes through untouched. Rules compare case-insensitively. A timed
/// request emits one INFO event with `method`, `path`, `status` and
/// `elapsed_ms` once the rest of the pipeline has answered.
///
/// ```rust
/// use wayfarer::middleware::RequestTiming;
///
/// // stock rules plus one more
/// let timing = RequestTiming::default().prefix("/oauth/");
///
/// // only what you list
/// let timing = RequestTiming::new().contains("signin");
/// ```
#[derive(Clone, Debug)]
pub struct RequestTiming {
    rules: Arc<Rules>,
}

#[derive(Clone, Debug, Default)]
struct Rules {
    prefixes: Vec<String>,
    contains: Vec<String>,
}

impl Rules {
    fn matches(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
            || self.contains.iter().any(|c| path.contains(c.as_str()))
    }
}

impl RequestTiming {
    /// Timing with no rules: nothing is timed until rules are added.
    pub fn new() -> Self {
        Self { rules: Arc::new(Rules::default()) }
    }

    /// Times paths starting with `prefix`.
    pub fn prefix(mut self, prefix: &str) -> Self {
        Arc::make_mut(&mut self.rules).prefixes.push(prefix.to_ascii_lowercase());
        self
    }

    /// Times paths containing `needle` anywhere.
    pub fn contains(mut self, needle: &str) -> Self {
        Arc::make_mut(&mut self.rules).contains.push(needle.to_ascii_lowercase());
        self
    }

    /// Whether `path` would be timed.
    pub fn matches(&self, path: &str) -> bool {
        self.rules.matches(path)
    }
}

/// The stock rules for sign-in, sign-out and registration endpoints.
impl Default for RequestTiming {
    fn default() -> Self {
        let timing = DEFAULT_PREFIXES.iter().fold(Self::new(), |t, p| t.prefix(p));
        DEFAULT_CONTAINS.iter().fold(timing, |t, c| t.contains(c))
    }
}

impl Middleware for RequestTiming {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        if !self.rules.matches(req.path()) {
            return next.run(req);
        }

        let method = req.method().clone();
        let path = req.path().to_owned();
        Box::pin(async move {
            let start = Instant::now();
            let res = next.run(req).await;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            info!(
                %method,
                path = %path,
                status = res.status_code().as_u16(),
                elapsed_ms,
                "auth request timing"
            );
            res
        })
    }
}
