//! End-to-end identity tagging through the router and middleware chain.

use std::sync::{Arc, Mutex};

use wayfarer::identity::claims::{NAME_IDENTIFIER, SUBJECT};
use wayfarer::identity::{Claim, Principal, RequestIdentityExt, UserId, tagged_user_id};
use wayfarer::middleware::{self, ForwardedAuth, IdentityTagging, Next, RequestTiming};
use wayfarer::{Request, Response, Router, StatusCode};

/// What a handler saw, reported back in headers.
async fn report(req: Request) -> Response {
    fn show(id: Option<UserId>) -> String {
        id.map_or_else(|| "absent".to_owned(), |id| id.to_string())
    }
    let lookups: Vec<_> = (0..3).map(|_| req.current_user_id()).collect();
    let stable = lookups.windows(2).all(|w| w[0] == w[1]);

    Response::builder()
        .header("x-accessor", &show(req.identity().get()))
        .header("x-side-channel", &show(req.tagged_user_id()))
        .header("x-lookup", &show(tagged_user_id(Some(&req))))
        .header("x-lookup-stable", if stable { "yes" } else { "no" })
        .text("ok")
}

fn tagging_app() -> Arc<Router> {
    Arc::new(Router::new()
        .layer(IdentityTagging)
        .get("/trips", report))
}

fn proxied_app() -> Arc<Router> {
    Arc::new(Router::new()
        .layer(RequestTiming::default())
        .layer(ForwardedAuth::default())
        .layer(IdentityTagging)
        .get("/trips", report)
        .post("/account/login", report))
}

fn header<'a>(res: &'a Response, name: &str) -> &'a str {
    res.headers().get(name).and_then(|v| v.to_str().ok()).unwrap_or("missing")
}

fn as_user(principal: Principal) -> Request {
    Request::builder().path("/trips").principal(principal).build()
}

#[tokio::test]
async fn unauthenticated_request_is_absent_everywhere() {
    let res = tagging_app().call(Request::builder().path("/trips").build()).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(header(&res, "x-accessor"), "absent");
    assert_eq!(header(&res, "x-side-channel"), "absent");
    assert_eq!(header(&res, "x-lookup"), "absent");
}

#[tokio::test]
async fn numeric_name_identifier_agrees_on_all_read_paths() {
    let req = as_user(Principal::authenticated([Claim::new(NAME_IDENTIFIER, "42")]));
    let res = tagging_app().call(req).await;
    assert_eq!(header(&res, "x-accessor"), "42");
    assert_eq!(header(&res, "x-side-channel"), "42");
    assert_eq!(header(&res, "x-lookup"), "42");
    assert_eq!(header(&res, "x-lookup-stable"), "yes");
}

#[tokio::test]
async fn sub_claim_is_the_fallback() {
    let req = as_user(Principal::authenticated([Claim::new(SUBJECT, "77")]));
    let res = tagging_app().call(req).await;
    assert_eq!(header(&res, "x-accessor"), "77");
    assert_eq!(header(&res, "x-lookup"), "77");
}

#[tokio::test]
async fn guid_claim_tags_nothing() {
    let req = as_user(Principal::authenticated([
        Claim::new(NAME_IDENTIFIER, "3f2504e0-4f89-11d3-9a0c-0305e82c3301"),
    ]));
    let res = tagging_app().call(req).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(header(&res, "x-accessor"), "absent");
    assert_eq!(header(&res, "x-lookup"), "absent");
}

#[tokio::test]
async fn handler_receives_an_integer_id() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let app = Arc::new(Router::new()
        .layer(ForwardedAuth::default())
        .layer(IdentityTagging)
        .get("/trips", move |req: Request| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = Some((req.tagged_user_id(), req.current_user_id()));
                StatusCode::NO_CONTENT
            }
        }));

    let req = Request::builder().path("/trips").header("x-auth-request-user", "42").build();
    let res = app.call(req).await;

    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    let seen = seen.lock().unwrap().take();
    assert_eq!(seen, Some((Some(UserId(42)), Some(UserId(42)))));
}

#[tokio::test]
async fn anonymous_request_through_the_proxy_stack_is_absent() {
    let res = proxied_app().call(Request::builder().path("/trips").build()).await;
    assert_eq!(header(&res, "x-side-channel"), "absent");
    assert_eq!(header(&res, "x-lookup"), "absent");
}

#[tokio::test]
async fn principal_without_forwarded_headers_survives_the_proxy_stack() {
    let req = as_user(Principal::authenticated([Claim::new(NAME_IDENTIFIER, "42")]));
    let res = proxied_app().call(req).await;
    assert_eq!(header(&res, "x-accessor"), "42");
    assert_eq!(header(&res, "x-lookup"), "42");
}

#[tokio::test]
async fn forwarded_headers_replace_an_existing_principal() {
    let req = Request::builder()
        .path("/trips")
        .header("x-auth-request-user", "9")
        .principal(Principal::authenticated([Claim::new(NAME_IDENTIFIER, "42")]))
        .build();
    let res = proxied_app().call(req).await;
    assert_eq!(header(&res, "x-accessor"), "9");
}

#[tokio::test]
async fn blank_name_identifier_falls_back_to_sub_end_to_end() {
    let req = Request::builder()
        .path("/trips")
        .header("x-auth-request-user", "  ")
        .header("x-auth-request-sub", "7")
        .build();
    let res = proxied_app().call(req).await;
    assert_eq!(header(&res, "x-accessor"), "7");
    assert_eq!(header(&res, "x-lookup"), "7");
}

#[tokio::test]
async fn tagging_before_authentication_sees_nothing() {
    // Wrong order: tagging runs while the principal is still anonymous.
    let app = Arc::new(Router::new()
        .layer(IdentityTagging)
        .layer(ForwardedAuth::default())
        .get("/trips", report));

    let req = Request::builder().path("/trips").header("x-auth-request-user", "5").build();
    let res = app.call(req).await;
    assert_eq!(header(&res, "x-accessor"), "absent");
    // The helper still re-derives from the now-authenticated principal.
    assert_eq!(header(&res, "x-lookup"), "5");
}

#[tokio::test]
async fn tagging_always_continues_the_chain() {
    let app = Arc::new(Router::new()
        .layer(IdentityTagging)
        .layer(middleware::from_fn(|req, next: Next| async move {
            let mut res = next.run(req).await;
            res.headers_mut().insert("x-reached", "yes".parse().unwrap());
            res
        }))
        .get("/trips", report));

    for principal in [
        Principal::anonymous(),
        Principal::authenticated([]),
        Principal::authenticated([Claim::new(NAME_IDENTIFIER, "not-a-number")]),
        Principal::authenticated([Claim::new(NAME_IDENTIFIER, "1")]),
    ] {
        let res = app.call(as_user(principal)).await;
        assert_eq!(header(&res, "x-reached"), "yes");
        assert_eq!(res.status_code(), StatusCode::OK);
    }
}

// ── Request timing ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer { self.clone() }
}

fn capture_logs() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();
    (captured, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn auth_paths_are_timed() {
    let (logs, _guard) = capture_logs();

    let req = Request::builder()
        .method(wayfarer::Method::POST)
        .path("/Account/Login")
        .header("x-auth-request-user", "42")
        .build();
    let res = proxied_app().call(req).await;

    // Route matching is case-sensitive, timing rules are not.
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    let out = logs.contents();
    assert!(out.contains("auth request timing"), "{out}");
    assert!(out.contains("method=POST"), "{out}");
    assert!(out.contains("path=/Account/Login"), "{out}");
    assert!(out.contains("status=404"), "{out}");
    assert!(out.contains("elapsed_ms="), "{out}");
}

#[tokio::test]
async fn other_paths_are_not_timed() {
    let (logs, _guard) = capture_logs();

    let req = Request::builder().path("/trips").header("x-auth-request-user", "42").build();
    let res = proxied_app().call(req).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(header(&res, "x-accessor"), "42");
    assert!(!logs.contents().contains("auth request timing"));
}
