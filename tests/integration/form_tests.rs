//! Form login flow integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use servergo::auth::{SessionStore, SESSION_COOKIE};
use servergo::config::AuthMode;
use servergo::{AuthStrategy, CredentialStore};

use super::test_utils::{
    body_string, serve_fixture, serve_fixture_with_strategy, test_config, TEST_PASS, TEST_USER,
};

/// Pull the session cookie pair (`name=id`) out of a login response.
fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with(SESSION_COOKIE));
    set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim()
        .to_string()
}

fn login_request(username: &str, password: &str, next: &str) -> Request<Body> {
    let body = format!(
        "username={}&password={}&next={}",
        urlencoding::encode(username),
        urlencoding::encode(password),
        urlencoding::encode(next)
    );
    Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn unauthenticated_request_redirects_to_login_with_next() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let response = router
        .oneshot(
            Request::get("/docs/readme.md?x=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(location, "/login?next=%2Fdocs%2Freadme.md%3Fx%3D1");
}

#[tokio::test]
async fn login_page_is_reachable_without_a_session() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let response = router
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("<form method=\"post\" action=\"/login\">"));
    assert!(!body.contains("Invalid username or password"));
}

#[tokio::test]
async fn login_page_shows_an_error_banner_after_a_failed_attempt() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let response = router
        .oneshot(Request::get("/login?error=1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("Invalid username or password"));
}

#[tokio::test]
async fn successful_login_sets_a_cookie_and_redirects_to_next() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let response = router
        .oneshot(login_request(TEST_USER, TEST_PASS, "/hello.txt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap(),
        "/hello.txt"
    );

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
}

#[tokio::test]
async fn session_cookie_from_login_admits_subsequent_requests() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let login = router
        .clone()
        .oneshot(login_request(TEST_USER, TEST_PASS, "/hello.txt"))
        .await
        .unwrap();
    let cookie = session_cookie(&login);

    let response = router
        .oneshot(
            Request::get("/hello.txt")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response.into_body()).await,
        "hello from servergo\n"
    );
}

#[tokio::test]
async fn wrong_credentials_redirect_back_to_the_form() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let response = router
        .oneshot(login_request(TEST_USER, "wrong", "/hello.txt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("/login?error=1"));
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn open_redirect_targets_are_rewritten_to_root() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let response = router
        .oneshot(login_request(TEST_USER, TEST_PASS, "https://evil.example"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap(),
        "/"
    );
}

#[tokio::test]
async fn expired_session_is_rejected() {
    // Build a form strategy with a zero TTL so every session is already
    // expired by the time it is presented.
    let config = test_config(AuthMode::Form, std::path::Path::new("."));
    let strategy = Arc::new(AuthStrategy::Form {
        store: CredentialStore::from_config(&config).unwrap(),
        sessions: SessionStore::with_ttl(Duration::ZERO),
    });
    let (router, _dir) = serve_fixture_with_strategy(AuthMode::Form, strategy);

    let login = router
        .clone()
        .oneshot(login_request(TEST_USER, TEST_PASS, "/hello.txt"))
        .await
        .unwrap();
    let cookie = session_cookie(&login);

    let response = router
        .oneshot(
            Request::get("/hello.txt")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("/login?next="));
}

#[tokio::test]
async fn cookie_max_age_matches_the_store_ttl() {
    let config = test_config(AuthMode::Form, std::path::Path::new("."));
    let strategy = Arc::new(AuthStrategy::Form {
        store: CredentialStore::from_config(&config).unwrap(),
        sessions: SessionStore::with_ttl(Duration::from_secs(60)),
    });
    let (router, _dir) = serve_fixture_with_strategy(AuthMode::Form, strategy);

    let response = router
        .oneshot(login_request(TEST_USER, TEST_PASS, "/"))
        .await
        .unwrap();

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=60"), "{set_cookie}");
}

#[tokio::test]
async fn logout_invalidates_the_session_and_clears_the_cookie() {
    let (router, _dir) = serve_fixture(AuthMode::Form);

    let login = router
        .clone()
        .oneshot(login_request(TEST_USER, TEST_PASS, "/hello.txt"))
        .await
        .unwrap();
    let cookie = session_cookie(&login);

    let logout = router
        .clone()
        .oneshot(
            Request::get("/logout")
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    let clear = logout
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(clear.contains("Max-Age=0"));

    // The old cookie no longer admits
    let response = router
        .oneshot(
            Request::get("/hello.txt")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_route_is_absent_outside_form_mode() {
    let (router, _dir) = serve_fixture(AuthMode::None);

    // No /login route is mounted; the path falls through to the file
    // handler and misses.
    let response = router
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
