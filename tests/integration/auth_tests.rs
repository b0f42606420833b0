//! Basic and token mode integration tests.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use servergo::config::AuthMode;

use super::test_utils::{body_string, serve_fixture};

// =============================================================================
// None Mode
// =============================================================================

#[tokio::test]
async fn none_mode_admits_any_request() {
    let (router, _dir) = serve_fixture(AuthMode::None);

    let response = router
        .oneshot(Request::get("/hello.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response.into_body()).await;
    assert_eq!(body, "hello from servergo\n");
}

#[tokio::test]
async fn none_mode_ignores_bogus_credentials() {
    let (router, _dir) = serve_fixture(AuthMode::None);

    let response = router
        .oneshot(
            Request::get("/hello.txt")
                .header(header::AUTHORIZATION, "Basic garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Basic Mode
// =============================================================================

#[tokio::test]
async fn basic_mode_admits_correct_credentials() {
    let (router, _dir) = serve_fixture(AuthMode::Basic);

    // base64("admin:secret")
    let response = router
        .oneshot(
            Request::get("/hello.txt")
                .header(header::AUTHORIZATION, "Basic YWRtaW46c2VjcmV0")
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
async fn basic_mode_denies_wrong_password_with_challenge() {
    let (router, _dir) = serve_fixture(AuthMode::Basic);

    // base64("admin:wrong")
    let response = router
        .oneshot(
            Request::get("/hello.txt")
                .header(header::AUTHORIZATION, "Basic YWRtaW46d3Jvbmc=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .expect("challenge header")
        .to_str()
        .unwrap();
    assert!(challenge.starts_with("Basic "));
}

#[tokio::test]
async fn basic_mode_challenges_requests_without_credentials() {
    let (router, _dir) = serve_fixture(AuthMode::Basic);

    let response = router
        .oneshot(Request::get("/hello.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
}

// =============================================================================
// Token Mode
// =============================================================================

#[tokio::test]
async fn token_mode_admits_bearer_header() {
    let (router, _dir) = serve_fixture(AuthMode::Token);

    let response = router
        .oneshot(
            Request::get("/hello.txt")
                .header(header::AUTHORIZATION, "Bearer abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_mode_admits_query_parameter() {
    let (router, _dir) = serve_fixture(AuthMode::Token);

    let response = router
        .oneshot(
            Request::get("/hello.txt?token=abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_mode_denies_wrong_query_token_without_challenge() {
    let (router, _dir) = serve_fixture(AuthMode::Token);

    let response = router
        .oneshot(
            Request::get("/hello.txt?token=wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // token mode never announces a challenge scheme
    assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn token_mode_header_beats_query_parameter() {
    let (router, _dir) = serve_fixture(AuthMode::Token);

    // wrong header, right query: the header wins and the request is denied
    let response = router
        .oneshot(
            Request::get("/hello.txt?token=abc123")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_mode_denies_missing_token() {
    let (router, _dir) = serve_fixture(AuthMode::Token);

    let response = router
        .oneshot(Request::get("/hello.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
