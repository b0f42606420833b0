//! Gate middleware integration tests: exemptions and file serving.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use servergo::config::AuthMode;

use super::test_utils::{body_string, serve_fixture};

#[tokio::test]
async fn healthz_is_public_in_every_mode() {
    for mode in [
        AuthMode::None,
        AuthMode::Basic,
        AuthMode::Token,
        AuthMode::Form,
    ] {
        let (router, _dir) = serve_fixture(mode);

        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "mode {mode:?}");
        let body = body_string(response.into_body()).await;
        assert_eq!(body, r#"{"status":"ok"}"#);
    }
}

#[tokio::test]
async fn static_files_are_served_through_the_gate() {
    let (router, _dir) = serve_fixture(AuthMode::None);

    let response = router
        .oneshot(Request::get("/hello.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response.into_body()).await,
        "hello from servergo\n"
    );
}

#[tokio::test]
async fn missing_files_yield_404_once_admitted() {
    let (router, _dir) = serve_fixture(AuthMode::None);

    let response = router
        .oneshot(Request::get("/no-such-file").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn denied_requests_never_reach_the_file_handler() {
    let (router, _dir) = serve_fixture(AuthMode::Basic);

    // Even for a file that does not exist the answer is the auth denial,
    // not a 404, so the tree's layout is not observable without credentials.
    let response = router
        .oneshot(Request::get("/no-such-file").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_path_is_gated_outside_form_mode() {
    let (router, _dir) = serve_fixture(AuthMode::Basic);

    let response = router
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // basic mode has no login exemption: the gate challenges first
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
}
