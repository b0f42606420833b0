//! Test utilities for integration tests.
//!
//! Builds routers over a temporary served directory with a couple of known
//! files, for each auth mode.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;

use servergo::config::{AuthMode, EffectiveConfig, Language, LogLevel, Theme};
use servergo::{create_router, AuthStrategy};

pub const TEST_USER: &str = "admin";
pub const TEST_PASS: &str = "secret";
pub const TEST_TOKEN: &str = "abc123";

/// A fully resolved configuration pointing at `dir`, with credentials
/// filled in for the given mode.
pub fn test_config(mode: AuthMode, dir: &Path) -> EffectiveConfig {
    EffectiveConfig {
        port: 0,
        directory: dir.to_path_buf(),
        auth_mode: mode,
        username: matches!(mode, AuthMode::Basic | AuthMode::Form)
            .then(|| TEST_USER.to_string()),
        password: matches!(mode, AuthMode::Basic | AuthMode::Form)
            .then(|| TEST_PASS.to_string()),
        token: matches!(mode, AuthMode::Token).then(|| TEST_TOKEN.to_string()),
        login_page: true,
        theme: Theme::Default,
        language: Language::En,
        auto_open: false,
        dir_listing: true,
        log_level: LogLevel::Info,
        log_persistence: false,
    }
}

/// Serve a fresh temp directory containing `hello.txt`. The `TempDir` must
/// stay alive for the duration of the test.
pub fn serve_fixture(mode: AuthMode) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello from servergo\n").unwrap();

    let config = Arc::new(test_config(mode, dir.path()));
    let strategy = AuthStrategy::from_config(&config).unwrap();
    (create_router(config, strategy), dir)
}

/// Serve a fixture with a caller-supplied strategy (used for short-TTL
/// session tests).
pub fn serve_fixture_with_strategy(
    mode: AuthMode,
    strategy: Arc<AuthStrategy>,
) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello from servergo\n").unwrap();

    let config = Arc::new(test_config(mode, dir.path()));
    (create_router(config, strategy), dir)
}

/// Collect a response body into a string.
pub async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
