//! HTTP handlers for the login surface and liveness probe.
//!
//! The file handler itself is `tower_http::services::ServeDir`, wired in as
//! the router fallback; everything here exists to feed the admission gate:
//! the form-login page, the credential exchange that mints a session
//! cookie, and logout.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{strategy::cookie_value, AuthStrategy, SESSION_COOKIE};
use crate::config::{AuthMode, EffectiveConfig};

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EffectiveConfig>,
    pub strategy: Arc<AuthStrategy>,
}

// =============================================================================
// Liveness
// =============================================================================

/// Response body of the liveness probe.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /healthz` — liveness probe, exempt from the gate.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Login Form
// =============================================================================

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    /// Present after a failed attempt.
    #[serde(default)]
    pub error: Option<String>,
    /// Path to return to after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

/// Form fields of a login submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// `GET /login` — render the login form.
pub async fn login_page_handler(
    State(state): State<AppState>,
    Query(params): Query<LoginPageQuery>,
) -> Response {
    if state.strategy.mode() != AuthMode::Form {
        return StatusCode::NOT_FOUND.into_response();
    }
    if !state.config.login_page {
        // Form mode without the HTML page still authenticates via POST
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "login required" })),
        )
            .into_response();
    }

    let next = safe_next(params.next.as_deref());
    Html(render_login_page(params.error.is_some(), &next)).into_response()
}

/// `POST /login` — exchange credentials for a session cookie.
pub async fn login_submit_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let (Some(store), Some(sessions)) = (state.strategy.credentials(), state.strategy.sessions())
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let next = safe_next(form.next.as_deref());

    if !store.verify_basic(&form.username, &form.password) {
        warn!(username = %form.username, "login rejected");
        let location = format!("/login?error=1&next={}", urlencoding::encode(&next));
        return Redirect::to(&location).into_response();
    }

    let session = sessions.create(&form.username);
    info!(username = %form.username, "login succeeded");

    // Max-Age mirrors the store's TTL so the browser and the server agree
    // on when the session stops being honored.
    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id,
        sessions.ttl().as_secs()
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to(&next)).into_response()
}

/// `GET|POST /logout` — destroy the session and clear the cookie.
pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(sessions) = state.strategy.sessions() {
        if let Some(id) = cookie_value(&headers, SESSION_COOKIE) {
            sessions.invalidate(&id);
            debug!("session invalidated on logout");
        }
    }

    let clear = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    ([(header::SET_COOKIE, clear)], Redirect::to("/login")).into_response()
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate a post-login redirect target. Only local absolute paths are
/// honored; anything else (external URLs, protocol-relative `//host`)
/// falls back to the root so the login form cannot be used as an open
/// redirector.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

fn render_login_page(show_error: bool, next: &str) -> String {
    let error_banner = if show_error {
        "<p class=\"error\">Invalid username or password.</p>"
    } else {
        ""
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>ServerGo &mdash; Sign in</title>
  <style>
    body {{ font-family: system-ui, sans-serif; display: flex; justify-content: center;
           align-items: center; min-height: 100vh; margin: 0; background: #f5f5f5; }}
    form {{ background: #fff; padding: 2rem; border-radius: 8px;
            box-shadow: 0 1px 4px rgba(0,0,0,.15); width: 280px; }}
    label {{ display: block; margin-top: 1rem; font-size: .9rem; }}
    input {{ width: 100%; padding: .5rem; margin-top: .25rem; box-sizing: border-box; }}
    button {{ margin-top: 1.5rem; width: 100%; padding: .6rem; }}
    .error {{ color: #b00020; font-size: .9rem; }}
  </style>
</head>
<body>
  <form method="post" action="/login">
    <h1>Sign in</h1>
    {error_banner}
    <label>Username <input type="text" name="username" autofocus required></label>
    <label>Password <input type="password" name="password" required></label>
    <input type="hidden" name="next" value="{next}">
    <button type="submit">Sign in</button>
  </form>
</body>
</html>
"#,
        next = html_escape(next),
    )
}

/// Minimal attribute-value escaping for the hidden `next` field.
fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// =============================================================================
// Tests
// =============================================================================
