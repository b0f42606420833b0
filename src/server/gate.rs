//! The per-request admission gate.
//!
//! Every inbound request passes through here before the file-serving
//! handler. The gate itself is stateless: it evaluates the configured
//! [`AuthStrategy`] and either forwards the request unchanged or returns
//! the strategy's deny response without ever invoking the file handler.
//! All mutable state lives in the strategy's stores.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{AuthStrategy, Verdict};
use crate::config::AuthMode;

/// Shared state for the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub strategy: Arc<AuthStrategy>,
}

/// Axum middleware running the admission decision.
///
/// The decision is synchronous and constant-time relative to request size;
/// if the connection drops before it completes, the task is simply
/// abandoned — no session or other side effect is created on the deny/admit
/// path itself.
pub async fn gate_middleware(
    State(state): State<GateState>,
    request: Request,
    next: Next,
) -> Response {
    if is_exempt(request.uri().path(), state.strategy.mode()) {
        return next.run(request).await;
    }

    match state.strategy.evaluate(request.headers(), request.uri()) {
        Verdict::Admit => next.run(request).await,
        Verdict::Deny(denied) => denied.into_response(),
    }
}

/// Paths that bypass the gate: the liveness probe always, and the login
/// surface in form mode (a browser must be able to reach the form it is
/// being redirected to).
fn is_exempt(path: &str, mode: AuthMode) -> bool {
    if path == "/healthz" {
        return true;
    }
    mode == AuthMode::Form && matches!(path, "/login" | "/logout")
}
