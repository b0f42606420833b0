//! Router assembly.
//!
//! # Route structure
//!
//! ```text
//! /healthz          - liveness probe (public)
//! /login            - login form + credential exchange (form mode only)
//! /logout           - session teardown (form mode only)
//! /*                - static files via ServeDir, behind the gate
//! ```
//!
//! The gate middleware wraps the whole router, including the static
//! fallback, so no file request can bypass the admission decision.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::AuthStrategy;
use crate::config::{AuthMode, EffectiveConfig};

use super::gate::{gate_middleware, GateState};
use super::handlers::{
    health_handler, login_page_handler, login_submit_handler, logout_handler, AppState,
};

/// Build the application router for the resolved configuration.
pub fn create_router(config: Arc<EffectiveConfig>, strategy: Arc<AuthStrategy>) -> Router {
    let state = AppState {
        config: Arc::clone(&config),
        strategy: Arc::clone(&strategy),
    };

    let serve_dir = ServeDir::new(&config.directory).append_index_html_on_directories(true);

    let mut router = Router::new().route("/healthz", get(health_handler));

    if config.auth_mode == AuthMode::Form {
        router = router
            .route("/login", get(login_page_handler).post(login_submit_handler))
            .route("/logout", get(logout_handler).post(logout_handler));
    }

    router
        .fallback_service(serve_dir)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            GateState { strategy },
            gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
