//! The four authentication strategies.
//!
//! A strategy is a closed tagged variant selected once from the effective
//! configuration. Given an inbound request's headers and URI it produces a
//! verdict: admit, or deny with a concrete response (401 challenge, bare
//! 401, or a redirect to the login form). Adding a mode means adding a
//! variant and its rule here, not threading conditionals through the
//! request path.
//!
//! # Mode behavior
//!
//! | Mode  | Admit condition                                   | Deny response |
//! |-------|---------------------------------------------------|---------------|
//! | none  | always                                            | n/a           |
//! | basic | `Authorization: Basic` decodes to accepted pair   | 401 + `WWW-Authenticate: Basic` |
//! | token | bearer header (precedence) or `?token=` accepted  | 401, no challenge |
//! | form  | unexpired session cookie                          | redirect to `/login` |

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{debug, warn};

use crate::config::{AuthMode, EffectiveConfig};
use crate::error::ConfigError;

use super::credentials::CredentialStore;
use super::session::{SessionStore, SESSION_COOKIE};

/// Realm announced in the basic-auth challenge.
pub const BASIC_REALM: &str = "ServerGo Protected Area";

// =============================================================================
// Verdict
// =============================================================================

/// Outcome of evaluating a request against the configured strategy.
#[derive(Debug)]
pub enum Verdict {
    /// Forward the request unchanged to the file handler.
    Admit,
    /// Stop here and answer with the denial response.
    Deny(AuthDenied),
}

/// Per-request denial. Non-fatal by construction: it becomes a response to
/// the requesting client and never crashes the process or other in-flight
/// requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDenied {
    /// No usable `Authorization: Basic` header was presented.
    MissingBasicCredentials,
    /// A pair was presented but rejected.
    InvalidBasicCredentials,
    /// Neither a bearer header nor a `token` query parameter was presented.
    MissingToken,
    /// A token was presented but rejected.
    InvalidToken,
    /// No valid session; the browser is sent to the login form.
    LoginRequired {
        /// Originally requested path (and query), replayed after login.
        next: String,
    },
}

impl IntoResponse for AuthDenied {
    fn into_response(self) -> Response {
        match &self {
            AuthDenied::MissingBasicCredentials => {
                debug!("denied: no basic credentials presented");
            }
            AuthDenied::InvalidBasicCredentials => {
                // Wrong credentials may indicate probing
                warn!("denied: invalid basic credentials");
            }
            AuthDenied::MissingToken => debug!("denied: no token presented"),
            AuthDenied::InvalidToken => warn!("denied: invalid token"),
            AuthDenied::LoginRequired { next } => {
                debug!(next = %next, "denied: login required");
            }
        }

        match self {
            AuthDenied::MissingBasicCredentials | AuthDenied::InvalidBasicCredentials => (
                StatusCode::UNAUTHORIZED,
                [(
                    header::WWW_AUTHENTICATE,
                    format!("Basic realm=\"{BASIC_REALM}\""),
                )],
                Json(serde_json::json!({ "error": "unauthorized" })),
            )
                .into_response(),
            AuthDenied::MissingToken | AuthDenied::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "unauthorized" })),
            )
                .into_response(),
            AuthDenied::LoginRequired { next } => {
                let location = format!("/login?next={}", urlencoding::encode(&next));
                Redirect::to(&location).into_response()
            }
        }
    }
}

// =============================================================================
// Strategy
// =============================================================================

/// The configured admission strategy, one of the four closed variants.
#[derive(Debug)]
pub enum AuthStrategy {
    /// Every request is admitted.
    None,
    /// HTTP Basic authentication.
    Basic { store: CredentialStore },
    /// Pre-shared token via bearer header or query parameter.
    Token { store: CredentialStore },
    /// Form login with cookie-tracked sessions.
    Form {
        store: CredentialStore,
        sessions: SessionStore,
    },
}

impl AuthStrategy {
    /// Build the strategy (and its stores) for the configured mode.
    pub fn from_config(config: &EffectiveConfig) -> Result<Arc<Self>, ConfigError> {
        let strategy = match config.auth_mode {
            AuthMode::None => AuthStrategy::None,
            AuthMode::Basic => AuthStrategy::Basic {
                store: CredentialStore::from_config(config)?,
            },
            AuthMode::Token => AuthStrategy::Token {
                store: CredentialStore::from_config(config)?,
            },
            AuthMode::Form => AuthStrategy::Form {
                store: CredentialStore::from_config(config)?,
                sessions: SessionStore::new(),
            },
        };
        Ok(Arc::new(strategy))
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            AuthStrategy::None => AuthMode::None,
            AuthStrategy::Basic { .. } => AuthMode::Basic,
            AuthStrategy::Token { .. } => AuthMode::Token,
            AuthStrategy::Form { .. } => AuthMode::Form,
        }
    }

    /// Session store, present only in form mode.
    pub fn sessions(&self) -> Option<&SessionStore> {
        match self {
            AuthStrategy::Form { sessions, .. } => Some(sessions),
            _ => None,
        }
    }

    /// Credential store, present in every mode but `none`.
    pub fn credentials(&self) -> Option<&CredentialStore> {
        match self {
            AuthStrategy::None => None,
            AuthStrategy::Basic { store }
            | AuthStrategy::Token { store }
            | AuthStrategy::Form { store, .. } => Some(store),
        }
    }

    /// Decide whether a request may reach the file handler.
    ///
    /// Synchronous and free of I/O; the decision depends only on the
    /// request's headers/URI and the read-only (or mutex-guarded) stores.
    pub fn evaluate(&self, headers: &HeaderMap, uri: &Uri) -> Verdict {
        match self {
            AuthStrategy::None => Verdict::Admit,

            AuthStrategy::Basic { store } => match basic_credentials(headers) {
                Some((username, password)) => {
                    if store.verify_basic(&username, &password) {
                        Verdict::Admit
                    } else {
                        Verdict::Deny(AuthDenied::InvalidBasicCredentials)
                    }
                }
                None => Verdict::Deny(AuthDenied::MissingBasicCredentials),
            },

            AuthStrategy::Token { store } => {
                // The header takes precedence over the query parameter:
                // headers are less likely to leak via logs or history.
                let candidate = bearer_token(headers).or_else(|| query_param(uri, "token"));
                match candidate {
                    Some(token) => {
                        if store.verify_token(&token) {
                            Verdict::Admit
                        } else {
                            Verdict::Deny(AuthDenied::InvalidToken)
                        }
                    }
                    None => Verdict::Deny(AuthDenied::MissingToken),
                }
            }

            AuthStrategy::Form { sessions, .. } => {
                let admitted = cookie_value(headers, SESSION_COOKIE)
                    .and_then(|id| sessions.validate(&id))
                    .is_some();
                if admitted {
                    Verdict::Admit
                } else {
                    Verdict::Deny(AuthDenied::LoginRequired {
                        next: uri
                            .path_and_query()
                            .map(|pq| pq.as_str().to_string())
                            .unwrap_or_else(|| "/".to_string()),
                    })
                }
            }
        }
    }
}

// =============================================================================
// Request Parsing Helpers
// =============================================================================

/// Decode an `Authorization: Basic <base64(user:pass)>` header. Any
/// malformed header (bad base64, no colon, not UTF-8) yields `None` and is
/// treated as missing credentials, never as a server error.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Extract a bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}

/// Extract a query parameter from the request URI.
fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == name {
            return urlencoding::decode(value).ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Extract a cookie value from the `Cookie` header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in value.split(';') {
        let Some((key, val)) = part.trim().split_once('=') else {
            continue;
        };
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
