//! Configured authentication secrets.
//!
//! The store is built once from the effective configuration and is read-only
//! afterwards. Both checks compare with constant-time equality so that a
//! request cannot probe the secret one byte at a time. Construction fails
//! when the selected auth mode requires credentials that are empty or unset:
//! a server that was explicitly asked to authenticate must never silently
//! run unprotected.

use subtle::ConstantTimeEq;

use crate::config::{AuthMode, EffectiveConfig};
use crate::error::ConfigError;

/// The configured secret for the selected auth mode.
#[derive(Debug, Clone)]
enum Credential {
    /// Username/password pair (basic and form modes).
    Pair { username: String, password: String },
    /// Opaque pre-shared token (token mode).
    Token(String),
}

/// Holder of the configured authentication secrets.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credential: Credential,
}

impl CredentialStore {
    /// Build the store for the configured auth mode.
    ///
    /// Errors when required credentials are missing, or when credentials for
    /// a different mode are also supplied: the four modes are mutually
    /// exclusive and mixing their secrets is treated as a configuration
    /// mistake rather than guessed around.
    pub fn from_config(config: &EffectiveConfig) -> Result<Self, ConfigError> {
        match config.auth_mode {
            AuthMode::None => Err(ConfigError::ConflictingCredentials {
                reason: "auth mode `none` takes no credential store".to_string(),
            }),
            AuthMode::Basic | AuthMode::Form => {
                let mode = config.auth_mode.as_str();
                if config.token.is_some() {
                    return Err(ConfigError::ConflictingCredentials {
                        reason: format!(
                            "a token was supplied but auth mode is `{mode}`; \
                             tokens belong to `token` mode"
                        ),
                    });
                }
                let username = require(config.username.as_deref(), mode, "username")?;
                let password = require(config.password.as_deref(), mode, "password")?;
                Ok(Self {
                    credential: Credential::Pair { username, password },
                })
            }
            AuthMode::Token => {
                if config.username.is_some() || config.password.is_some() {
                    return Err(ConfigError::ConflictingCredentials {
                        reason: "a username/password was supplied but auth mode is `token`; \
                                 pairs belong to `basic` or `form` mode"
                            .to_string(),
                    });
                }
                let token = require(config.token.as_deref(), "token", "token")?;
                Ok(Self {
                    credential: Credential::Token(token),
                })
            }
        }
    }

    /// Check a username/password pair. Empty candidates are never accepted.
    pub fn verify_basic(&self, username: &str, password: &str) -> bool {
        if username.is_empty() || password.is_empty() {
            return false;
        }
        match &self.credential {
            Credential::Pair {
                username: expected_user,
                password: expected_pass,
            } => {
                // Evaluate both comparisons before combining so a wrong
                // username does not short-circuit the password check.
                let user_ok = ct_eq(username, expected_user);
                let pass_ok = ct_eq(password, expected_pass);
                user_ok & pass_ok
            }
            Credential::Token(_) => false,
        }
    }

    /// Check a candidate token. Empty candidates are never accepted.
    pub fn verify_token(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        match &self.credential {
            Credential::Token(expected) => ct_eq(candidate, expected),
            Credential::Pair { .. } => false,
        }
    }

    /// Configured username, if this store holds a pair.
    pub fn username(&self) -> Option<&str> {
        match &self.credential {
            Credential::Pair { username, .. } => Some(username),
            Credential::Token(_) => None,
        }
    }
}

fn require(
    value: Option<&str>,
    mode: &'static str,
    field: &'static str,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::MissingCredential { mode, field }),
    }
}

/// Constant-time string equality.
fn ct_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

// =============================================================================
// Tests
// =============================================================================
