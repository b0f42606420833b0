//! # ServerGo
//!
//! A small HTTP file-serving daemon. The interesting part is not the file
//! transfer (that is delegated to `tower_http::services::ServeDir`) but the
//! gate in front of it:
//!
//! - **Layered configuration** — CLI flags, `SERVERGO_*` environment
//!   variables and a persisted YAML file merge with strict precedence
//!   (`cli > env > file > default`) into one immutable [`EffectiveConfig`]
//!   per process run.
//! - **Request admission** — one of four mutually exclusive strategies
//!   (`none`, `basic`, `token`, `form`) decides per request whether it may
//!   reach the file handler.
//! - **Port probing** — the requested port is tried first and a bounded
//!   fallback to OS-assigned ports keeps startup working when it is taken.
//!
//! ## Modules
//!
//! - [`config`] - CLI surface and layered configuration resolution
//! - [`auth`] - credential store, session store and the four strategies
//! - [`port`] - listening-port acquisition
//! - [`server`] - Axum router, gate middleware and the login surface
//! - [`error`] - startup error taxonomy

pub mod auth;
pub mod config;
pub mod error;
pub mod port;
pub mod server;

// Re-export commonly used types
pub use auth::{AuthDenied, AuthStrategy, CredentialStore, Session, SessionStore, Verdict};
pub use config::{
    config_file_path, load_config_file, parse_bool, resolve, save_config_file, AuthMode, Cli,
    Command, ConfigCommand, ConfigEntry, ConfigKey, EffectiveConfig, Language, LogLevel, Origin,
    Theme,
};
pub use error::{ConfigError, PortError};
pub use port::{acquire, PortBinding, MAX_FALLBACK_ATTEMPTS};
pub use server::{create_router, AppState, GateState};
