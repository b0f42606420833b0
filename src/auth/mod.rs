//! Request authentication for ServerGo.
//!
//! Three pieces cooperate here:
//!
//! - [`CredentialStore`] holds the configured secrets, immutable after
//!   startup, and compares candidates in constant time.
//! - [`SessionStore`] tracks form-login sessions behind a mutex with lazy
//!   expiry; it exists only in form mode.
//! - [`AuthStrategy`] is the closed set of four admission rules (`none`,
//!   `basic`, `token`, `form`) evaluated per request ahead of the file
//!   handler.

pub mod credentials;
pub mod session;
pub mod strategy;

pub use credentials::CredentialStore;
pub use session::{Session, SessionStore, SESSION_COOKIE, SESSION_TTL};
pub use strategy::{AuthDenied, AuthStrategy, Verdict, BASIC_REALM};
