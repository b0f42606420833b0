use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving the effective configuration.
///
/// All of these are fatal at startup: the process exits before binding
/// any socket, so it never runs with an ambiguous configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A key received a value that does not parse as its declared type
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// An enumerated key received a value outside its closed set
    #[error("invalid value `{value}` for `{key}`: expected one of {expected}")]
    InvalidEnum {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    /// The selected auth mode requires a credential that is empty or unset
    #[error("auth mode `{mode}` requires a non-empty {field}")]
    MissingCredential {
        mode: &'static str,
        field: &'static str,
    },

    /// Credentials for two different auth modes were supplied together
    #[error("conflicting credentials: {reason}")]
    ConflictingCredentials { reason: String },

    /// The persisted config file exists but could not be read or parsed
    #[error("failed to load config file {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    /// A config command referenced a key outside the recognized set
    #[error("unknown configuration key `{key}`")]
    UnknownKey { key: String },
}

/// Errors raised while acquiring a listening port.
#[derive(Debug, Error)]
pub enum PortError {
    /// Neither the requested port nor any OS-assigned fallback could be bound
    #[error(
        "could not bind port {requested} nor obtain an OS-assigned port \
         after {attempts} attempts: {source}"
    )]
    Exhausted {
        requested: u16,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// A listener bound but its local address could not be read
    #[error("listener bound but its local address could not be read: {source}")]
    AddrLookup {
        #[source]
        source: std::io::Error,
    },
}
