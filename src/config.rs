//! Configuration resolution for ServerGo.
//!
//! Every recognized key can be supplied by four layered sources, merged with
//! strict precedence into one immutable [`EffectiveConfig`] per process run:
//!
//! ```text
//! cli > env > file > default
//! ```
//!
//! - CLI flags are parsed with clap (`-p/--port`, `-a/--auth`, ...).
//! - Environment variables use the `SERVERGO_` prefix with the key upper-cased
//!   and hyphens translated to underscores (`auto-open` → `SERVERGO_AUTO_OPEN`).
//! - The persisted file is a YAML key/value document at
//!   `~/.servergo/config.yaml`; unknown keys are ignored.
//!
//! Resolution is pure and deterministic: identical inputs always yield an
//! identical `EffectiveConfig`, and nothing is ever re-resolved afterwards.
//! Invalid values abort resolution before any socket is bound.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Prefix for every recognized environment variable.
pub const ENV_PREFIX: &str = "SERVERGO_";

/// Directory under the user's home holding persisted state.
pub const CONFIG_DIR_NAME: &str = ".servergo";

/// File name of the persisted configuration document.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// File name used when log persistence is enabled.
pub const LOG_FILE_NAME: &str = "servergo.log";

/// Default port; 0 asks the OS for any free port.
pub const DEFAULT_PORT: u16 = 0;

/// Default served directory.
pub const DEFAULT_DIRECTORY: &str = ".";

// =============================================================================
// CLI Arguments
// =============================================================================

/// ServerGo - a small HTTP file-serving daemon.
///
/// Serves a local directory over HTTP behind a configurable request gate
/// (none, HTTP Basic, pre-shared token, or form login).
///
/// Boolean flags accept an optional textual value (`--open=no`); omitting the
/// value means `true`. Flags are kept as raw strings here so that all sources
/// flow through the same typed parser in [`resolve`].
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "servergo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Maintenance subcommand; without one, the server starts.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Port to listen on (0 = ask the OS for a free port).
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Directory to serve.
    #[arg(short = 'd', long)]
    pub dir: Option<PathBuf>,

    /// Authentication mode: none, basic, token or form.
    #[arg(short = 'a', long, value_name = "MODE")]
    pub auth: Option<String>,

    /// Username for basic/form authentication.
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Password for basic/form authentication.
    #[arg(short = 'w', long)]
    pub password: Option<String>,

    /// Pre-shared token for token authentication.
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// Serve the HTML login page in form mode.
    #[arg(short = 'l', long = "login-page", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub login_page: Option<String>,

    /// Directory listing theme (handed to the listing renderer).
    #[arg(short = 'm', long)]
    pub theme: Option<String>,

    /// Interface language.
    #[arg(long)]
    pub language: Option<String>,

    /// Open the browser once the server is listening.
    #[arg(short = 'o', long = "open", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub open: Option<String>,

    /// Enable directory listings.
    #[arg(long = "dir-list", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub dir_list: Option<String>,

    /// Log level: debug, info, warn or error.
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also write logs to ~/.servergo/servergo.log.
    #[arg(long = "enable-log-persistence", value_name = "BOOL",
          num_args = 0..=1, default_missing_value = "true")]
    pub enable_log_persistence: Option<String>,
}

/// Top-level maintenance subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Inspect or edit the persisted configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Operations on `~/.servergo/config.yaml`. These are the only writers of
/// the file; resolution itself never touches it.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print every recognized key with its persisted or default value.
    List,
    /// Print the value of one key.
    Get { key: String },
    /// Validate a value and persist it.
    Set { key: String, value: String },
}

// =============================================================================
// Keys and Origins
// =============================================================================

/// A recognized configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Port,
    Dir,
    Auth,
    Username,
    Password,
    Token,
    LoginPage,
    Theme,
    Language,
    AutoOpen,
    DirListing,
    LogLevel,
    LogPersistence,
}

impl ConfigKey {
    /// Every recognized key, in documentation order.
    pub const ALL: [ConfigKey; 13] = [
        ConfigKey::Port,
        ConfigKey::Dir,
        ConfigKey::Auth,
        ConfigKey::Username,
        ConfigKey::Password,
        ConfigKey::Token,
        ConfigKey::LoginPage,
        ConfigKey::Theme,
        ConfigKey::Language,
        ConfigKey::AutoOpen,
        ConfigKey::DirListing,
        ConfigKey::LogLevel,
        ConfigKey::LogPersistence,
    ];

    /// Canonical key name as used in the config file.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Port => "port",
            ConfigKey::Dir => "dir",
            ConfigKey::Auth => "auth",
            ConfigKey::Username => "username",
            ConfigKey::Password => "password",
            ConfigKey::Token => "token",
            ConfigKey::LoginPage => "login-page",
            ConfigKey::Theme => "theme",
            ConfigKey::Language => "language",
            ConfigKey::AutoOpen => "auto-open",
            ConfigKey::DirListing => "enable-dir-listing",
            ConfigKey::LogLevel => "log-level",
            ConfigKey::LogPersistence => "enable-log-persistence",
        }
    }

    /// Look a key up by its canonical name.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == name)
            .ok_or_else(|| ConfigError::UnknownKey {
                key: name.to_string(),
            })
    }

    /// Environment variable name for this key
    /// (`auto-open` → `SERVERGO_AUTO_OPEN`).
    pub fn env_var(&self) -> String {
        format!(
            "{}{}",
            ENV_PREFIX,
            self.as_str().to_uppercase().replace('-', "_")
        )
    }

    /// Built-in default value, if the key has one. Credentials have none:
    /// an unset credential stays unset.
    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            ConfigKey::Port => Some("0"),
            ConfigKey::Dir => Some(DEFAULT_DIRECTORY),
            ConfigKey::Auth => Some("none"),
            ConfigKey::Username | ConfigKey::Password | ConfigKey::Token => None,
            ConfigKey::LoginPage => Some("true"),
            ConfigKey::Theme => Some("default"),
            ConfigKey::Language => Some("en"),
            ConfigKey::AutoOpen => Some("true"),
            ConfigKey::DirListing => Some("true"),
            ConfigKey::LogLevel => Some("info"),
            ConfigKey::LogPersistence => Some("false"),
        }
    }

    /// Check a candidate value against the key's declared type, using the
    /// same parsers that resolution uses. Free-form keys accept anything.
    pub fn validate_value(&self, value: &str) -> Result<(), ConfigError> {
        match self {
            ConfigKey::Port => value
                .parse::<u16>()
                .map(|_| ())
                .map_err(|e| ConfigError::InvalidValue {
                    key: self.as_str(),
                    value: value.to_string(),
                    reason: e.to_string(),
                }),
            ConfigKey::Dir | ConfigKey::Username | ConfigKey::Password | ConfigKey::Token => Ok(()),
            ConfigKey::Auth => AuthMode::parse(value).map(|_| ()),
            ConfigKey::Theme => Theme::parse(value).map(|_| ()),
            ConfigKey::Language => Language::parse(value).map(|_| ()),
            ConfigKey::LogLevel => LogLevel::parse(value).map(|_| ()),
            ConfigKey::LoginPage
            | ConfigKey::AutoOpen
            | ConfigKey::DirListing
            | ConfigKey::LogPersistence => {
                parse_bool(value)
                    .map(|_| ())
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: self.as_str(),
                        value: value.to_string(),
                        reason: "expected a boolean (true/yes/y/1/on or false/no/n/0/off)"
                            .to_string(),
                    })
            }
        }
    }
}

/// Where a configuration value came from. Ordering is precedence:
/// `Cli` beats `Env` beats `File` beats `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    Cli,
    Env,
    File,
    Default,
}

/// A single `(key, value, origin)` triple consumed by the resolver.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub key: ConfigKey,
    pub value: String,
    pub origin: Origin,
}

/// The ordered set of entries gathered from all sources.
#[derive(Debug, Default)]
struct Sources {
    entries: Vec<ConfigEntry>,
}

impl Sources {
    fn push(&mut self, key: ConfigKey, value: impl Into<String>, origin: Origin) {
        self.entries.push(ConfigEntry {
            key,
            value: value.into(),
            origin,
        });
    }

    /// For a given key, the entry with the highest-precedence origin present.
    fn lookup(&self, key: ConfigKey) -> Option<&ConfigEntry> {
        self.entries
            .iter()
            .filter(|e| e.key == key)
            .min_by_key(|e| e.origin)
    }
}

// =============================================================================
// Enumerated Keys
// =============================================================================

/// The four mutually exclusive authentication strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    None,
    Basic,
    Token,
    Form,
}

impl AuthMode {
    const EXPECTED: &'static str = "none, basic, token, form";

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Basic => "basic",
            AuthMode::Token => "token",
            AuthMode::Form => "form",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "none" => Ok(AuthMode::None),
            "basic" => Ok(AuthMode::Basic),
            "token" => Ok(AuthMode::Token),
            "form" => Ok(AuthMode::Form),
            _ => Err(ConfigError::InvalidEnum {
                key: ConfigKey::Auth.as_str(),
                value: value.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// Directory listing themes accepted by the (out-of-scope) listing renderer.
/// The resolver only validates membership; rendering happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Default,
    Dark,
    Blue,
    Green,
    Retro,
    Json,
    Table,
    Modern,
    Material,
    Minimal,
}

impl Theme {
    const EXPECTED: &'static str =
        "default, dark, blue, green, retro, json, table, modern, material, minimal";

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Dark => "dark",
            Theme::Blue => "blue",
            Theme::Green => "green",
            Theme::Retro => "retro",
            Theme::Json => "json",
            Theme::Table => "table",
            Theme::Modern => "modern",
            Theme::Material => "material",
            Theme::Minimal => "minimal",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "default" => Ok(Theme::Default),
            "dark" => Ok(Theme::Dark),
            "blue" => Ok(Theme::Blue),
            "green" => Ok(Theme::Green),
            "retro" => Ok(Theme::Retro),
            "json" => Ok(Theme::Json),
            "table" => Ok(Theme::Table),
            "modern" => Ok(Theme::Modern),
            "material" => Ok(Theme::Material),
            "minimal" => Ok(Theme::Minimal),
            _ => Err(ConfigError::InvalidEnum {
                key: ConfigKey::Theme.as_str(),
                value: value.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// Interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    ZhCn,
}

impl Language {
    const EXPECTED: &'static str = "en, zh-CN";

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::ZhCn => "zh-CN",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "en" => Ok(Language::En),
            "zh-CN" => Ok(Language::ZhCn),
            _ => Err(ConfigError::InvalidEnum {
                key: ConfigKey::Language.as_str(),
                value: value.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// Log verbosity. `warning` is accepted as an alias for `warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const EXPECTED: &'static str = "debug, info, warn, error";

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidEnum {
                key: ConfigKey::LogLevel.as_str(),
                value: value.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

// =============================================================================
// Effective Configuration
// =============================================================================

/// The single, fully resolved set of settings governing one process run.
///
/// Constructed once by [`resolve`] and never mutated afterwards; every
/// component receives it by shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    /// Requested port; 0 means "any free port".
    pub port: u16,
    /// Directory served to clients.
    pub directory: PathBuf,
    /// Selected authentication strategy.
    pub auth_mode: AuthMode,
    /// Username for basic/form modes.
    pub username: Option<String>,
    /// Password for basic/form modes.
    pub password: Option<String>,
    /// Pre-shared token for token mode.
    pub token: Option<String>,
    /// Whether the HTML login page is served in form mode.
    pub login_page: bool,
    /// Directory listing theme.
    pub theme: Theme,
    /// Interface language.
    pub language: Language,
    /// Open the browser after startup.
    pub auto_open: bool,
    /// Whether directory listings are enabled.
    pub dir_listing: bool,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// Also write logs to the persisted log file.
    pub log_persistence: bool,
}

// =============================================================================
// Resolution
// =============================================================================

/// Parse a textual boolean. Case-insensitive; anything outside the two
/// accepted sets is an error for the key.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Merge the three input sources plus built-in defaults into an
/// [`EffectiveConfig`].
///
/// Pure and deterministic: the environment and file layers are passed in as
/// plain maps, so tests can exercise any layering without touching process
/// state. The first error encountered aborts resolution.
pub fn resolve(
    cli: &Cli,
    env: &HashMap<String, String>,
    file: &HashMap<String, String>,
) -> Result<EffectiveConfig, ConfigError> {
    let sources = gather(cli, env, file);

    let port = match sources.lookup(ConfigKey::Port) {
        Some(entry) => {
            entry
                .value
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: ConfigKey::Port.as_str(),
                    value: entry.value.clone(),
                    reason: e.to_string(),
                })?
        }
        None => DEFAULT_PORT,
    };

    let directory = sources
        .lookup(ConfigKey::Dir)
        .map(|e| PathBuf::from(&e.value))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY));

    let auth_mode = parse_with(&sources, ConfigKey::Auth, AuthMode::parse)?;
    let theme = parse_with(&sources, ConfigKey::Theme, Theme::parse)?;
    let language = parse_with(&sources, ConfigKey::Language, Language::parse)?;
    let log_level = parse_with(&sources, ConfigKey::LogLevel, LogLevel::parse)?;

    let login_page = resolve_bool(&sources, ConfigKey::LoginPage)?;
    let auto_open = resolve_bool(&sources, ConfigKey::AutoOpen)?;
    let dir_listing = resolve_bool(&sources, ConfigKey::DirListing)?;
    let log_persistence = resolve_bool(&sources, ConfigKey::LogPersistence)?;

    let username = resolve_secret(&sources, ConfigKey::Username);
    let password = resolve_secret(&sources, ConfigKey::Password);
    let token = resolve_secret(&sources, ConfigKey::Token);

    Ok(EffectiveConfig {
        port,
        directory,
        auth_mode,
        username,
        password,
        token,
        login_page,
        theme,
        language,
        auto_open,
        dir_listing,
        log_level,
        log_persistence,
    })
}

/// Collect `(key, value, origin)` entries from all four layers.
fn gather(cli: &Cli, env: &HashMap<String, String>, file: &HashMap<String, String>) -> Sources {
    let mut sources = Sources::default();

    // CLI layer
    if let Some(port) = cli.port {
        sources.push(ConfigKey::Port, port.to_string(), Origin::Cli);
    }
    if let Some(ref dir) = cli.dir {
        sources.push(ConfigKey::Dir, dir.display().to_string(), Origin::Cli);
    }
    let cli_strings = [
        (ConfigKey::Auth, &cli.auth),
        (ConfigKey::Username, &cli.username),
        (ConfigKey::Password, &cli.password),
        (ConfigKey::Token, &cli.token),
        (ConfigKey::LoginPage, &cli.login_page),
        (ConfigKey::Theme, &cli.theme),
        (ConfigKey::Language, &cli.language),
        (ConfigKey::AutoOpen, &cli.open),
        (ConfigKey::DirListing, &cli.dir_list),
        (ConfigKey::LogLevel, &cli.log_level),
        (ConfigKey::LogPersistence, &cli.enable_log_persistence),
    ];
    for (key, value) in cli_strings {
        if let Some(value) = value {
            sources.push(key, value.clone(), Origin::Cli);
        }
    }

    // Env and file layers; unknown env vars and file keys are ignored
    for key in ConfigKey::ALL {
        if let Some(value) = env.get(&key.env_var()) {
            sources.push(key, value.clone(), Origin::Env);
        }
        if let Some(value) = file.get(key.as_str()) {
            sources.push(key, value.clone(), Origin::File);
        }
        if let Some(value) = key.default_value() {
            sources.push(key, value, Origin::Default);
        }
    }

    sources
}

fn parse_with<T>(
    sources: &Sources,
    key: ConfigKey,
    parse: fn(&str) -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    // Every enumerated key carries a default, so lookup cannot miss.
    let entry = sources.lookup(key).expect("enumerated key has a default");
    parse(&entry.value)
}

fn resolve_bool(sources: &Sources, key: ConfigKey) -> Result<bool, ConfigError> {
    let entry = sources.lookup(key).expect("boolean key has a default");
    parse_bool(&entry.value).ok_or_else(|| ConfigError::InvalidValue {
        key: key.as_str(),
        value: entry.value.clone(),
        reason: "expected a boolean (true/yes/y/1/on or false/no/n/0/off)".to_string(),
    })
}

/// Credentials have no default; an empty string counts as unset so that
/// `SERVERGO_PASSWORD=""` cannot silently satisfy a required credential.
fn resolve_secret(sources: &Sources, key: ConfigKey) -> Option<String> {
    sources
        .lookup(key)
        .map(|e| e.value.clone())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Persisted File
// =============================================================================

/// Path of the persisted config file (`~/.servergo/config.yaml`), if the
/// user's home directory can be determined.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Path of the persisted log file (`~/.servergo/servergo.log`).
pub fn log_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(LOG_FILE_NAME))
}

/// Load the persisted YAML config file into a flat key/value map.
///
/// A missing file yields an empty map. A present-but-malformed file is a
/// [`ConfigError`]: starting with half a configuration is worse than not
/// starting. Unknown keys and non-scalar values are ignored. The file is
/// never written by the resolver.
pub fn load_config_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let doc: serde_yaml::Value =
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut map = HashMap::new();
    if let serde_yaml::Value::Mapping(mapping) = doc {
        for (key, value) in mapping {
            let serde_yaml::Value::String(key) = key else {
                continue;
            };
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                _ => continue,
            };
            map.insert(key, value);
        }
    }
    Ok(map)
}

/// Write a key/value map back to the persisted YAML config file, creating
/// the `~/.servergo` directory when needed.
///
/// Recognized keys are written first in documentation order, then any
/// unrecognized keys in sorted order: keys a newer (or older) release knows
/// about survive a `config set` round trip instead of being dropped.
pub fn save_config_file(path: &Path, map: &HashMap<String, String>) -> Result<(), ConfigError> {
    let file_error = |reason: String| ConfigError::ConfigFile {
        path: path.to_path_buf(),
        reason,
    };

    let mut doc = serde_yaml::Mapping::new();
    for key in ConfigKey::ALL {
        if let Some(value) = map.get(key.as_str()) {
            doc.insert(key.as_str().into(), value.clone().into());
        }
    }
    let mut extras: Vec<&String> = map
        .keys()
        .filter(|name| ConfigKey::parse(name).is_err())
        .collect();
    extras.sort();
    for name in extras {
        doc.insert(name.clone().into(), map[name].clone().into());
    }

    let raw = serde_yaml::to_string(&doc).map_err(|e| file_error(e.to_string()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| file_error(e.to_string()))?;
    }
    std::fs::write(path, raw).map_err(|e| file_error(e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
