//! ServerGo - a small HTTP file-serving daemon.
//!
//! This binary resolves the layered configuration, acquires a port, builds
//! the admission strategy and serves the configured directory.

use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use servergo::{
    config::{self, Cli, Command, ConfigCommand, ConfigKey, EffectiveConfig},
    port,
    server::create_router,
    AuthMode, AuthStrategy,
};

/// Exit code for configuration-resolution failures.
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();

    if let Some(Command::Config(command)) = cli.command.take() {
        return run_config_command(command);
    }

    // Resolve configuration before anything else; a config error must
    // abort before any socket is bound.
    let env: HashMap<String, String> = std::env::vars().collect();
    let file = match config::config_file_path() {
        Some(path) => match config::load_config_file(&path) {
            Ok(map) => map,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return ExitCode::from(EXIT_CONFIG);
            }
        },
        None => HashMap::new(),
    };

    let config = match config::resolve(&cli, &env, &file) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    init_logging(&config);

    // Credential/session stores are built before binding as well: a missing
    // credential for a requested auth mode is a configuration error.
    let strategy = match AuthStrategy::from_config(&config) {
        Ok(strategy) => strategy,
        Err(e) => {
            error!("Configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let binding = match port::acquire(config.port).await {
        Ok(binding) => binding,
        Err(e) => {
            error!("Failed to acquire a listening port: {e}");
            return ExitCode::FAILURE;
        }
    };

    print_startup_summary(&config, binding.requested_port, binding.bound_port);

    if config.auto_open {
        open_browser(&format!("http://localhost:{}", binding.bound_port));
    }

    let router = create_router(Arc::clone(&config), strategy);
    let listener = binding.into_listener();

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Run a `servergo config ...` maintenance command against the persisted
/// file and exit. These commands are the only writers of the file; the
/// server's own resolution path never modifies it.
fn run_config_command(command: ConfigCommand) -> ExitCode {
    let Some(path) = config::config_file_path() else {
        eprintln!("Configuration error: could not determine the home directory");
        return ExitCode::from(EXIT_CONFIG);
    };

    let mut file = match config::load_config_file(&path) {
        Ok(map) => map,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match command {
        ConfigCommand::List => {
            println!("# {}", path.display());
            for key in ConfigKey::ALL {
                match file.get(key.as_str()) {
                    Some(value) => println!("{} = {}", key.as_str(), value),
                    None => match key.default_value() {
                        Some(default) => println!("{} = {} (default)", key.as_str(), default),
                        None => println!("{} = (unset)", key.as_str()),
                    },
                }
            }
            ExitCode::SUCCESS
        }

        ConfigCommand::Get { key } => {
            let key = match parse_config_key(&key) {
                Ok(key) => key,
                Err(code) => return code,
            };
            match file.get(key.as_str()).map(String::as_str).or(key.default_value()) {
                Some(value) => {
                    println!("{value}");
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("`{}` is not set", key.as_str());
                    ExitCode::from(EXIT_CONFIG)
                }
            }
        }

        ConfigCommand::Set { key, value } => {
            let key = match parse_config_key(&key) {
                Ok(key) => key,
                Err(code) => return code,
            };
            if let Err(e) = key.validate_value(&value) {
                eprintln!("Configuration error: {e}");
                return ExitCode::from(EXIT_CONFIG);
            }
            file.insert(key.as_str().to_string(), value.clone());
            if let Err(e) = config::save_config_file(&path, &file) {
                eprintln!("Configuration error: {e}");
                return ExitCode::from(EXIT_CONFIG);
            }
            println!("{} = {}", key.as_str(), value);
            ExitCode::SUCCESS
        }
    }
}

/// Resolve a key name, printing the recognized set on a miss.
fn parse_config_key(name: &str) -> Result<ConfigKey, ExitCode> {
    match ConfigKey::parse(name) {
        Ok(key) => Ok(key),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("Recognized keys:");
            for key in ConfigKey::ALL {
                eprintln!("  - {}", key.as_str());
            }
            Err(ExitCode::from(EXIT_CONFIG))
        }
    }
}

/// Initialize the tracing/logging subsystem from the resolved config.
///
/// With log persistence enabled, a second non-ANSI fmt layer appends to
/// `~/.servergo/servergo.log`.
fn init_logging(config: &EffectiveConfig) {
    let level = config.log_level.as_str();
    let default_filter = format!("servergo={level},tower_http={level}");
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let stdout_layer = tracing_subscriber::fmt::layer();

    if config.log_persistence {
        if let Some(file) = open_log_file() {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
            return;
        }
        eprintln!("warning: log persistence requested but the log file could not be opened");
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}

fn open_log_file() -> Option<std::fs::File> {
    let path = config::log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

fn print_startup_summary(config: &EffectiveConfig, requested: u16, bound: u16) {
    if requested != 0 && requested != bound {
        warn!(
            "port {} was unavailable, listening on OS-assigned port {}",
            requested, bound
        );
    }

    info!("Serving {} on http://localhost:{}", config.directory.display(), bound);
    info!(
        "  Directory listing: {} (theme: {}, language: {})",
        if config.dir_listing { "enabled" } else { "disabled" },
        config.theme.as_str(),
        config.language.as_str()
    );

    match config.auth_mode {
        AuthMode::None => info!("  Auth: disabled - all files are publicly accessible"),
        AuthMode::Basic => info!("  Auth: HTTP Basic"),
        AuthMode::Token => info!("  Auth: pre-shared token (bearer header or ?token=)"),
        AuthMode::Form => {
            info!("  Auth: form login");
            if config.login_page {
                info!("  Login page: http://localhost:{bound}/login");
            }
        }
    }

    info!("Press Ctrl+C to stop");
}

/// Best-effort browser launch; failures are logged, never fatal.
fn open_browser(url: &str) {
    let result = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => info!("Opening {url} in your browser"),
        Err(e) => warn!("Could not open browser: {e}"),
    }
}
