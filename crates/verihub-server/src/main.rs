use std::env;

use verihub_server::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use verihub_server::{AppConfig, ServerBuilder};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From VERIHUB_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (verihub.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (VERIHUB_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    verihub_server::observability::init_tracing();

    let (config_path, source) = resolve_config_path();

    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    if env::args().any(|a| a == "--print-config") {
        print_config(&cfg);
        return;
    }

    tracing::info!(
        path = %config_path,
        source = %source,
        file_found = std::path::Path::new(&config_path).exists(),
        "Configuration loaded"
    );

    verihub_server::observability::apply_logging_level(&cfg.logging.level);
    warn_on_missing_secrets(&cfg);

    let server = ServerBuilder::new().with_config(cfg).build();

    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "server error");
        eprintln!("Server error: {err}");
        std::process::exit(1);
    }

    tracing::info!("server stopped");
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: VERIHUB_CONFIG
/// 3. Default: verihub.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("VERIHUB_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    (DEFAULT_CONFIG_FILE.to_string(), ConfigSource::Default)
}

// Issue/validate fail closed without these; the server still starts.
fn warn_on_missing_secrets(cfg: &AppConfig) {
    if !cfg.auth.token.has_secret() {
        tracing::warn!("no token secret configured (TOKEN_SECRET); issue and validate will return 500");
    }
    if cfg.auth.caller.api_key.as_ref().is_none_or(|k| k.is_empty()) {
        tracing::warn!("no caller api key configured (GENERATOR_KEY); /generate will return 500");
    }
}

// Secrets serialize as "***".
fn print_config(cfg: &AppConfig) {
    match toml::to_string_pretty(cfg) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Failed to render configuration: {e}");
            std::process::exit(2);
        }
    }
}
