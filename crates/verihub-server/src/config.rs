use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use verihub_auth::config::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Token, caller key and checkpoint configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        if self.server.sweep_interval_secs == 0 {
            return Err("server.sweep_interval_secs must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.server.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// How often stale checkpoint sessions are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_body_limit() -> usize {
    16 * 1024
}
fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, ConfigBuilder, Environment, File, Map, builder::DefaultState};
    use std::path::PathBuf;

    /// Default configuration file, read when no path is given.
    pub const DEFAULT_CONFIG_FILE: &str = "verihub.toml";

    /// Flat environment names accepted for compatibility with existing
    /// deployments. They override both the file and `VERIHUB__*` variables.
    pub const LEGACY_ENV: &[(&str, &str)] = &[
        ("TOKEN_SECRET", "auth.token.secret"),
        ("GENERATOR_KEY", "auth.caller.api_key"),
        ("TOKEN_EXPIRES", "auth.token.ttl"),
    ];

    /// Base URL variables, highest precedence first.
    pub const BASE_URL_ENV: &[&str] = &["VERCEL_BASE_URL", "BASE_URL"];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let env: Map<String, String> = std::env::vars().collect();
        load_config_with_env(path, &env)
    }

    /// Loads configuration with an explicit environment instead of the process one.
    pub fn load_config_with_env(
        path: Option<&str>,
        env: &Map<String, String>,
    ) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., VERIHUB__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("VERIHUB")
                .separator("__")
                .source(Some(env.clone())),
        );
        builder = apply_legacy_env(builder, env)?;

        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    fn apply_legacy_env(
        mut builder: ConfigBuilder<DefaultState>,
        env: &Map<String, String>,
    ) -> Result<ConfigBuilder<DefaultState>, String> {
        let lookup = |name: &str| {
            env.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        for (name, key) in LEGACY_ENV {
            builder = builder
                .set_override_option(*key, lookup(name))
                .map_err(|e| format!("config override error for {name}: {e}"))?;
        }

        let base_url = BASE_URL_ENV.iter().find_map(|name| lookup(name));
        builder
            .set_override_option("auth.token.base_url", base_url)
            .map_err(|e| format!("config override error for base url: {e}"))
    }
}
