//! Verification configuration.
//!
//! Configuration is constructed once at process start and handed to the
//! issuer, validator and checkpoint machine. Nothing in this crate reads
//! the environment on its own.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default token time-to-live (7 days).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Default window between starting and confirming a checkpoint (10 minutes).
pub const DEFAULT_CHECKPOINT_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Default lifetime of a checkpoint session before it is swept (24 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 3600);

/// Longest accepted checkpoint session lifetime (365 days).
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

/// Root verification configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth.token]
/// secret = "change-me"
/// ttl = "7d"
/// base_url = "https://verify.example.com"
///
/// [auth.caller]
/// api_key = "bot-shared-secret"
///
/// [auth.checkpoint]
/// window = "10m"
/// session_ttl = "24h"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token signing configuration.
    pub token: TokenConfig,

    /// Caller (bot) authentication for token issuance.
    pub caller: CallerConfig,

    /// Checkpoint flow configuration.
    pub checkpoint: CheckpointConfig,
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Symmetric signing secret. Issuance and validation fail closed without it.
    pub secret: Option<SecretString>,

    /// Token time-to-live.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Base URL for verification links. Links are relative when unset.
    pub base_url: Option<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl: DEFAULT_TOKEN_TTL,
            base_url: None,
        }
    }
}

impl TokenConfig {
    /// Creates a token configuration with the given secret and default settings.
    #[must_use]
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(SecretString::new(secret)),
            ..Self::default()
        }
    }

    /// Returns the configured base URL, treating blank values as unset.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns `true` if a non-empty signing secret is configured.
    #[must_use]
    pub fn has_secret(&self) -> bool {
        self.secret.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Caller authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallerConfig {
    /// Static shared secret expected in the `x-api-key` header.
    pub api_key: Option<SecretString>,
}

impl CallerConfig {
    /// Creates a caller configuration with the given shared secret.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(api_key)),
        }
    }
}

/// Checkpoint flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Maximum time between starting and confirming a checkpoint.
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Age after which a session is removed by the periodic sweep.
    #[serde(with = "humantime_serde")]
    pub session_ttl: Duration,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_CHECKPOINT_WINDOW,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// A missing signing secret is not a validation error: the process may
    /// start without one, and every issue/validate call then fails closed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The token TTL is zero
    /// - The checkpoint window or session TTL is zero
    /// - The session TTL exceeds [`MAX_SESSION_TTL`]
    /// - The base URL is not an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "token ttl must be > 0".to_string(),
            ));
        }

        if self.checkpoint.window.is_zero() {
            return Err(ConfigError::InvalidValue(
                "checkpoint window must be > 0".to_string(),
            ));
        }

        if self.checkpoint.session_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "checkpoint session_ttl must be > 0".to_string(),
            ));
        }

        if self.checkpoint.session_ttl > MAX_SESSION_TTL {
            return Err(ConfigError::InvalidValue(format!(
                "checkpoint session_ttl must be at most {}",
                humantime::format_duration(MAX_SESSION_TTL)
            )));
        }

        if let Some(base) = self.token.base_url() {
            let parsed = url::Url::parse(base).map_err(|e| {
                ConfigError::InvalidValue(format!("token base_url '{base}' is invalid: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue(format!(
                    "token base_url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }
}

/// A secret string whose value never appears in `Debug` output or serialized config.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.token.ttl, Duration::from_secs(604_800));
        assert_eq!(config.checkpoint.window, Duration::from_secs(600));
        assert_eq!(config.checkpoint.session_ttl, Duration::from_secs(86_400));
        assert!(config.token.secret.is_none());
        assert!(config.caller.api_key.is_none());
        assert!(config.token.base_url().is_none());
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AuthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_fails_validation() {
        let mut config = AuthConfig::default();
        config.token.ttl = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("ttl"));
    }

    #[test]
    fn test_zero_window_fails_validation() {
        let mut config = AuthConfig::default();
        config.checkpoint.window = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_ttl_is_bounded() {
        let config: AuthConfig =
            serde_json::from_str(r#"{"checkpoint": {"session_ttl": "100000years"}}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session_ttl"), "{err}");

        let mut config = AuthConfig::default();
        config.checkpoint.session_ttl = MAX_SESSION_TTL;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_validation() {
        let mut config = AuthConfig::default();
        config.token.base_url = Some("https://verify.example.com/".to_string());
        assert!(config.validate().is_ok());

        config.token.base_url = Some("ftp://verify.example.com".to_string());
        assert!(config.validate().is_err());

        config.token.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.token.base_url = Some("   ".to_string());
        assert!(config.validate().is_ok());
        assert!(config.token.base_url().is_none());
    }

    #[test]
    fn test_has_secret() {
        assert!(!TokenConfig::default().has_secret());
        assert!(TokenConfig::with_secret("s3cr3t").has_secret());
        assert!(!TokenConfig::with_secret("").has_secret());
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = TokenConfig::with_secret("super-secret-value");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("***"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret-value"));
    }

    #[test]
    fn test_deserialize_humantime_durations() {
        let json = r#"{"token": {"secret": "abc", "ttl": "12h"}, "checkpoint": {"window": "5m"}}"#;
        let config: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.token.ttl, Duration::from_secs(12 * 3600));
        assert_eq!(config.checkpoint.window, Duration::from_secs(300));
        assert_eq!(config.token.secret.unwrap().expose(), "abc");
    }
}
