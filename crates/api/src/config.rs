//! Process configuration, read once at startup from the environment
//! (optionally seeded from a `.env` file).

use chrono::Duration;
use thiserror::Error;

use workify_observability::LogFormat;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 2 * 60 * 60;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Deployment environment; controls cookie hardening.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub environment: Environment,
    pub cors_origins: Vec<String>,
    pub database_url: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("token_ttl", &self.token_ttl)
            .field("environment", &self.environment)
            .field("cors_origins", &self.cors_origins)
            .field("database", &self.database_url.is_some())
            .field("stripe", &self.stripe_secret_key.is_some())
            .field("stripe_api_base", &self.stripe_api_base)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load `.env` (if any) and then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let ttl_secs = match get("TOKEN_TTL_SECS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "TOKEN_TTL_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds",
                    });
                }
            },
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let cors_origins = get("CORS_ORIGIN")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            port,
            jwt_secret: get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            token_ttl: Duration::seconds(ttl_secs),
            environment: get("APP_ENV").map(|v| Environment::parse(&v)).unwrap_or_default(),
            cors_origins,
            database_url: get("DATABASE_URL"),
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            stripe_api_base: get("STRIPE_API_BASE")
                .unwrap_or_else(|| workify_infra::payments::stripe::DEFAULT_API_BASE.to_string()),
            log_format: get("LOG_FORMAT").map(|v| LogFormat::parse(&v)).unwrap_or_default(),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.token_ttl, Duration::hours(2));
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.cors_origins, vec!["http://localhost:5173".to_string()]);
        assert!(cfg.database_url.is_none());
        assert!(cfg.stripe_secret_key.is_none());
        assert!(cfg.uses_dev_secret());
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let cfg = load(&[
            ("PORT", " 8080 "),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "60"),
            ("APP_ENV", "Production"),
            ("CORS_ORIGIN", "https://a.example, https://b.example,"),
            ("DATABASE_URL", "postgres://localhost/workify"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.token_ttl, Duration::seconds(60));
        assert!(cfg.environment.is_production());
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/workify"));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(!cfg.uses_dev_secret());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg = load(&[("DATABASE_URL", "  "), ("PORT", "")]).unwrap();
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = load(&[("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        assert!(load(&[("TOKEN_TTL_SECS", "0")]).is_err());
        assert!(load(&[("TOKEN_TTL_SECS", "-5")]).is_err());
        assert!(load(&[("TOKEN_TTL_SECS", "soon")]).is_err());
    }
}
