use secrecy::Secret;
use std::env;
use std::fmt;

pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
pub const DEFAULT_RECENT_TRANSACTIONS_LIMIT: usize = 5;

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "{key} has invalid value '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: Secret<String>,
    /// Comma-separated list of origins allowed by CORS
    pub allowed_origins: String,
    pub bind_address: String,
    pub port: u16,
    pub max_connections: u32,
    /// How many entries `/statistics` returns in `recent_transactions`
    pub recent_transactions_limit: usize,
    /// Account that holds the admin role, promoted at start-up or on registration
    pub admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = Secret::new(required("JWT_SECRET")?);

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let recent_transactions_limit = parse_or(
            &lookup,
            "RECENT_TRANSACTIONS_LIMIT",
            DEFAULT_RECENT_TRANSACTIONS_LIMIT,
        )?;

        let admin_email = lookup("ADMIN_EMAIL")
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        if recent_transactions_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "RECENT_TRANSACTIONS_LIMIT",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            jwt_secret,
            allowed_origins,
            bind_address,
            port,
            max_connections,
            recent_transactions_limit,
            admin_email,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("JWT_SECRET", "secret"),
        ]))
        .expect("Should build config");

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.allowed_origins, DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(config.recent_transactions_limit, 5);
        assert_eq!(config.jwt_secret.expose_secret(), "secret");
        assert_eq!(config.admin_email, None);
    }

    #[test]
    fn test_admin_email_trimmed_and_blank_ignored() {
        let base = [
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("JWT_SECRET", "secret"),
        ];

        let mut pairs = base.to_vec();
        pairs.push(("ADMIN_EMAIL", " owner@example.com "));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).expect("Should build config");
        assert_eq!(config.admin_email.as_deref(), Some("owner@example.com"));

        let mut pairs = base.to_vec();
        pairs.push(("ADMIN_EMAIL", "  "));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).expect("Should build config");
        assert_eq!(config.admin_email, None);
    }

    #[test]
    fn test_missing_database_url() {
        let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "secret")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "PORT", .. })));
    }

    #[test]
    fn test_zero_recent_limit_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("JWT_SECRET", "secret"),
            ("RECENT_TRANSACTIONS_LIMIT", "0"),
        ]));
        assert!(result.is_err());
    }
}
