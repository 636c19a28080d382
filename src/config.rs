use std::env;

use crate::auth::{MAX_HASH_COST, MIN_HASH_COST};
use crate::error::AppError;

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    /// Signing secret for bearer tokens. Kept optional so a missing secret
    /// surfaces as a 500 on login instead of preventing startup.
    pub jwt_secret: Option<String>,
    pub cors_allowed_origin: String,
    pub admin_email: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Configuration("DATABASE_URL must be set".into()))?;

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&bcrypt_cost) {
            return Err(AppError::Configuration(format!(
                "BCRYPT_COST must be between {} and {}",
                MIN_HASH_COST, MAX_HASH_COST
            )));
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret: lookup("JWT_SECRET").filter(|s| !s.is_empty()),
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            admin_email: lookup("ADMIN_EMAIL").unwrap_or_else(|| "admin@example.com".to_string()),
            admin_password: lookup("ADMIN_PASSWORD").unwrap_or_else(|| "Admin123".to_string()),
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a number", key))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://test")]))
            .unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.admin_email, "admin@example.com");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(
            config.jwt_secret.as_deref(),
            Some("0123456789abcdef0123456789abcdef")
        );
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[])),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://test"),
                ("SERVER_PORT", "not-a-port"),
            ])),
            Err(AppError::Configuration(_))
        ));
        for cost in ["3", "32"] {
            assert!(matches!(
                Config::from_lookup(lookup_from(&[
                    ("DATABASE_URL", "postgres://test"),
                    ("BCRYPT_COST", cost),
                ])),
                Err(AppError::Configuration(_))
            ));
        }
    }
}
