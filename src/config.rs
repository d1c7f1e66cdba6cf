use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is not valid: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Amounts charged when no active pricing row matches a (leg, tier) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackLadder {
    /// "M-12 & Below" and "F-12 & Below"
    pub child: Decimal,
    /// "M-65 & Above" and "F-Above 12 & Below 75"
    pub concession: Decimal,
    /// "M&F-75 & Above"
    pub super_senior: Decimal,
    /// every other adult tier
    pub adult: Decimal,
}

impl Default for FallbackLadder {
    fn default() -> Self {
        FallbackLadder {
            child: Decimal::from(290),
            concession: Decimal::from(290),
            super_senior: Decimal::ZERO,
            adult: Decimal::from(550),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Startup configuration, built once in `main` and handed to the services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub pricing: FallbackLadder,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = FallbackLadder::default();
        Ok(AppConfig {
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed("DB_MAX_CONNECTIONS", 10)?,
                acquire_timeout: Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            },
            auth: AuthConfig {
                jwt_secret: required("JWT_SECRET")?,
            },
            pricing: FallbackLadder {
                child: parsed("FALLBACK_PRICE_CHILD", defaults.child)?,
                concession: parsed("FALLBACK_PRICE_CONCESSION", defaults.concession)?,
                super_senior: parsed("FALLBACK_PRICE_SUPER_SENIOR", defaults.super_senior)?,
                adult: parsed("FALLBACK_PRICE_ADULT", defaults.adult)?,
            },
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
