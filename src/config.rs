//! Server configuration read from the environment (and `.env`).

use std::collections::HashMap;

use axum::http::HeaderValue;
use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { name, reason: reason.into() }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub allowed_cors_origin: Option<HeaderValue>,
    pub max_connections: u32,
    pub session_ttl: Duration,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();

        let database_url = vars
            .get("DATABASE_URL")
            .ok_or(ConfigError::Missing("DATABASE_URL"))?
            .trim()
            .to_string();
        if !(database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")) {
            return Err(ConfigError::invalid(
                "DATABASE_URL",
                "expected a postgres:// or postgresql:// URL",
            ));
        }

        let port = match vars.get("PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::invalid("PORT", format!("{raw} is not in 1..=65535")))
                }
                Ok(port) => port,
            },
            None => DEFAULT_PORT,
        };

        let allowed_cors_origin = vars
            .get("ALLOWED_CORS_ORIGIN")
            .map(|origin| HeaderValue::from_str(origin.trim()))
            .transpose()
            .map_err(|err| ConfigError::invalid("ALLOWED_CORS_ORIGIN", err.to_string()))?;

        let max_connections = parse_positive(&vars, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let ttl_seconds = parse_positive(&vars, "SESSION_TTL_SECONDS", DEFAULT_SESSION_TTL_SECONDS)?;

        Ok(Self {
            database_url,
            port,
            allowed_cors_origin,
            max_connections,
            session_ttl: Duration::seconds(ttl_seconds),
        })
    }
}

fn parse_positive<T>(vars: &HashMap<String, String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::invalid(name, format!("{raw} is not a positive number"))),
    }
}
