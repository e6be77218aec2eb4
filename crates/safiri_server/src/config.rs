//! Server configuration, read from the environment.
//!
//!   SAFIRI_BIND_ADDR           — listen address (default: 0.0.0.0:5000)
//!   SAFIRI_STORE               — `postgres` or `memory`
//!   SAFIRI_DATABASE_URL        — Postgres connection string (falls back to DATABASE_URL)
//!   SAFIRI_DB_MAX_CONNECTIONS  — pool size (default: 10)
//!   SAFIRI_MIN_QUANTITY        — smallest accepted bag count (default: 1)
//!   SAFIRI_MAX_QUANTITY        — largest accepted bag count (default: 1000)

use std::str::FromStr;

use safiri_core::settings::{DEFAULT_MAX_QUANTITY, DEFAULT_MIN_QUANTITY};
use safiri_core::UssdSettings;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name}: cannot parse '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("SAFIRI_STORE=postgres requires SAFIRI_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,

    #[error(transparent)]
    Settings(#[from] safiri_core::SafiriError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub settings: UssdSettings,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = var("SAFIRI_DATABASE_URL").or_else(|| var("DATABASE_URL"));
        let store = match var("SAFIRI_STORE") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "SAFIRI_STORE",
                value: raw,
            })?,
            None if database_url.is_some() => StoreBackend::Postgres,
            None => StoreBackend::Memory,
        };
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let settings = UssdSettings {
            min_quantity: parse_or("SAFIRI_MIN_QUANTITY", var("SAFIRI_MIN_QUANTITY"), DEFAULT_MIN_QUANTITY)?,
            max_quantity: parse_or("SAFIRI_MAX_QUANTITY", var("SAFIRI_MAX_QUANTITY"), DEFAULT_MAX_QUANTITY)?,
        };
        settings.validate()?;

        Ok(Self {
            bind_addr: var("SAFIRI_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            store,
            database_url,
            db_max_connections: parse_or(
                "SAFIRI_DB_MAX_CONNECTIONS",
                var("SAFIRI_DB_MAX_CONNECTIONS"),
                DEFAULT_DB_MAX_CONNECTIONS,
            )?,
            settings,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
