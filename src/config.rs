use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::info;

use crate::domain::value_objects::{UserId, DEFAULT_CURRENCY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub media_dir: PathBuf,
    pub media_base_url: String,
    pub currency: String,
    /// Accounts that are made admins on sign-in.
    pub admin_uids: Vec<UserId>,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            port: parse_or(&lookup, "PORT", 8083)?,
            database_url: optional("DATABASE_URL"),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            nats_url: optional("NATS_URL"),
            media_dir: optional("MEDIA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./media")),
            media_base_url: optional("MEDIA_BASE_URL").unwrap_or_else(|| "/media".to_string()),
            currency: optional("STORE_CURRENCY").map(|c| c.trim().to_uppercase()).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            admin_uids: optional("ADMIN_UIDS")
                .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(UserId::new).collect())
                .unwrap_or_default(),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid { key, value, reason: e.to_string() }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
