//! Process settings from environment (optionally seeded from `.env`).

use crate::error::ConfigError;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::Settings(format!(
                "invalid STORE: {} (expected postgres or memory)",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub api_prefix: String,
    pub max_connections: u32,
    pub body_limit_bytes: usize,
    pub catalog_path: Option<PathBuf>,
    pub store: StoreKind,
    pub auto_migrate: bool,
}

impl Settings {
    /// Load `.env` if present, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut api_prefix = var("API_PREFIX").unwrap_or_else(|| "/api".into());
        if !api_prefix.starts_with('/') {
            api_prefix.insert(0, '/');
        }
        let api_prefix = api_prefix.trim_end_matches('/').to_string();

        Ok(Settings {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/sms".into()),
            bind_addr: parse_or(var("BIND_ADDR"), "BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(var("PORT"), "PORT", 9090)?,
            api_prefix,
            max_connections: parse_or(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?,
            body_limit_bytes: parse_or(var("BODY_LIMIT_BYTES"), "BODY_LIMIT_BYTES", 1024 * 1024)?,
            catalog_path: var("SCHOOL_CONFIG_PATH").map(PathBuf::from),
            store: var("STORE").map(|s| s.parse::<StoreKind>()).transpose()?.unwrap_or(StoreKind::Postgres),
            auto_migrate: parse_bool(var("AUTO_MIGRATE"), "AUTO_MIGRATE")?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::Settings(format!("invalid {}: {}", key, v))),
    }
}

fn parse_bool(raw: Option<String>, key: &str) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::Settings(format!("invalid {}: {}", key, other))),
    }
}
