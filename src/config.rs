use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::MAX_UPLOAD_BYTES;

const DEFAULT_DB_PATH: &str = "/var/lib/resource-hub/resources.db";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!("expected `memory` or `sqlite`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub storage: StorageBackend,
    pub db_path: String,
    pub seed_demo_data: bool,
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            storage: StorageBackend::Memory,
            db_path: DEFAULT_DB_PATH.to_string(),
            seed_demo_data: true,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Reads `RESOURCE_HUB_*` environment variables, defaulting unset ones.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: try_load(&lookup, "RESOURCE_HUB_HOST", defaults.host)?,
            port: try_load(&lookup, "RESOURCE_HUB_PORT", defaults.port)?,
            storage: try_load(&lookup, "RESOURCE_HUB_STORAGE", defaults.storage)?,
            db_path: lookup("RESOURCE_HUB_DB_PATH").unwrap_or(defaults.db_path),
            seed_demo_data: try_load(&lookup, "RESOURCE_HUB_SEED_DEMO", defaults.seed_demo_data)?,
            max_upload_bytes: try_load(
                &lookup,
                "RESOURCE_HUB_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!("Invalid {key} value: {e}");
                Err(ConfigError::Invalid {
                    key,
                    reason: e.to_string(),
                    value,
                })
            }
        },
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}
