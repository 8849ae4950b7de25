use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

pub mod cors;
pub mod openapi;
pub mod security;

pub use cors::create_cors_layer;
pub use openapi::{ApiDoc, OPENAPI_PATH};
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_PAGE_SIZE: i64 = 100;
const PAGE_SIZE_CEILING: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Required for the postgres backend.
    pub database_url: Option<String>,
    pub storage: StorageBackend,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub max_page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            storage: StorageBackend::Postgres,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host: IpAddr = parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port: u16 = parse_or(&lookup, "PORT", DEFAULT_PORT);

        Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            storage: parse_or(&lookup, "EVENT_PLANNER_STORAGE", defaults.storage),
            bind_addr: SocketAddr::new(host, port),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            max_page_size: parse_or(&lookup, "MAX_PAGE_SIZE", defaults.max_page_size)
                .clamp(1, PAGE_SIZE_CEILING),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Config: ignoring invalid {}='{}': {}", key, raw, e);
                default
            }
        },
    }
}
