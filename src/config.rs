// src/config.rs
use std::net::SocketAddr;

pub const DATABASE_URL_ENV: &str = "WEB_SETTINGS_DATABASE_URL";
pub const BIND_ADDR_ENV: &str = "WEB_SETTINGS_BIND_ADDR";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_db_connections: u32,
    pub socket_buffer_size: usize,
    // None means any origin is allowed.
    pub allowed_origin: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            database_url: "sqlite:./data/web_settings.db".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5197)),
            max_db_connections: 16,
            socket_buffer_size: 1024,
            allowed_origin: None,
        }
    }

    /// Defaults, overridden by `WEB_SETTINGS_DATABASE_URL` and `WEB_SETTINGS_BIND_ADDR`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new();
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            config.database_url = url;
        }
        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            config.bind_addr = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("{BIND_ADDR_ENV}={addr} is not a socket address: {e}"))?;
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
