use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("Unknown STORE_BACKEND '{}'", other),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub tracker_listen_addr: SocketAddr,
    pub http_listen_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub db_max_connections: u32,
    pub trip_gap_seconds: i64,
    pub read_buffer_size: usize,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let tracker_listen_addr = env::var("TRACKER_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:9000".to_string())
            .parse()
            .context("Invalid TRACKER_LISTEN_ADDR")?;
        let http_listen_addr = env::var("HTTP_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:9001".to_string())
            .parse()
            .context("Invalid HTTP_LISTEN_ADDR")?;
        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "geolog".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "geolog".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "geolog".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);
        let trip_gap_seconds = env::var("TRIP_GAP_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);
        let read_buffer_size = env::var("READ_BUFFER_SIZE")
            .unwrap_or_else(|_| "4096".to_string())
            .parse()
            .unwrap_or(4096);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            tracker_listen_addr,
            http_listen_addr,
            store_backend,
            database_url,
            db_max_connections,
            trip_gap_seconds,
            read_buffer_size,
            log_level,
        })
    }
}
