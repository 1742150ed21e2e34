use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::database::DatabaseConfig;

/// Process configuration, read from the environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(flatten)]
    pub database: DatabaseConfig,
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    pub fn from_env() -> Result<Config, envy::Error> {
        envy::from_env::<Config>()
    }
}
