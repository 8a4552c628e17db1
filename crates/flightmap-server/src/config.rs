//! Server configuration from environment.

use flightmap_lookup::LookupConfig;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub lookup: LookupConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("FLIGHTMAP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            lookup: LookupConfig::from_env(),
        }
    }
}
