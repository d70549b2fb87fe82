use crate::core::Result;

use super::{env_or, parse_env};

/// Server configuration for HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            env_or("SERVER_HOST", "127.0.0.1"),
            parse_env("SERVER_PORT", 8080)?,
        );
        if let Ok(workers) = std::env::var("SERVER_WORKERS") {
            config.workers = workers.parse().map_err(|_| {
                crate::core::AppError::Configuration("Invalid SERVER_WORKERS".to_string())
            })?;
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
