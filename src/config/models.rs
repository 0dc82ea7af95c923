// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub healthz: HealthzConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: ([0, 0, 0, 0], 8080).into(),
            path: "/healthz".to_string(),
        }
    }
}

/// Settings of the health registry itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthzConfig {
    pub version: String,
    pub release: String,
    pub description: String,
    /// File holding the persistent service identifier.
    pub service_file: String,
    /// Maximum number of notes kept in one report.
    pub notes_count: usize,
}

impl Default for HealthzConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            release: String::new(),
            description: String::new(),
            service_file: "healthz.service".to_string(),
            notes_count: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.healthz.service_file.trim().is_empty() {
            bail!("healthz.service_file must not be empty");
        }
        if self.healthz.notes_count == 0 {
            bail!("healthz.notes_count must be greater than zero");
        }
        if !self.server.path.starts_with('/') {
            bail!("server.path must start with '/': {}", self.server.path);
        }
        if self.metrics.enabled {
            if !self.metrics.path.starts_with('/') {
                bail!("metrics.path must start with '/': {}", self.metrics.path);
            }
            if self.metrics.port == self.server.listen_addr.port() {
                bail!(
                    "metrics.port {} collides with the health server port",
                    self.metrics.port
                );
            }
        }
        Ok(())
    }
}
