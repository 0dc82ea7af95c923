// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::io;
use std::path::Path;

/// Load configuration from a file (YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    from_contents(path, &contents)
}

/// Like [`load_config`], but a file that does not exist yields the
/// defaults. Any other I/O error is still reported.
pub async fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => from_contents(path, &contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to read config file {}", path.display()))
        }
    }
}

fn from_contents(path: &Path, contents: &str) -> Result<Config> {
    let config = parse_config(path, contents)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(path: &Path, contents: &str) -> Result<Config> {
    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );

    let config: Config = if is_yaml {
        // An empty YAML document deserializes as unit, not as a map.
        if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        }
    } else {
        serde_json::from_str(contents).context("Failed to parse JSON config")?
    };
    Ok(config)
}
