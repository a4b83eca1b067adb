use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{GatehouseConfig, DEFAULT_CONFIG_PATH};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

pub fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
    Ok(())
}

pub struct LoadedConfig {
    pub config: GatehouseConfig,
    pub path: PathBuf,
    /// False when the file was missing and defaults were used.
    pub from_file: bool,
}

pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if !fs::try_exists(&path).await.unwrap_or(false) {
        warn!("Config file not found, using defaults: {}", path.display());
        return Ok(LoadedConfig {
            config: GatehouseConfig::default(),
            path,
            from_file: false,
        });
    }

    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: GatehouseConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(LoadedConfig {
        config,
        path,
        from_file: true,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.yaml")))
            .await
            .unwrap();
        assert!(!loaded.from_file);
        assert_eq!(loaded.config, GatehouseConfig::default());
    }

    #[tokio::test]
    async fn reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9191\n  apiPrefixes: [apis]").unwrap();
        let loaded = load_config(Some(file.path())).await.unwrap();
        assert!(loaded.from_file);
        assert_eq!(loaded.config.server.port, 9191);
        assert_eq!(loaded.config.server.api_prefixes, vec!["apis"]);
    }

    #[tokio::test]
    async fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [not, a, map").unwrap();
        let err = load_config(Some(file.path())).await.err().unwrap();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
