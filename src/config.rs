//! On-disk configuration for the `gatehouse` binary.

use std::time::Duration;

use gatehouse_admission::{AuthConfig, IdentityProvider};
use gatehouse_rate_limit::LimitConfig;
use gatehouse_rbac::{NewRole, NewUser};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/gatehouse.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("server.apiPrefixes must not be empty")]
    NoApiPrefixes,
    #[error("api prefix '{0}' must be a single path segment")]
    InvalidApiPrefix(String),
    #[error("server.rateLimits[{index}]: {source}")]
    RateLimit {
        index: usize,
        #[source]
        source: gatehouse_rate_limit::LimitConfigError,
    },
    #[error("auth: {0}")]
    Auth(#[from] gatehouse_admission::AdmissionError),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatehouseConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub seed: SeedConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub api_prefixes: Vec<String>,
    pub rate_limits: Vec<LimitConfig>,
    pub slow_request_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            api_prefixes: vec!["api".to_string()],
            rate_limits: Vec::new(),
            slow_request_ms: 100,
        }
    }
}

impl ServerConfig {
    pub fn slow_request(&self) -> Duration {
        Duration::from_millis(self.slow_request_ms)
    }
}

/// Principals created in the in-memory store at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedConfig {
    pub users: Vec<NewUser>,
    pub roles: Vec<NewRole>,
    pub groups: Vec<SeedGroup>,
    pub bindings: Vec<SeedBinding>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedGroup {
    pub name: String,
    pub describe: String,
    /// User names.
    pub members: Vec<String>,
}

/// Binds a role, by name, to users and groups, by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedBinding {
    pub role: String,
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

impl GatehouseConfig {
    /// Checks everything that can be checked without building the server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.api_prefixes.is_empty() {
            return Err(ConfigError::NoApiPrefixes);
        }
        if let Some(prefix) = self
            .server
            .api_prefixes
            .iter()
            .find(|prefix| prefix.is_empty() || prefix.contains('/'))
        {
            return Err(ConfigError::InvalidApiPrefix(prefix.clone()));
        }
        for (index, limit) in self.server.rate_limits.iter().enumerate() {
            limit
                .validate()
                .map_err(|source| ConfigError::RateLimit { index, source })?;
        }
        IdentityProvider::from_config(&self.auth)?;
        Ok(())
    }
}
