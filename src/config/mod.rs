//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `SHORTLIST_*` environment variables.
//! [`Config`] covers the process (bind address, model locations); [`RankingConfig`]
//! covers one ranking run. Reputation sources are configured by
//! [`ReputationConfig`](crate::reputation::ReputationConfig).

pub(crate) mod env;
pub mod error;
mod ranking;

#[cfg(test)]
mod tests;

pub use error::ConfigError;
pub use ranking::{RankingConfig, ReputationScope};

use std::net::IpAddr;
use std::path::PathBuf;

/// Process configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SHORTLIST_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Bi-encoder model directory (BERT + tokenizer).
    pub encoder_path: Option<PathBuf>,

    /// Cross-encoder model directory (BERT + tokenizer).
    pub reranker_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            encoder_path: None,
            reranker_path: None,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "SHORTLIST_PORT";
    const ENV_BIND_ADDR: &'static str = "SHORTLIST_BIND_ADDR";
    const ENV_ENCODER_PATH: &'static str = "SHORTLIST_ENCODER_PATH";
    const ENV_RERANKER_PATH: &'static str = "SHORTLIST_RERANKER_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let encoder_path = env::optional_path(Self::ENV_ENCODER_PATH);
        let reranker_path = env::optional_path(Self::ENV_RERANKER_PATH);

        Ok(Self {
            port,
            bind_addr,
            encoder_path,
            reranker_path,
        })
    }

    /// Validates model paths (both must be directories when set).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.encoder_path, &self.reranker_path].into_iter().flatten() {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::read(Self::ENV_PORT) {
            Some(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            None => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::read(Self::ENV_BIND_ADDR) {
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            None => Ok(default),
        }
    }
}
