use serde::{Deserialize, Serialize};
use std::path::Path;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::regions::RegionsConfig;
use super::server::ServerConfig;
use super::upstream::{ResolutionMode, UpstreamConfig};

/// Classic DNS messages fit in 512 bytes.
const MIN_PACKET_SIZE: usize = 512;

const DEFAULT_CONFIG_FILE: &str = "regional-dns.toml";

/// Main configuration structure for the regional resolver
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listening socket
    #[serde(default)]
    pub server: ServerConfig,

    /// Where resolution starts and how it is bounded
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Region table used to annotate A answers
    #[serde(default)]
    pub regions: RegionsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. regional-dns.toml in current directory
    /// 3. Default configuration
    ///
    /// Command-line overrides are applied on top of whichever was found.
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(server) = overrides.server {
            self.upstream.server = Some(server);
        }
        if let Some(path) = overrides.regions_path {
            self.regions.table_path = Some(path);
        }
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(mode) = overrides.mode {
            self.upstream.mode = mode;
        }
        if let Some(timeout) = overrides.query_timeout_ms {
            self.upstream.query_timeout_ms = timeout;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.upstream.server.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(ConfigError::Validation(
                    "No upstream server configured".to_string(),
                ));
            }
            Some(_) => {}
        }

        match self.regions.table_path.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(ConfigError::Validation(
                    "No region table configured".to_string(),
                ));
            }
            Some(_) => {}
        }

        if self.upstream.port == 0 {
            return Err(ConfigError::Validation(
                "Upstream port cannot be 0".to_string(),
            ));
        }

        if self.upstream.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Query timeout must be greater than 0".to_string(),
            ));
        }

        if self.upstream.max_hops == 0 {
            return Err(ConfigError::Validation(
                "max_hops must be at least 1".to_string(),
            ));
        }

        if self.server.max_packet_size < MIN_PACKET_SIZE {
            return Err(ConfigError::Validation(format!(
                "max_packet_size must be at least {} bytes",
                MIN_PACKET_SIZE
            )));
        }

        if self.server.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid bind address '{}'",
                self.server.bind_address
            )));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub server: Option<String>,
    pub regions_path: Option<String>,
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub mode: Option<ResolutionMode>,
    pub query_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}
