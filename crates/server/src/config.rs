//! Server configuration.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::packet::{HEADER_LEN, MAX_FRAME_LEN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for the listening socket and the packet buffers.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use scripting_server::ServerConfig;
///
/// let config = ServerConfig::from_json_str(r#"{ "port": 25575 }"#).unwrap();
/// assert_eq!(config.port, 25575);
/// assert_eq!(config.tx_capacity, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_address: IpAddr,
    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
    /// Capacity of the request buffer.
    pub tx_capacity: usize,
    /// Capacity of the response buffer; the default holds any legal frame.
    pub rx_capacity: usize,
    /// Upper bound on a single socket read.
    pub read_chunk: usize,
    /// Name of the thread that accepts the target's connection.
    pub thread_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            tx_capacity: 4096,
            rx_capacity: MAX_FRAME_LEN,
            read_chunk: 256,
            thread_name: "scripting-server".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tx_capacity < HEADER_LEN {
            return Err(ConfigError::Invalid(format!(
                "tx_capacity must hold the {HEADER_LEN}-byte header, got {}",
                self.tx_capacity
            )));
        }
        if self.rx_capacity < HEADER_LEN {
            return Err(ConfigError::Invalid(format!(
                "rx_capacity must hold the {HEADER_LEN}-byte header, got {}",
                self.rx_capacity
            )));
        }
        if self.read_chunk == 0 {
            return Err(ConfigError::Invalid("read_chunk must be positive".to_owned()));
        }
        if self.thread_name.is_empty() {
            return Err(ConfigError::Invalid("thread_name must not be empty".to_owned()));
        }
        Ok(())
    }
}
