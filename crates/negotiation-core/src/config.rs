//! Negotiator configuration
//!
//! Loaded from TOML; every field has a default, so an empty document is a
//! valid configuration:
//!
//! ```toml
//! username = "callmedia"
//! session_name = "-"
//! max_port_attempts = 64
//!
//! [port_range]
//! min = 16384
//! max = 32767
//!
//! [[codecs]]
//! name = "PCMA"
//! payload_type = 8
//! clock_rate = 8000
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::{Codec, CodecCatalog};
use crate::error::{NegotiationError, Result};
use crate::logging::{setup_logging, LoggingConfig};
use crate::offer::{DEFAULT_SESSION_NAME, DEFAULT_USERNAME};
use crate::ports::{PortAllocator, PortAllocatorConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PORT, DEFAULT_MIN_PORT};

/// Local media port range, `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_PORT,
            max: DEFAULT_MAX_PORT,
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub name: String,
    pub payload_type: u8,
    pub clock_rate: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl From<&Codec> for CodecConfig {
    fn from(codec: &Codec) -> Self {
        Self {
            name: codec.encoding_name.clone(),
            payload_type: codec.payload_type,
            clock_rate: codec.clock_rate,
            enabled: codec.enabled,
        }
    }
}

impl From<&CodecConfig> for Codec {
    fn from(config: &CodecConfig) -> Self {
        Self {
            encoding_name: config.name.clone(),
            payload_type: config.payload_type,
            clock_rate: config.clock_rate,
            enabled: config.enabled,
        }
    }
}

/// Configuration of a [`MediaNegotiator`](crate::MediaNegotiator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiatorConfig {
    /// Origin username of generated descriptions
    pub username: String,
    /// Session name of generated offers
    pub session_name: String,
    pub port_range: PortRange,
    /// Random draws per port before giving up
    pub max_port_attempts: usize,
    /// Supported codecs, in preference order
    pub codecs: Vec<CodecConfig>,
    pub logging: LoggingConfig,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            port_range: PortRange::default(),
            max_port_attempts: DEFAULT_MAX_ATTEMPTS,
            codecs: CodecCatalog::default().iter().map(CodecConfig::from).collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl NegotiatorConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| NegotiationError::config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            NegotiationError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check the port range, attempt budget, log level and codec list
    pub fn validate(&self) -> Result<()> {
        if self.port_range.min >= self.port_range.max {
            return Err(NegotiationError::config(format!(
                "empty port range {}..{}",
                self.port_range.min, self.port_range.max
            )));
        }
        if self.max_port_attempts == 0 {
            return Err(NegotiationError::config("max_port_attempts must be at least 1"));
        }
        if self.username.trim().is_empty() || self.username.contains(char::is_whitespace) {
            return Err(NegotiationError::config(format!(
                "username {:?} must be a single non-empty token",
                self.username
            )));
        }
        self.logging.level_filter()?;
        self.catalog().map(|_| ())
    }

    /// Install the global log subscriber described by `[logging]`
    pub fn init_logging(&self) -> Result<()> {
        setup_logging(&self.logging)
    }

    /// The codec catalog described by `codecs`
    pub fn catalog(&self) -> Result<CodecCatalog> {
        CodecCatalog::new(self.codecs.iter().map(Codec::from).collect())
    }

    pub fn port_allocator_config(&self) -> PortAllocatorConfig {
        PortAllocatorConfig {
            min_port: self.port_range.min,
            max_port: self.port_range.max,
            max_attempts: self.max_port_attempts,
        }
    }

    /// Allocator for this configuration
    ///
    /// The process-wide allocator when the range and attempt budget match
    /// its own, a private one otherwise.
    pub fn port_allocator(&self) -> Arc<PortAllocator> {
        let config = self.port_allocator_config();
        let global = PortAllocator::global();
        if global.config() == &config {
            global
        } else {
            Arc::new(PortAllocator::new(config))
        }
    }
}
