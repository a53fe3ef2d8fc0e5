//! Logging setup for hosts embedding the negotiator
//!
//! The library only emits `tracing` events. A host may install a subscriber
//! from the `[logging]` section of its negotiator configuration:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! json = false
//! ```
//!
//! The configured level applies to the negotiation and session description
//! crates; everything else stays at `warn`. `RUST_LOG`, when set, replaces
//! these defaults entirely.

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{NegotiationError, Result};

/// Targets whose level follows [`LoggingConfig::level`]
pub const LOG_TARGETS: [&str; 2] = ["callmedia_negotiation_core", "callmedia_sdp_core"];

/// Level of every other target
const OTHER_TARGETS_LEVEL: &str = "warn";

/// `[logging]` section of a negotiator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`
    pub level: String,
    /// One JSON object per event instead of text lines
    pub json: bool,
    pub file_info: bool,
    /// Log span enter/exit
    pub spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
            spans: false,
        }
    }
}

impl LoggingConfig {
    /// The configured level, or a `Config` error naming the bad value
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level
            .trim()
            .parse::<LevelFilter>()
            .map_err(|_| NegotiationError::config(format!("invalid log level {:?}", self.level)))
    }

    /// Default filter directives, e.g. `warn,callmedia_negotiation_core=debug,...`
    pub fn directives(&self) -> Result<String> {
        let level = self.level_filter()?.to_string().to_lowercase();
        let mut directives = OTHER_TARGETS_LEVEL.to_string();
        for target in LOG_TARGETS {
            directives.push_str(&format!(",{}={}", target, level));
        }
        Ok(directives)
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(self.directives()?)
            .map_err(|e| NegotiationError::config(format!("invalid log filter: {}", e)))
    }
}

/// Install a global fmt subscriber for `config`
///
/// Fails on an invalid level, even when `RUST_LOG` would override it, and
/// if a global subscriber is already installed.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    config.level_filter()?;
    let span_events = if config.spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter()?)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        subscriber.with_writer(std::io::stdout).json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| NegotiationError::config(format!("cannot install logger: {}", e)))?;

    tracing::debug!("Logging to stdout at {} for {:?}", config.level, LOG_TARGETS);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_directives_scope_level_to_own_crates() {
        let config = LoggingConfig {
            level: "DEBUG".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.directives().unwrap(),
            "warn,callmedia_negotiation_core=debug,callmedia_sdp_core=debug"
        );
        assert!(EnvFilter::try_new(config.directives().unwrap()).is_ok());
    }

    #[test]
    fn test_off_is_a_level() {
        let config = LoggingConfig {
            level: "off".to_string(),
            ..Default::default()
        };
        assert_eq!(config.level_filter().unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn test_invalid_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.directives(), Err(NegotiationError::Config(_))));
        assert!(setup_logging(&config).is_err());
    }

    #[test]
    fn test_second_setup_fails() {
        let config = LoggingConfig {
            file_info: true,
            ..Default::default()
        };
        let _ = setup_logging(&config);
        assert!(setup_logging(&config).is_err());
    }
}
