//! Codec catalog
//!
//! The catalog is the ordered list of audio codecs this endpoint supports.
//! It is immutable once built and is injected into the builders, so tests
//! and hosts can substitute their own codec sets.
//!
//! Codec identity for matching is the rtpmap signature `"<encoding>/<clock>"`
//! compared case-insensitively. Payload type numbers are only authoritative
//! in the static range (RFC 3551, 0-34); dynamic numbers are ambiguous across
//! peers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

use crate::error::{NegotiationError, Result};

/// Payload types with a fixed meaning (RFC 3551)
pub const STATIC_PAYLOAD_TYPES: RangeInclusive<u8> = 0..=34;

/// Whether a payload type number has a static assignment
pub fn is_static_payload_type(payload_type: u8) -> bool {
    STATIC_PAYLOAD_TYPES.contains(&payload_type)
}

/// A supported audio codec
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Codec {
    pub encoding_name: String,
    pub payload_type: u8,
    pub clock_rate: u32,
    pub enabled: bool,
}

impl Codec {
    /// Create an enabled codec
    pub fn new(encoding_name: impl Into<String>, payload_type: u8, clock_rate: u32) -> Self {
        Self {
            encoding_name: encoding_name.into(),
            payload_type,
            clock_rate,
            enabled: true,
        }
    }

    /// Same codec, disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The rtpmap signature, `"<encoding>/<clock rate>"`
    pub fn rtpmap(&self) -> String {
        format!("{}/{}", self.encoding_name, self.clock_rate)
    }

    /// Case-insensitive comparison against an rtpmap signature
    pub fn matches_signature(&self, signature: &str) -> bool {
        self.rtpmap().eq_ignore_ascii_case(signature.trim())
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PT:{})", self.rtpmap(), self.payload_type)
    }
}

/// Ordered, immutable list of supported codecs
///
/// Cloning is cheap; the list is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecCatalog {
    codecs: Arc<[Codec]>,
}

impl CodecCatalog {
    /// Build a catalog, rejecting duplicate signatures among enabled entries
    pub fn new(codecs: Vec<Codec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for codec in codecs.iter().filter(|c| c.enabled) {
            if codec.encoding_name.trim().is_empty() {
                return Err(NegotiationError::config("codec with empty encoding name"));
            }
            if codec.clock_rate == 0 {
                return Err(NegotiationError::config(format!(
                    "codec {} has a zero clock rate",
                    codec.encoding_name
                )));
            }
            if !seen.insert(codec.rtpmap().to_ascii_lowercase()) {
                return Err(NegotiationError::config(format!(
                    "duplicate enabled codec signature {}",
                    codec.rtpmap()
                )));
            }
        }

        debug!("Initialized codec catalog with {} codecs ({} enabled)", codecs.len(), seen.len());
        Ok(Self {
            codecs: codecs.into(),
        })
    }

    /// All codecs in catalog order, enabled or not
    pub fn iter(&self) -> impl Iterator<Item = &Codec> {
        self.codecs.iter()
    }

    /// Enabled codecs in catalog order
    pub fn enabled(&self) -> impl Iterator<Item = &Codec> {
        self.codecs.iter().filter(|c| c.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    /// The enabled codec with the given rtpmap signature
    pub fn find_by_signature(&self, signature: &str) -> Option<&Codec> {
        self.enabled().find(|c| c.matches_signature(signature))
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for CodecCatalog {
    /// PCMA/8000 plus SPEEX at 8, 16 and 32 kHz
    fn default() -> Self {
        Self {
            codecs: vec![
                Codec::new("PCMA", 8, 8000),
                Codec::new("SPEEX", 97, 8000),
                Codec::new("SPEEX", 97, 16000),
                Codec::new("SPEEX", 97, 32000),
            ]
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = CodecCatalog::default();
        let signatures: Vec<String> = catalog.enabled().map(|c| c.rtpmap()).collect();
        assert_eq!(signatures, vec!["PCMA/8000", "SPEEX/8000", "SPEEX/16000", "SPEEX/32000"]);
        // The default list must pass the same validation as injected ones
        assert!(CodecCatalog::new(catalog.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn test_signature_lookup_is_case_insensitive() {
        let catalog = CodecCatalog::default();
        let codec = catalog.find_by_signature("speex/16000").unwrap();
        assert_eq!(codec.clock_rate, 16000);
        assert!(catalog.find_by_signature("PCMU/8000").is_none());
    }

    #[test]
    fn test_disabled_codecs_are_invisible() {
        let catalog = CodecCatalog::new(vec![
            Codec::new("PCMA", 8, 8000),
            Codec::new("PCMU", 0, 8000).disabled(),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.enabled_count(), 1);
        assert!(catalog.find_by_signature("PCMU/8000").is_none());
    }

    #[test]
    fn test_duplicate_enabled_signature_rejected() {
        let result = CodecCatalog::new(vec![Codec::new("PCMA", 8, 8000), Codec::new("pcma", 8, 8000)]);
        assert!(matches!(result, Err(NegotiationError::Config(_))));

        // A disabled duplicate is fine
        let result = CodecCatalog::new(vec![
            Codec::new("PCMA", 8, 8000),
            Codec::new("PCMA", 8, 8000).disabled(),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_static_payload_range() {
        assert!(is_static_payload_type(0));
        assert!(is_static_payload_type(34));
        assert!(!is_static_payload_type(35));
        assert!(!is_static_payload_type(97));
    }
}
