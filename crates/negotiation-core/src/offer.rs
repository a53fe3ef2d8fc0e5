//! Offer generation
//!
//! The offer advertises one audio block per enabled catalog codec, in catalog
//! order. Every block gets its own freshly allocated port, block-level
//! connection data, a `sendrecv` direction and an explicit control-info
//! attribute in the four-token form.

use std::net::IpAddr;
use std::sync::Arc;

use callmedia_sdp_core::{MediaBuilder, MediaDescription, MediaDirection, SdpBuilder, SessionDescription};
use tracing::{debug, error, info};

use crate::attributes::ControlInfo;
use crate::codec::CodecCatalog;
use crate::error::{NegotiationError, Result};
use crate::ports::PortAllocator;
use crate::types::CallId;

/// Origin username used when none is configured
pub const DEFAULT_USERNAME: &str = "callmedia";
/// Session name used when none is configured
pub const DEFAULT_SESSION_NAME: &str = "-";

/// Builds offers from a codec catalog
#[derive(Debug, Clone)]
pub struct OfferBuilder {
    catalog: CodecCatalog,
    ports: Arc<PortAllocator>,
    username: String,
    session_name: String,
}

impl OfferBuilder {
    pub fn new(catalog: CodecCatalog, ports: Arc<PortAllocator>) -> Self {
        Self {
            catalog,
            ports,
            username: DEFAULT_USERNAME.to_string(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }

    /// Set the origin username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the session name
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }

    pub fn catalog(&self) -> &CodecCatalog {
        &self.catalog
    }

    /// Build an offer for a call
    ///
    /// Fails with [`NegotiationError::OfferBuildFailed`] when the local
    /// address is not an IP address, the catalog has no enabled codec, or
    /// ports run out. Ports allocated before the failure are released.
    pub fn build(&self, call_id: &CallId, local_address: &str) -> Result<SessionDescription> {
        let local_address = parse_local_address(local_address).map_err(|reason| {
            error!("Could not build offer for call {}: {}", call_id, reason);
            NegotiationError::offer_build_failed(reason)
        })?;
        if self.catalog.enabled_count() == 0 {
            error!("Could not build offer for call {}: no enabled codecs", call_id);
            return Err(NegotiationError::offer_build_failed("no enabled codecs in catalog"));
        }

        let mut allocated = Vec::new();
        let mut builder = SdpBuilder::new(self.session_name.as_str()).origin(
            self.username.as_str(),
            session_id_now(),
            0,
            local_address.as_str(),
        );

        for codec in self.catalog.enabled() {
            let port = match self.ports.allocate(call_id) {
                Ok(port) => port,
                Err(e) => {
                    self.ports.release_ports(call_id, &allocated);
                    error!("Could not build offer for call {}: {}", call_id, e);
                    return Err(NegotiationError::offer_build_failed(e.to_string()));
                }
            };
            allocated.push(port);
            builder = builder.media(local_media_block(
                codec.payload_type,
                &codec.rtpmap(),
                port,
                &local_address,
            ));
        }

        let offer = builder.build().map_err(|e| {
            self.ports.release_ports(call_id, &allocated);
            error!("Could not build offer for call {}: {}", call_id, e);
            NegotiationError::offer_build_failed(e.to_string())
        })?;

        info!(
            "{} codecs were declared in offer for call {}",
            allocated.len(),
            call_id
        );
        debug!("Offer for call {}:\n{}", call_id, offer);
        Ok(offer)
    }
}

/// Validate a local address; it is advertised verbatim
pub(crate) fn parse_local_address(local_address: &str) -> std::result::Result<String, String> {
    let trimmed = local_address.trim();
    if trimmed.is_empty() {
        return Err("local address is not set".to_string());
    }
    trimmed
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| format!("local address {:?} is not an IP address", local_address))
}

/// An audio block advertising one local endpoint
pub(crate) fn local_media_block(
    payload_type: u8,
    signature: &str,
    port: u16,
    local_address: &str,
) -> MediaDescription {
    MediaBuilder::audio(port)
        .rtpmap(payload_type, signature)
        .rtcp(ControlInfo::render(port, local_address))
        .direction(MediaDirection::SendRecv)
        .connection(local_address)
        .build()
}

/// Session id derived from the current Unix time
pub(crate) fn session_id_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use callmedia_sdp_core::{RTCP, RTPMAP};
    use pretty_assertions::assert_eq;

    fn builder(catalog: CodecCatalog) -> OfferBuilder {
        OfferBuilder::new(catalog, Arc::new(PortAllocator::default()))
    }

    #[test]
    fn test_offer_has_one_block_per_enabled_codec() {
        let offer = builder(CodecCatalog::default())
            .build(&CallId::from("call-1"), "10.0.0.1")
            .unwrap();

        let blocks = offer.media_descriptions().unwrap();
        let rtpmaps: Vec<&str> = blocks.iter().filter_map(|b| b.attribute(RTPMAP)).collect();
        assert_eq!(
            rtpmaps,
            vec!["8 PCMA/8000", "97 SPEEX/8000", "97 SPEEX/16000", "97 SPEEX/32000"]
        );

        for block in blocks {
            assert!((16384..32767).contains(&block.port));
            assert_eq!(block.connection_info.as_ref().map(|c| c.address()), Some("10.0.0.1"));
            assert_eq!(block.direction(), Some(MediaDirection::SendRecv));
            assert_eq!(
                block.attribute(RTCP),
                Some(format!("{} IN IP4 10.0.0.1", block.port).as_str())
            );
        }
    }

    #[test]
    fn test_offer_origin() {
        let offer = builder(CodecCatalog::default())
            .with_username("alice")
            .build(&CallId::from("call-1"), "10.0.0.1")
            .unwrap();

        let origin = offer.origin().unwrap();
        assert_eq!(origin.username, "alice");
        assert_eq!(origin.sess_version, 0);
        assert_eq!(origin.unicast_address, "10.0.0.1");
        assert!(origin.sess_id > 0);
        assert_eq!(offer.session_name(), DEFAULT_SESSION_NAME);
    }

    #[test]
    fn test_disabled_codecs_are_not_offered() {
        let catalog = CodecCatalog::new(vec![
            Codec::new("PCMU", 0, 8000).disabled(),
            Codec::new("PCMA", 8, 8000),
        ])
        .unwrap();
        let offer = builder(catalog).build(&CallId::from("c"), "10.0.0.1").unwrap();
        assert_eq!(offer.media_descriptions().map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_ipv6_local_address() {
        let offer = builder(CodecCatalog::default())
            .build(&CallId::from("c"), "2001:db8::1")
            .unwrap();
        let block = &offer.media_descriptions().unwrap()[0];
        assert_eq!(
            block.attribute(RTCP),
            Some(format!("{} IN IP6 2001:db8::1", block.port).as_str())
        );
    }

    #[test]
    fn test_invalid_local_address_fails_whole_offer() {
        let ports = Arc::new(PortAllocator::default());
        let offers = OfferBuilder::new(CodecCatalog::default(), ports.clone());

        for address in ["", "   ", "not-an-address"] {
            assert!(matches!(
                offers.build(&CallId::from("c"), address),
                Err(NegotiationError::OfferBuildFailed { .. })
            ));
        }
        assert_eq!(ports.allocated_count(), 0);
    }

    #[test]
    fn test_port_exhaustion_releases_partial_allocation() {
        let ports = Arc::new(PortAllocator::new(crate::ports::PortAllocatorConfig {
            min_port: 20000,
            max_port: 20002,
            max_attempts: 1000,
        }));
        let offers = OfferBuilder::new(CodecCatalog::default(), ports.clone());

        let result = offers.build(&CallId::from("c"), "10.0.0.1");
        assert!(matches!(result, Err(NegotiationError::OfferBuildFailed { .. })));
        assert_eq!(ports.allocated_count(), 0);
    }

    #[test]
    fn test_catalog_without_enabled_codecs() {
        let catalog = CodecCatalog::new(vec![Codec::new("PCMA", 8, 8000).disabled()]).unwrap();
        assert!(matches!(
            builder(catalog).build(&CallId::from("c"), "10.0.0.1"),
            Err(NegotiationError::OfferBuildFailed { .. })
        ));
    }
}
