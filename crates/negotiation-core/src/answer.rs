//! Answer generation
//!
//! The answer keeps the subset of offered rtpmaps this endpoint also
//! supports. Catalog codecs are visited in catalog order; each claims at most
//! one offered rtpmap and each offered rtpmap is claimed at most once:
//!
//! 1. an unclaimed offered rtpmap with the codec's signature
//!    (case-insensitive), otherwise
//! 2. an unclaimed offered rtpmap with the codec's static payload type whose
//!    signature does not belong to another enabled codec.
//!
//! Each claimed rtpmap is mirrored into its own answer block (encoding name
//! upper-cased) with a fresh local endpoint, exactly like an offer block.

use std::sync::Arc;

use callmedia_sdp_core::{SdpBuilder, SessionDescription, RTPMAP};
use tracing::{debug, error, info, warn};

use crate::attributes::RtpMap;
use crate::codec::{is_static_payload_type, Codec, CodecCatalog};
use crate::error::{NegotiationError, Result};
use crate::offer::{local_media_block, parse_local_address, session_id_now, DEFAULT_USERNAME};
use crate::ports::PortAllocator;
use crate::types::CallId;

/// Result of answering an offer
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// At least one offered codec is supported
    Answer(SessionDescription),
    /// No offered codec is supported, or the offer has no media blocks
    NoMatch,
}

impl AnswerOutcome {
    pub fn answer(&self) -> Option<&SessionDescription> {
        match self {
            AnswerOutcome::Answer(answer) => Some(answer),
            AnswerOutcome::NoMatch => None,
        }
    }

    pub fn into_answer(self) -> Option<SessionDescription> {
        match self {
            AnswerOutcome::Answer(answer) => Some(answer),
            AnswerOutcome::NoMatch => None,
        }
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, AnswerOutcome::NoMatch)
    }
}

/// Builds answers from a codec catalog
#[derive(Debug, Clone)]
pub struct AnswerBuilder {
    catalog: CodecCatalog,
    ports: Arc<PortAllocator>,
    username: String,
}

impl AnswerBuilder {
    pub fn new(catalog: CodecCatalog, ports: Arc<PortAllocator>) -> Self {
        Self {
            catalog,
            ports,
            username: DEFAULT_USERNAME.to_string(),
        }
    }

    /// Set the origin username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn catalog(&self) -> &CodecCatalog {
        &self.catalog
    }

    /// Answer an offer for a call
    ///
    /// A codec mismatch is [`AnswerOutcome::NoMatch`], not an error. Errors
    /// are reserved for an unusable local address and port exhaustion.
    pub fn build(
        &self,
        call_id: &CallId,
        offer: &SessionDescription,
        local_address: &str,
    ) -> Result<AnswerOutcome> {
        let local_address = parse_local_address(local_address).map_err(|reason| {
            error!("Could not build answer for call {}: {}", call_id, reason);
            NegotiationError::answer_build_failed(reason)
        })?;

        let offered = offered_rtpmaps(offer);
        if offered.is_empty() {
            info!("Offer for call {} declares no usable media, no match", call_id);
            return Ok(AnswerOutcome::NoMatch);
        }

        let accepted = self.select(&offered);
        if accepted.is_empty() {
            info!(
                "None of the {} codecs offered for call {} are supported",
                offered.len(),
                call_id
            );
            return Ok(AnswerOutcome::NoMatch);
        }

        let (sess_id, sess_version) = offer
            .origin()
            .map(|o| (o.sess_id, o.sess_version))
            .unwrap_or_else(|| (session_id_now(), 0));
        let mut builder = SdpBuilder::new(offer.session_name()).origin(
            self.username.as_str(),
            sess_id,
            sess_version,
            local_address.as_str(),
        );

        let mut allocated = Vec::new();
        for (codec, rtpmap) in &accepted {
            let port = match self.ports.allocate(call_id) {
                Ok(port) => port,
                Err(e) => {
                    self.ports.release_ports(call_id, &allocated);
                    error!("Could not build answer for call {}: {}", call_id, e);
                    return Err(NegotiationError::answer_build_failed(e.to_string()));
                }
            };
            allocated.push(port);

            let mirrored = rtpmap.normalized();
            debug!("Accepting offered {} for {}", mirrored, codec);
            if !codec.matches_signature(&rtpmap.signature()) {
                warn!(
                    "Offered {} accepted on the static payload type of {}; no flow will be set up for it",
                    mirrored, codec
                );
            }
            builder = builder.media(local_media_block(
                mirrored.payload_type,
                &mirrored.encoding(),
                port,
                &local_address,
            ));
        }

        let answer = builder.build().map_err(|e| {
            self.ports.release_ports(call_id, &allocated);
            error!("Could not build answer for call {}: {}", call_id, e);
            NegotiationError::answer_build_failed(e.to_string())
        })?;

        info!(
            "{} of {} offered codecs were declared in answer for call {}",
            accepted.len(),
            offered.len(),
            call_id
        );
        debug!("Answer for call {}:\n{}", call_id, answer);
        Ok(AnswerOutcome::Answer(answer))
    }

    /// Pair enabled catalog codecs with offered rtpmaps
    fn select<'a>(&'a self, offered: &'a [RtpMap]) -> Vec<(&'a Codec, &'a RtpMap)> {
        let mut claimed = vec![false; offered.len()];
        let mut accepted = Vec::new();

        for codec in self.catalog.enabled() {
            let by_signature = offered
                .iter()
                .enumerate()
                .find(|(i, r)| !claimed[*i] && codec.matches_signature(&r.signature()));

            let chosen = by_signature.or_else(|| {
                offered.iter().enumerate().find(|(i, r)| {
                    !claimed[*i]
                        && is_static_payload_type(r.payload_type)
                        && r.payload_type == codec.payload_type
                        && self.catalog.find_by_signature(&r.signature()).is_none()
                })
            });

            if let Some((index, rtpmap)) = chosen {
                claimed[index] = true;
                accepted.push((codec, rtpmap));
            }
        }

        accepted
    }
}

/// Every readable rtpmap of the offer, in block order
fn offered_rtpmaps(offer: &SessionDescription) -> Vec<RtpMap> {
    let Some(blocks) = offer.media_descriptions() else {
        return Vec::new();
    };

    blocks
        .iter()
        .flat_map(|block| block.attributes_named(RTPMAP))
        .filter_map(|value| match RtpMap::parse(value) {
            Ok(rtpmap) => Some(rtpmap),
            Err(e) => {
                debug!("Skipping offered rtpmap: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::OfferBuilder;
    use callmedia_sdp_core::{MediaBuilder, RTCP};
    use pretty_assertions::assert_eq;

    fn answers(catalog: CodecCatalog) -> AnswerBuilder {
        AnswerBuilder::new(catalog, Arc::new(PortAllocator::default()))
    }

    fn offer_of(rtpmaps: &[(u8, &str)]) -> SessionDescription {
        rtpmaps
            .iter()
            .enumerate()
            .fold(
                SdpBuilder::new("call").origin("bob", 42, 3, "10.0.0.2"),
                |b, (i, (pt, sig))| {
                    b.media(
                        MediaBuilder::audio(20000 + 2 * i as u16)
                            .rtpmap(*pt, sig)
                            .connection("10.0.0.2")
                            .build(),
                    )
                },
            )
            .build()
            .unwrap()
    }

    fn answered_rtpmaps(outcome: &AnswerOutcome) -> Vec<String> {
        outcome
            .answer()
            .and_then(|a| a.media_descriptions())
            .unwrap_or_default()
            .iter()
            .filter_map(|b| b.attribute(RTPMAP).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_answer_selects_supported_subset() {
        let offer = offer_of(&[(0, "PCMU/8000"), (97, "speex/16000"), (8, "PCMA/8000")]);
        let outcome = answers(CodecCatalog::default())
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap();

        // Catalog order, offered payload type, upper-cased encoding
        assert_eq!(answered_rtpmaps(&outcome), vec!["8 PCMA/8000", "97 SPEEX/16000"]);
    }

    #[test]
    fn test_answer_reuses_offer_session_identity() {
        let offer = offer_of(&[(8, "PCMA/8000")]);
        let answer = answers(CodecCatalog::default())
            .with_username("alice")
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap()
            .into_answer()
            .unwrap();

        let origin = answer.origin().unwrap();
        assert_eq!((origin.sess_id, origin.sess_version), (42, 3));
        assert_eq!(origin.username, "alice");
        assert_eq!(origin.unicast_address, "10.0.0.1");
        assert_eq!(answer.session_name(), "call");
    }

    #[test]
    fn test_answer_blocks_carry_local_endpoints() {
        let offer = offer_of(&[(8, "PCMA/8000")]);
        let answer = answers(CodecCatalog::default())
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap()
            .into_answer()
            .unwrap();

        let block = &answer.media_descriptions().unwrap()[0];
        assert!((16384..32767).contains(&block.port));
        assert_eq!(block.connection_info.as_ref().map(|c| c.address()), Some("10.0.0.1"));
        assert_eq!(
            block.attribute(RTCP),
            Some(format!("{} IN IP4 10.0.0.1", block.port).as_str())
        );
    }

    #[test]
    fn test_static_payload_type_match() {
        // Unknown name under PCMA's static number is still PCMA
        let offer = offer_of(&[(8, "G711A/8000")]);
        let outcome = answers(CodecCatalog::default())
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap();
        assert_eq!(answered_rtpmaps(&outcome), vec!["8 G711A/8000"]);
    }

    #[test]
    fn test_static_payload_type_does_not_steal_other_codec() {
        let catalog =
            CodecCatalog::new(vec![Codec::new("PCMU", 0, 8000), Codec::new("PCMA", 8, 8000)]).unwrap();
        // Offered under PCMU's number, but the signature is PCMA's
        let offer = offer_of(&[(0, "PCMA/8000")]);
        let outcome = answers(catalog)
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap();
        assert_eq!(answered_rtpmaps(&outcome), vec!["0 PCMA/8000"]);
    }

    #[test]
    fn test_dynamic_payload_type_needs_signature() {
        let offer = offer_of(&[(97, "OPUS/48000")]);
        let outcome = answers(CodecCatalog::default())
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap();
        assert!(outcome.is_no_match());
    }

    #[test]
    fn test_each_offered_rtpmap_claimed_once() {
        let offer = offer_of(&[(8, "PCMA/8000"), (8, "PCMA/8000")]);
        let outcome = answers(CodecCatalog::default())
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap();
        assert_eq!(answered_rtpmaps(&outcome).len(), 1);
    }

    #[test]
    fn test_empty_offer_is_no_match() {
        let offer = SdpBuilder::new("-").origin("bob", 1, 0, "10.0.0.2").build().unwrap();
        let ports = Arc::new(PortAllocator::default());
        let outcome = AnswerBuilder::new(CodecCatalog::default(), ports.clone())
            .build(&CallId::from("c"), &offer, "10.0.0.1")
            .unwrap();
        assert_eq!(outcome, AnswerOutcome::NoMatch);
        assert_eq!(ports.allocated_count(), 0);

        let no_list = SessionDescription::new("-");
        assert!(answers(CodecCatalog::default())
            .build(&CallId::from("c"), &no_list, "10.0.0.1")
            .unwrap()
            .is_no_match());
    }

    #[test]
    fn test_invalid_local_address() {
        let offer = offer_of(&[(8, "PCMA/8000")]);
        assert!(matches!(
            answers(CodecCatalog::default()).build(&CallId::from("c"), &offer, ""),
            Err(NegotiationError::AnswerBuildFailed { .. })
        ));
    }

    #[test]
    fn test_answer_to_generated_offer_accepts_everything() {
        let ports = Arc::new(PortAllocator::default());
        let offer = OfferBuilder::new(CodecCatalog::default(), ports.clone())
            .build(&CallId::from("a"), "10.0.0.2")
            .unwrap();
        let outcome = AnswerBuilder::new(CodecCatalog::default(), ports.clone())
            .build(&CallId::from("b"), &offer, "10.0.0.1")
            .unwrap();

        assert_eq!(
            answered_rtpmaps(&outcome),
            vec!["8 PCMA/8000", "97 SPEEX/8000", "97 SPEEX/16000", "97 SPEEX/32000"]
        );
        assert_eq!(ports.allocated_count(), 8);
    }
}
