//! # callmedia-negotiation-core
//!
//! Offer/answer negotiation of audio media (RFC 3264) over structured
//! session descriptions.
//!
//! One side builds an offer listing every supported codec with its own
//! local endpoint; the other side answers with the subset it also supports.
//! Each side then resolves, from the pair of descriptions, the data (RTP) and
//! control (RTCP) endpoints of every agreed codec and records them as local
//! or remote according to its role in the call.
//!
//! ```
//! use callmedia_negotiation_core::{CallId, MediaNegotiator, NegotiatorConfig};
//!
//! let alice = MediaNegotiator::new(NegotiatorConfig::default()).unwrap();
//! let bob = MediaNegotiator::new(NegotiatorConfig::default()).unwrap();
//! let call = CallId::from("call-1");
//!
//! let offer = alice.generate_offer(&call, "192.0.2.10").unwrap();
//! let answer = bob
//!     .generate_answer(&call, &offer, "192.0.2.20")
//!     .unwrap()
//!     .into_answer()
//!     .unwrap();
//! alice.receive_answer(&call, answer).unwrap();
//!
//! assert_eq!(alice.flow_table(&call).unwrap().len(), 4);
//!
//! // Each side releases only the ports it allocated
//! alice.terminate(&call);
//! assert_eq!(bob.port_allocator().ports_of(&call).len(), 4);
//! bob.terminate(&call);
//! ```

pub mod answer;
pub mod attributes;
pub mod codec;
pub mod config;
pub mod error;
pub mod flow;
pub mod logging;
pub mod negotiation;
pub mod negotiator;
pub mod offer;
pub mod ports;
pub mod resolver;
pub mod store;
pub mod transport;
pub mod types;

pub use answer::{AnswerBuilder, AnswerOutcome};
pub use attributes::{ControlInfo, RtpMap};
pub use codec::{is_static_payload_type, Codec, CodecCatalog, STATIC_PAYLOAD_TYPES};
pub use config::{CodecConfig, NegotiatorConfig, PortRange};
pub use error::{NegotiationError, Result};
pub use flow::{FlowEntry, FlowTable};
pub use logging::{setup_logging, LoggingConfig};
pub use negotiation::{negotiate, DescriptionKind};
pub use negotiator::{MediaNegotiator, MediaNegotiatorBuilder};
pub use offer::OfferBuilder;
pub use ports::{PortAllocator, PortAllocatorConfig};
pub use resolver::{extract_endpoints, Extraction, ExtractionIssue, MediaEndpoints};
pub use store::{CallRecord, CallRecordStore};
pub use transport::{LoggingTransport, MediaTransport};
pub use types::{CallId, CallRole, Endpoint};

/// Re-export of the session description model
pub use callmedia_sdp_core as sdp;
