//! # callmedia-sdp-core
//!
//! Structured session description model used by offer/answer media
//! negotiation. Descriptions are handled as typed values: origin, session
//! name, optional session-level connection data and attributes, and an
//! ordered list of media blocks. Parsing the textual wire format is left to
//! the signaling layer; [`SessionDescription`] implements `Display` so that
//! descriptions can be logged.

pub mod builder;
mod display;
pub mod error;
pub mod types;

pub use builder::{MediaBuilder, SdpBuilder};
pub use error::{Result, SdpError};
pub use types::{
    address_type_of, Attribute, ConnectionData, MediaDescription, MediaDirection, Origin,
    SessionDescription, ADDR_TYPE_IP4, ADDR_TYPE_IP6, NET_TYPE_IN, RTCP, RTPMAP, RTP_AVP,
};
