//! Session description data model
//!
//! A session description is consumed and produced as structured data. These
//! types mirror the fields of RFC 4566 that offer/answer negotiation relies
//! on: the origin, the session name, session- and media-level connection
//! data, attributes, and the ordered list of media blocks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute name carrying the RTP payload mapping (`a=rtpmap`)
pub const RTPMAP: &str = "rtpmap";
/// Attribute name carrying the control (RTCP) endpoint (`a=rtcp`, RFC 3605)
pub const RTCP: &str = "rtcp";
/// RTP audio/video profile transport tag
pub const RTP_AVP: &str = "RTP/AVP";
/// Internet network type
pub const NET_TYPE_IN: &str = "IN";
/// IPv4 address type
pub const ADDR_TYPE_IP4: &str = "IP4";
/// IPv6 address type
pub const ADDR_TYPE_IP6: &str = "IP6";

/// Origin (o=) field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub username: String,
    pub sess_id: u64,
    pub sess_version: u64,
    pub net_type: String,
    pub addr_type: String,
    pub unicast_address: String,
}

impl Origin {
    /// Create an `IN` origin, deriving the address type from the address text
    pub fn new(
        username: impl Into<String>,
        sess_id: u64,
        sess_version: u64,
        unicast_address: impl Into<String>,
    ) -> Self {
        let unicast_address = unicast_address.into();
        Self {
            username: username.into(),
            sess_id,
            sess_version,
            net_type: NET_TYPE_IN.to_string(),
            addr_type: address_type_of(&unicast_address).to_string(),
            unicast_address,
        }
    }
}

/// Connection data (c=) field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    pub net_type: String,
    pub addr_type: String,
    pub connection_address: String,
}

impl ConnectionData {
    /// Create `IN` connection data for an address
    pub fn new(connection_address: impl Into<String>) -> Self {
        let connection_address = connection_address.into();
        Self {
            net_type: NET_TYPE_IN.to_string(),
            addr_type: address_type_of(&connection_address).to_string(),
            connection_address,
        }
    }

    /// The connection address
    pub fn address(&self) -> &str {
        &self.connection_address
    }
}

/// `IP6` when the text contains a colon, `IP4` otherwise
pub fn address_type_of(address: &str) -> &'static str {
    if address.contains(':') {
        ADDR_TYPE_IP6
    } else {
        ADDR_TYPE_IP4
    }
}

/// Attribute (a=) field
///
/// Property attributes such as `a=sendrecv` carry no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    /// A `name:value` attribute
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A property attribute without a value
    pub fn property(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Media direction attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaDirection {
    /// Send and receive media
    SendRecv,
    /// Send only
    SendOnly,
    /// Receive only
    RecvOnly,
    /// No media flow
    Inactive,
}

impl MediaDirection {
    /// Attribute name as written in a description
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaDirection::SendRecv => "sendrecv",
            MediaDirection::SendOnly => "sendonly",
            MediaDirection::RecvOnly => "recvonly",
            MediaDirection::Inactive => "inactive",
        }
    }

    /// Parse a direction attribute name
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "sendrecv" => Some(MediaDirection::SendRecv),
            "sendonly" => Some(MediaDirection::SendOnly),
            "recvonly" => Some(MediaDirection::RecvOnly),
            "inactive" => Some(MediaDirection::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for MediaDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media description (m= block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescription {
    /// Media type, e.g. `audio`
    pub media: String,
    pub port: u16,
    /// Transport protocol tag, e.g. `RTP/AVP`
    pub protocol: String,
    /// Format identifiers (payload type numbers for RTP profiles)
    pub formats: Vec<String>,
    /// Block-level connection data, overriding the session-level one
    pub connection_info: Option<ConnectionData>,
    pub attributes: Vec<Attribute>,
}

impl MediaDescription {
    /// Create a media block with no formats or attributes
    pub fn new(media: impl Into<String>, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            media: media.into(),
            port,
            protocol: protocol.into(),
            formats: Vec::new(),
            connection_info: None,
            attributes: Vec::new(),
        }
    }

    /// Value of the first attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute(&self.attributes, name)
    }

    /// Values of all attributes with the given name, in order
    pub fn attributes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .iter()
            .filter(move |a| a.name == name)
            .filter_map(|a| a.value.as_deref())
    }

    /// Whether an attribute with this name is present, with or without a value
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Direction attribute of the block, if one is declared
    pub fn direction(&self) -> Option<MediaDirection> {
        self.attributes
            .iter()
            .find_map(|a| MediaDirection::from_attribute(&a.name))
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }
}

/// Session description
///
/// `media_descriptions` is `None` when the document carries no media list at
/// all, which is distinct from an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub version: u8,
    pub origin: Option<Origin>,
    pub session_name: String,
    pub connection_info: Option<ConnectionData>,
    pub attributes: Vec<Attribute>,
    pub media_descriptions: Option<Vec<MediaDescription>>,
}

impl SessionDescription {
    /// An empty description with the given session name
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            version: 0,
            origin: None,
            session_name: session_name.into(),
            connection_info: None,
            attributes: Vec::new(),
            media_descriptions: None,
        }
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Session-level connection data
    pub fn connection(&self) -> Option<&ConnectionData> {
        self.connection_info.as_ref()
    }

    /// Value of the first session-level attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute(&self.attributes, name)
    }

    /// Media blocks, or `None` when the description has no media list
    pub fn media_descriptions(&self) -> Option<&[MediaDescription]> {
        self.media_descriptions.as_deref()
    }

    pub fn set_media_descriptions(&mut self, media: Vec<MediaDescription>) {
        self.media_descriptions = Some(media);
    }

    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    pub fn set_session_name(&mut self, session_name: impl Into<String>) {
        self.session_name = session_name.into();
    }
}

fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .and_then(|a| a.value.as_deref())
}
