//! Sub-grammars of the attributes negotiation depends on
//!
//! - `a=rtpmap:<payload type> <encoding name>/<clock rate>[/<parameters>]`
//! - `a=rtcp:<port>` or `a=rtcp:<port> <nettype> <addrtype> <address>` (RFC 3605)

use std::fmt;
use std::net::IpAddr;

use callmedia_sdp_core::{address_type_of, NET_TYPE_IN, RTPMAP};

use crate::error::{NegotiationError, Result};

/// Parsed `rtpmap` attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    pub payload_type: u8,
    pub encoding_name: String,
    pub clock_rate: u32,
    /// Encoding parameters after the clock rate, e.g. channel count
    pub parameters: Option<String>,
}

impl RtpMap {
    /// Parse an rtpmap value
    pub fn parse(value: &str) -> Result<Self> {
        let malformed = || NegotiationError::malformed_attribute(RTPMAP, value);

        let mut tokens = value.split_whitespace();
        let payload_type = tokens
            .next()
            .and_then(|t| t.parse::<u8>().ok())
            .ok_or_else(malformed)?;
        let encoding = tokens.next().ok_or_else(malformed)?;
        if tokens.next().is_some() {
            return Err(malformed());
        }

        let mut parts = encoding.splitn(3, '/');
        let encoding_name = parts.next().filter(|n| !n.is_empty()).ok_or_else(malformed)?;
        let clock_rate = parts
            .next()
            .and_then(|r| r.parse::<u32>().ok())
            .ok_or_else(malformed)?;
        let parameters = parts.next().map(str::to_string);

        Ok(Self {
            payload_type,
            encoding_name: encoding_name.to_string(),
            clock_rate,
            parameters,
        })
    }

    /// `"<encoding>/<clock rate>"`, the codec identity used for matching
    pub fn signature(&self) -> String {
        format!("{}/{}", self.encoding_name, self.clock_rate)
    }

    /// The encoding part of the value, `"<encoding>/<clock rate>[/<parameters>]"`
    pub fn encoding(&self) -> String {
        match &self.parameters {
            Some(parameters) => format!("{}/{}", self.signature(), parameters),
            None => self.signature(),
        }
    }

    /// Same mapping with the encoding name in upper case
    pub fn normalized(&self) -> Self {
        Self {
            encoding_name: self.encoding_name.to_ascii_uppercase(),
            ..self.clone()
        }
    }
}

impl fmt::Display for RtpMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.payload_type, self.encoding())
    }
}

/// Parsed `rtcp` attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInfo {
    pub port: u16,
    /// Present only in the four-token form
    pub address: Option<String>,
}

impl ControlInfo {
    /// Parse an rtcp value
    ///
    /// A numeric-only value is a bare port. Otherwise the value must be
    /// `<port> <nettype> <addrtype> <address>` with an IP address literal.
    /// Values matching neither shape yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            return value.parse::<u16>().ok().map(|port| Self {
                port,
                address: None,
            });
        }

        let tokens: Vec<&str> = value.split_whitespace().collect();
        if tokens.len() != 4 {
            return None;
        }
        let port = tokens[0].parse::<u16>().ok()?;
        let address = tokens[3];
        address.parse::<IpAddr>().ok()?;

        Some(Self {
            port,
            address: Some(address.to_string()),
        })
    }

    /// The four-token form for a local endpoint
    pub fn render(port: u16, address: &str) -> String {
        format!("{} {} {} {}", port, NET_TYPE_IN, address_type_of(address), address)
    }
}

impl fmt::Display for ControlInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => f.write_str(&Self::render(self.port, address)),
            None => write!(f, "{}", self.port),
        }
    }
}
