//! Fluent builders for session descriptions and media blocks

use crate::error::{Result, SdpError};
use crate::types::{
    Attribute, ConnectionData, MediaDescription, MediaDirection, Origin, SessionDescription,
    RTCP, RTPMAP, RTP_AVP,
};

/// Builder for [`SessionDescription`]
///
/// ```
/// use callmedia_sdp_core::{SdpBuilder, MediaBuilder};
///
/// let sdp = SdpBuilder::new("-")
///     .origin("alice", 1, 0, "192.0.2.10")
///     .connection("192.0.2.10")
///     .media(MediaBuilder::audio(49170).rtpmap(8, "PCMA/8000").build())
///     .build()
///     .unwrap();
/// assert_eq!(sdp.media_descriptions().map(|m| m.len()), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct SdpBuilder {
    session: SessionDescription,
    media: Vec<MediaDescription>,
}

impl SdpBuilder {
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session: SessionDescription::new(session_name),
            media: Vec::new(),
        }
    }

    /// Set the origin line
    pub fn origin(
        mut self,
        username: impl Into<String>,
        sess_id: u64,
        sess_version: u64,
        address: impl Into<String>,
    ) -> Self {
        self.session
            .set_origin(Origin::new(username, sess_id, sess_version, address));
        self
    }

    /// Set session-level connection data
    pub fn connection(mut self, address: impl Into<String>) -> Self {
        self.session.connection_info = Some(ConnectionData::new(address));
        self
    }

    /// Add a session-level attribute
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.session.attributes.push(attribute);
        self
    }

    /// Append a media block
    pub fn media(mut self, media: MediaDescription) -> Self {
        self.media.push(media);
        self
    }

    /// Finish the description
    ///
    /// Fails when no origin was set or the origin address is blank.
    pub fn build(mut self) -> Result<SessionDescription> {
        let origin = self.session.origin().ok_or(SdpError::MissingOrigin)?;
        if origin.unicast_address.trim().is_empty() {
            return Err(SdpError::invalid_address("origin address is empty"));
        }
        if let Some(connection) = self.session.connection() {
            if connection.connection_address.trim().is_empty() {
                return Err(SdpError::invalid_address("connection address is empty"));
            }
        }
        self.session.set_media_descriptions(self.media);
        Ok(self.session)
    }
}

/// Builder for a single [`MediaDescription`]
#[derive(Debug, Clone)]
pub struct MediaBuilder {
    media: MediaDescription,
}

impl MediaBuilder {
    pub fn new(media: impl Into<String>, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            media: MediaDescription::new(media, port, protocol),
        }
    }

    /// An `audio` block over `RTP/AVP`
    pub fn audio(port: u16) -> Self {
        Self::new("audio", port, RTP_AVP)
    }

    /// Add a format identifier to the m= line
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.media.formats.push(format.into());
        self
    }

    /// Add `a=rtpmap:<payload_type> <signature>` and list the payload type as a format
    pub fn rtpmap(mut self, payload_type: u8, signature: &str) -> Self {
        let format = payload_type.to_string();
        if !self.media.formats.contains(&format) {
            self.media.formats.push(format);
        }
        self.media
            .add_attribute(Attribute::value(RTPMAP, format!("{} {}", payload_type, signature)));
        self
    }

    /// Add `a=rtcp:<value>` verbatim
    pub fn rtcp(mut self, value: impl Into<String>) -> Self {
        self.media.add_attribute(Attribute::value(RTCP, value));
        self
    }

    pub fn direction(mut self, direction: MediaDirection) -> Self {
        self.media.add_attribute(Attribute::property(direction.as_str()));
        self
    }

    /// Set block-level connection data
    pub fn connection(mut self, address: impl Into<String>) -> Self {
        self.media.connection_info = Some(ConnectionData::new(address));
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.media.add_attribute(attribute);
        self
    }

    pub fn build(self) -> MediaDescription {
        self.media
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_requires_origin() {
        let result = SdpBuilder::new("-").connection("10.0.0.1").build();
        assert_eq!(result, Err(SdpError::MissingOrigin));
    }

    #[test]
    fn test_build_rejects_blank_origin_address() {
        let result = SdpBuilder::new("-").origin("-", 1, 0, " ").build();
        assert!(matches!(result, Err(SdpError::InvalidAddress(_))));
    }

    #[test]
    fn test_media_builder_lists_rtpmap_format_once() {
        let media = MediaBuilder::audio(30000)
            .format("97")
            .rtpmap(97, "SPEEX/16000")
            .rtcp("30001")
            .direction(MediaDirection::SendRecv)
            .connection("10.0.0.2")
            .build();

        assert_eq!(media.formats, vec!["97".to_string()]);
        assert_eq!(media.attribute(RTPMAP), Some("97 SPEEX/16000"));
        assert_eq!(media.attribute(RTCP), Some("30001"));
        assert_eq!(media.direction(), Some(MediaDirection::SendRecv));
        assert_eq!(media.connection_info.as_ref().map(|c| c.address()), Some("10.0.0.2"));
    }

    #[test]
    fn test_build_sets_media_list_even_when_empty() {
        let sdp = SdpBuilder::new("-").origin("-", 7, 1, "10.0.0.1").build().unwrap();
        assert_eq!(sdp.media_descriptions().map(|m| m.len()), Some(0));
        assert_eq!(sdp.origin().map(|o| o.sess_id), Some(7));
    }
}
