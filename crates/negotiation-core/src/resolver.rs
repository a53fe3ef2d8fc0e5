//! Connection resolver
//!
//! Extracts, from one session description, the data (RTP) and control
//! (RTCP) endpoints of every rtpmap line. Resolution per media block:
//!
//! 1. Blocks without an rtpmap attribute are skipped.
//! 2. Data address: block-level connection data, else session-level
//!    connection data, else the block is reported as
//!    [`ExtractionIssue::Ignored`]. Data port is the block's port.
//! 3. Control endpoint: the block's `rtcp` attribute, else the session-level
//!    `rtcp` attribute, else `data port + 1` on the data address. A parsed
//!    control value without an address uses the data address.
//! 4. A malformed rtpmap is reported as [`ExtractionIssue::PartiallyFailed`]
//!    for that line only; later lines and blocks are still resolved.
//!
//! A description without a media list yields a single
//! [`ExtractionIssue::FailedCompletely`] and no endpoints.
//!
//! Extraction is lazy and borrows the description, so it can be restarted by
//! calling [`extract_endpoints`] again.

use std::collections::VecDeque;
use std::fmt;

use callmedia_sdp_core::{MediaDescription, SessionDescription, RTCP, RTPMAP};
use tracing::{debug, warn};

use crate::attributes::{ControlInfo, RtpMap};
use crate::types::Endpoint;

/// Endpoints resolved for one rtpmap line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEndpoints {
    /// Position of the media block in the description
    pub block_index: usize,
    pub rtpmap: RtpMap,
    pub data: Endpoint,
    pub control: Endpoint,
}

impl MediaEndpoints {
    /// rtpmap signature, `"<encoding>/<clock rate>"`
    pub fn signature(&self) -> String {
        self.rtpmap.signature()
    }

    pub fn payload_type(&self) -> u8 {
        self.rtpmap.payload_type
    }
}

/// Non-fatal problems reported during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionIssue {
    /// The block has no connection data at block or session level
    Ignored {
        block_index: usize,
        signature: String,
        payload_type: u8,
    },
    /// An attribute of the block could not be read
    PartiallyFailed { block_index: usize, reason: String },
    /// The description has no media list
    FailedCompletely { reason: String },
}

impl fmt::Display for ExtractionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionIssue::Ignored {
                block_index,
                signature,
                payload_type,
            } => write!(
                f,
                "media block #{} ({} - {}) ignored: no connection info",
                block_index, signature, payload_type
            ),
            ExtractionIssue::PartiallyFailed {
                block_index,
                reason,
            } => write!(f, "media block #{} partially failed: {}", block_index, reason),
            ExtractionIssue::FailedCompletely { reason } => {
                write!(f, "extraction failed completely: {}", reason)
            }
        }
    }
}

/// One item produced by [`Extraction`]
pub type ExtractionItem = Result<MediaEndpoints, ExtractionIssue>;

/// Resolve the endpoints of every rtpmap line in a description
pub fn extract_endpoints(sdp: &SessionDescription) -> Extraction<'_> {
    let session_control = sdp.attribute(RTCP).and_then(|value| {
        let parsed = ControlInfo::parse(value);
        if parsed.is_none() {
            debug!("Unusable session-level rtcp attribute {:?}", value);
        }
        parsed
    });

    let session_address = sdp
        .connection()
        .map(|c| c.address())
        .filter(|a| !a.trim().is_empty());
    if session_address.is_none() {
        debug!("No session-level connection address");
    }

    let (blocks, pending) = match sdp.media_descriptions() {
        Some(blocks) => (blocks, VecDeque::new()),
        None => (
            &[][..],
            VecDeque::from([Err(ExtractionIssue::FailedCompletely {
                reason: "session description has no media descriptions".to_string(),
            })]),
        ),
    };

    Extraction {
        blocks,
        next_block: 0,
        session_address,
        session_control,
        pending,
    }
}

/// Lazy iterator over resolved endpoints, see [`extract_endpoints`]
#[derive(Debug, Clone)]
pub struct Extraction<'a> {
    blocks: &'a [MediaDescription],
    next_block: usize,
    session_address: Option<&'a str>,
    session_control: Option<ControlInfo>,
    pending: VecDeque<ExtractionItem>,
}

impl<'a> Extraction<'a> {
    /// Only the resolved endpoints; issues are logged and dropped
    pub fn endpoints(self) -> impl Iterator<Item = MediaEndpoints> + 'a {
        self.filter_map(|item| match item {
            Ok(endpoints) => Some(endpoints),
            Err(issue) => {
                warn!("{}", issue);
                None
            }
        })
    }

    fn resolve_block(&self, block_index: usize, block: &MediaDescription) -> Vec<ExtractionItem> {
        let mut items = Vec::new();

        for attribute in block.attributes.iter().filter(|a| a.name == RTPMAP) {
            let Some(value) = attribute.value.as_deref() else {
                items.push(Err(ExtractionIssue::PartiallyFailed {
                    block_index,
                    reason: "rtpmap attribute without a value".to_string(),
                }));
                continue;
            };

            let rtpmap = match RtpMap::parse(value) {
                Ok(rtpmap) => rtpmap,
                Err(e) => {
                    items.push(Err(ExtractionIssue::PartiallyFailed {
                        block_index,
                        reason: e.to_string(),
                    }));
                    continue;
                }
            };
            debug!(
                "Media block #{}: rtpmap {} (PT:{})",
                block_index,
                rtpmap.signature(),
                rtpmap.payload_type
            );

            let block_address = block
                .connection_info
                .as_ref()
                .map(|c| c.address())
                .filter(|a| !a.trim().is_empty());
            let data_address = match block_address.or(self.session_address) {
                Some(address) => address,
                None => {
                    items.push(Err(ExtractionIssue::Ignored {
                        block_index,
                        signature: rtpmap.signature(),
                        payload_type: rtpmap.payload_type,
                    }));
                    continue;
                }
            };
            if block_address.is_none() {
                debug!(
                    "Media block #{} has no connection info, using session connection {}",
                    block_index, data_address
                );
            }
            let data = Endpoint::new(data_address, block.port);

            let control = match self.resolve_control(block_index, block, &data) {
                Some(control) => control,
                None => {
                    items.push(Err(ExtractionIssue::PartiallyFailed {
                        block_index,
                        reason: format!("no control port can follow data port {}", data.port),
                    }));
                    continue;
                }
            };

            items.push(Ok(MediaEndpoints {
                block_index,
                rtpmap,
                data,
                control,
            }));
        }

        items
    }

    fn resolve_control(
        &self,
        block_index: usize,
        block: &MediaDescription,
        data: &Endpoint,
    ) -> Option<Endpoint> {
        let block_control = block.attribute(RTCP).and_then(|value| {
            let parsed = ControlInfo::parse(value);
            if parsed.is_none() {
                debug!("Media block #{}: unusable rtcp attribute {:?}", block_index, value);
            }
            parsed
        });

        match block_control.as_ref().or(self.session_control.as_ref()) {
            Some(control) => Some(Endpoint::new(
                control.address.clone().unwrap_or_else(|| data.address.clone()),
                control.port,
            )),
            None => {
                debug!(
                    "Media block #{}: no control info, defaulting to data port + 1",
                    block_index
                );
                data.port
                    .checked_add(1)
                    .map(|port| Endpoint::new(data.address.clone(), port))
            }
        }
    }
}

impl<'a> Iterator for Extraction<'a> {
    type Item = ExtractionItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            let blocks = self.blocks;
            let block = blocks.get(self.next_block)?;
            let block_index = self.next_block;
            self.next_block += 1;
            let items = self.resolve_block(block_index, block);
            self.pending.extend(items);
        }
    }
}
