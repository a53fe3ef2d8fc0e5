//! Flow table construction from an offer/answer pair
//!
//! Every resolved answer entry is compared against every resolved offer
//! entry. Two entries match when their rtpmap signatures are equal
//! (case-insensitive); payload type numbers are not compared. A match is kept
//! only if the signature names an enabled catalog codec, and a later match
//! for the same codec replaces an earlier one.
//!
//! The caller generated the offer, so its local endpoints come from the offer
//! and its remote endpoints from the answer. The callee is the reverse.

use std::fmt;

use callmedia_sdp_core::SessionDescription;
use tracing::{debug, error, info, warn};

use crate::codec::CodecCatalog;
use crate::flow::{FlowEntry, FlowTable};
use crate::resolver::{extract_endpoints, ExtractionIssue, MediaEndpoints};
use crate::types::CallRole;

/// Which document of the exchange is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    Offer,
    Answer,
}

impl fmt::Display for DescriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionKind::Offer => f.write_str("OFFER"),
            DescriptionKind::Answer => f.write_str("ANSWER"),
        }
    }
}

/// Build the flow table of a call from its offer and answer
///
/// Never fails: unresolvable blocks are logged and skipped, and a pair with
/// no common codec yields an empty table.
pub fn negotiate(
    catalog: &CodecCatalog,
    offer: &SessionDescription,
    answer: &SessionDescription,
    role: CallRole,
) -> FlowTable {
    let answer_entries = resolved(answer, role, DescriptionKind::Answer);
    let offer_entries = resolved(offer, role, DescriptionKind::Offer);
    let mut flows = FlowTable::new();

    for answered in &answer_entries {
        for offered in &offer_entries {
            let signature = answered.signature();
            if !offered.signature().eq_ignore_ascii_case(&signature) {
                continue;
            }

            let Some(codec) = catalog.find_by_signature(&signature) else {
                error!(
                    "Found a codec match {} - {} that is not supported",
                    signature,
                    answered.payload_type()
                );
                continue;
            };
            info!("Found a codec match: {} - {}", signature, answered.payload_type());

            let (local, remote) = match role {
                CallRole::Caller => (offered, answered),
                CallRole::Callee => (answered, offered),
            };
            let entry = FlowEntry {
                local_data: local.data.clone(),
                local_control: local.control.clone(),
                remote_data: remote.data.clone(),
                remote_control: remote.control.clone(),
            };
            if let Some(previous) = flows.insert(codec.clone(), entry) {
                debug!("Replacing flow for {} ({})", codec, previous);
            }
        }
    }

    info!("Negotiated {} flows as {}", flows.len(), role);
    flows
}

/// Resolve one document, logging the issues with the call context
fn resolved(sdp: &SessionDescription, role: CallRole, kind: DescriptionKind) -> Vec<MediaEndpoints> {
    extract_endpoints(sdp)
        .filter_map(|item| match item {
            Ok(endpoints) => {
                debug!(
                    "{} {} block #{}: {} data {} control {}",
                    role,
                    kind,
                    endpoints.block_index,
                    endpoints.rtpmap,
                    endpoints.data,
                    endpoints.control
                );
                Some(endpoints)
            }
            Err(issue) => {
                match &issue {
                    ExtractionIssue::FailedCompletely { .. } => {
                        error!("{} could not read {} media: {}", role, kind, issue)
                    }
                    _ => warn!("{} reading {} media: {}", role, kind, issue),
                }
                None
            }
        })
        .collect()
}
