//! Transport collaborator seam
//!
//! Negotiation only decides which endpoints to use. Binding sockets and
//! exchanging media belongs to a [`MediaTransport`] supplied by the host.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::flow::FlowTable;
use crate::types::{CallId, CallRole};

/// Performs the actual media setup for negotiated flows
///
/// An empty flow table means there is no media to set up; implementations
/// should treat it as a no-op rather than an error.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Bind and connect every flow of a call
    async fn setup_flows(&self, call_id: &CallId, role: CallRole, flows: &FlowTable) -> Result<()>;

    /// Tear down every flow of a call
    async fn teardown_flows(&self, call_id: &CallId, flows: &FlowTable) -> Result<()>;
}

/// Transport that only reports what should be set up
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTransport;

#[async_trait]
impl MediaTransport for LoggingTransport {
    async fn setup_flows(&self, call_id: &CallId, role: CallRole, flows: &FlowTable) -> Result<()> {
        if flows.is_empty() {
            info!("No media to set up for call {} as {}", call_id, role);
            return Ok(());
        }
        for (codec, flow) in flows {
            info!(
                "Should set up a {} data stream from {} (origin) to {} (destination)",
                codec, flow.local_data, flow.remote_data
            );
            info!(
                "Should set up a {} control stream from {} (origin) to {} (destination)",
                codec, flow.local_control, flow.remote_control
            );
        }
        Ok(())
    }

    async fn teardown_flows(&self, call_id: &CallId, flows: &FlowTable) -> Result<()> {
        if flows.is_empty() {
            info!("No media to tear down for call {}", call_id);
            return Ok(());
        }
        for (codec, flow) in flows {
            info!(
                "Should terminate a {} data stream from {} (origin) to {} (destination)",
                codec, flow.local_data, flow.remote_data
            );
            info!(
                "Should terminate a {} control stream from {} (origin) to {} (destination)",
                codec, flow.local_control, flow.remote_control
            );
        }
        Ok(())
    }
}
