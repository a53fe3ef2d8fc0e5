//! Host-facing negotiation facade
//!
//! [`MediaNegotiator`] ties the builders, the flow table construction and the
//! call record store together behind the operations a signaling layer
//! needs:
//!
//! - caller side: [`generate_offer`](MediaNegotiator::generate_offer), then
//!   [`receive_answer`](MediaNegotiator::receive_answer) once the remote
//!   answer arrives;
//! - callee side: [`generate_answer`](MediaNegotiator::generate_answer),
//!   which negotiates immediately;
//! - both sides: [`flow_table`](MediaNegotiator::flow_table),
//!   [`perform_session_setup`](MediaNegotiator::perform_session_setup) and
//!   [`terminate`](MediaNegotiator::terminate).

use std::fmt;
use std::sync::Arc;

use callmedia_sdp_core::SessionDescription;
use tracing::{debug, info, warn};

use crate::answer::{AnswerBuilder, AnswerOutcome};
use crate::codec::CodecCatalog;
use crate::config::NegotiatorConfig;
use crate::error::{NegotiationError, Result};
use crate::flow::FlowTable;
use crate::negotiation::negotiate;
use crate::offer::OfferBuilder;
use crate::ports::PortAllocator;
use crate::store::{CallRecord, CallRecordStore};
use crate::transport::{LoggingTransport, MediaTransport};
use crate::types::{CallId, CallRole};

/// Offer/answer negotiation for many concurrent calls
#[derive(Clone)]
pub struct MediaNegotiator {
    catalog: CodecCatalog,
    offers: OfferBuilder,
    answers: AnswerBuilder,
    ports: Arc<PortAllocator>,
    store: CallRecordStore,
    transport: Arc<dyn MediaTransport>,
}

impl fmt::Debug for MediaNegotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaNegotiator")
            .field("catalog", &self.catalog)
            .field("calls", &self.store.len())
            .field("allocated_ports", &self.ports.allocated_count())
            .finish()
    }
}

impl MediaNegotiator {
    /// Negotiator for a configuration, reporting flows through [`LoggingTransport`]
    pub fn new(config: NegotiatorConfig) -> Result<Self> {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> MediaNegotiatorBuilder {
        MediaNegotiatorBuilder::new()
    }

    pub fn catalog(&self) -> &CodecCatalog {
        &self.catalog
    }

    pub fn port_allocator(&self) -> &Arc<PortAllocator> {
        &self.ports
    }

    /// Number of calls currently tracked
    pub fn active_calls(&self) -> usize {
        self.store.len()
    }

    /// Generate an offer and start tracking the call as caller
    pub fn generate_offer(&self, call_id: &CallId, local_address: &str) -> Result<SessionDescription> {
        let offer = self.offers.build(call_id, local_address)?;
        let local_ports = media_ports(&offer);
        let replaced =
            self.store
                .create_for_offer(call_id.clone(), CallRole::Caller, offer.clone(), local_ports);
        self.release_replaced(call_id, replaced);
        Ok(offer)
    }

    /// Answer a remote offer and negotiate the call as callee
    ///
    /// On [`AnswerOutcome::NoMatch`] the call is still tracked, with an empty
    /// flow table.
    pub fn generate_answer(
        &self,
        call_id: &CallId,
        offer: &SessionDescription,
        local_address: &str,
    ) -> Result<AnswerOutcome> {
        let outcome = self.answers.build(call_id, offer, local_address)?;

        let replaced = match &outcome {
            AnswerOutcome::Answer(answer) => {
                let flows = negotiate(&self.catalog, offer, answer, CallRole::Callee);
                self.store.create_negotiated(
                    call_id.clone(),
                    CallRole::Callee,
                    offer.clone(),
                    answer.clone(),
                    flows,
                    media_ports(answer),
                )
            }
            AnswerOutcome::NoMatch => {
                warn!("No common codec for call {}, no media will be set up", call_id);
                self.store
                    .create_for_offer(call_id.clone(), CallRole::Callee, offer.clone(), Vec::new())
            }
        };
        self.release_replaced(call_id, replaced);

        Ok(outcome)
    }

    /// Attach the remote answer to an offered call and negotiate it
    pub fn receive_answer(&self, call_id: &CallId, answer: SessionDescription) -> Result<()> {
        let record = self.store.attach_answer(call_id, answer)?;
        let Some(answer) = record.answer.as_ref() else {
            return Err(NegotiationError::call_not_found(call_id.as_str()));
        };

        let flows = negotiate(&self.catalog, &record.offer, answer, record.role);
        if flows.is_empty() {
            warn!("Answer for call {} left no common codec", call_id);
        }
        self.store.set_flows(call_id, flows)
    }

    /// Flow table of a tracked call
    pub fn flow_table(&self, call_id: &CallId) -> Result<FlowTable> {
        self.store
            .flow_table(call_id)
            .ok_or_else(|| NegotiationError::call_not_found(call_id.as_str()))
    }

    pub fn role(&self, call_id: &CallId) -> Option<CallRole> {
        self.store.role(call_id)
    }

    /// Snapshot of a tracked call
    pub fn record(&self, call_id: &CallId) -> Option<CallRecord> {
        self.store.record(call_id)
    }

    /// Forget a call and release its ports; unknown calls are ignored
    ///
    /// Only the ports this negotiator allocated are released, so the other
    /// side of the same call id may share the allocator.
    pub fn terminate(&self, call_id: &CallId) {
        match self.store.remove(call_id) {
            Some(record) => {
                let released = self.ports.release_ports(call_id, &record.local_ports);
                info!("Terminated call {} ({} ports released)", call_id, released);
            }
            None => debug!("Terminate for unknown call {}", call_id),
        }
    }

    fn release_replaced(&self, call_id: &CallId, replaced: Option<CallRecord>) {
        if let Some(old) = replaced {
            self.ports.release_ports(call_id, &old.local_ports);
        }
    }

    /// Hand the negotiated flows of a call to the transport
    pub async fn perform_session_setup(&self, call_id: &CallId) -> Result<()> {
        let record = self
            .store
            .record(call_id)
            .ok_or_else(|| NegotiationError::call_not_found(call_id.as_str()))?;
        self.transport
            .setup_flows(call_id, record.role, &record.flows)
            .await
    }

    /// Tear down the flows of a call, then forget it
    ///
    /// The call is forgotten even if the transport reports an error.
    pub async fn perform_session_termination(&self, call_id: &CallId) -> Result<()> {
        let Some(record) = self.store.record(call_id) else {
            debug!("Session termination for unknown call {}", call_id);
            return Ok(());
        };
        let result = self.transport.teardown_flows(call_id, &record.flows).await;
        self.terminate(call_id);
        result
    }
}

/// Ports of the media blocks of a locally built description
fn media_ports(sdp: &SessionDescription) -> Vec<u16> {
    sdp.media_descriptions()
        .map(|blocks| blocks.iter().map(|b| b.port).collect())
        .unwrap_or_default()
}

/// Builder for [`MediaNegotiator`]
#[derive(Default)]
pub struct MediaNegotiatorBuilder {
    config: NegotiatorConfig,
    catalog: Option<CodecCatalog>,
    ports: Option<Arc<PortAllocator>>,
    transport: Option<Arc<dyn MediaTransport>>,
}

impl MediaNegotiatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: NegotiatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this catalog instead of the configured codecs
    pub fn with_catalog(mut self, catalog: CodecCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use this allocator instead of one derived from the configuration
    pub fn with_port_allocator(mut self, ports: Arc<PortAllocator>) -> Self {
        self.ports = Some(ports);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn MediaTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the configuration and assemble the negotiator
    pub fn build(self) -> Result<MediaNegotiator> {
        self.config.validate()?;

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => self.config.catalog()?,
        };
        let ports = self.ports.unwrap_or_else(|| self.config.port_allocator());
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(LoggingTransport) as Arc<dyn MediaTransport>);

        let offers = OfferBuilder::new(catalog.clone(), ports.clone())
            .with_username(self.config.username.as_str())
            .with_session_name(self.config.session_name.as_str());
        let answers = AnswerBuilder::new(catalog.clone(), ports.clone())
            .with_username(self.config.username.as_str());

        info!(
            "Media negotiator ready with {} enabled codecs, ports {}..{}",
            catalog.enabled_count(),
            ports.config().min_port,
            ports.config().max_port
        );
        Ok(MediaNegotiator {
            catalog,
            offers,
            answers,
            ports,
            store: CallRecordStore::new(),
            transport,
        })
    }
}
