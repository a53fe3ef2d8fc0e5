//! Call record store
//!
//! Keyed by call id. Each key is locked independently, so operations on
//! different calls never wait on each other. Operations on the same call are
//! expected to arrive in order from the host.

use std::sync::Arc;

use callmedia_sdp_core::SessionDescription;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{NegotiationError, Result};
use crate::flow::FlowTable;
use crate::types::{CallId, CallRole};

/// Negotiation state of one call
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub role: CallRole,
    pub offer: SessionDescription,
    /// Present once the answer is known
    pub answer: Option<SessionDescription>,
    /// Empty until negotiation completes, and after a failed negotiation
    pub flows: FlowTable,
    /// Ports this side allocated for its own description
    pub local_ports: Vec<u16>,
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    fn new(role: CallRole, offer: SessionDescription, local_ports: Vec<u16>) -> Self {
        Self {
            role,
            offer,
            answer: None,
            flows: FlowTable::new(),
            local_ports,
            created_at: Utc::now(),
        }
    }

    /// Whether both descriptions are known
    pub fn is_negotiated(&self) -> bool {
        self.answer.is_some()
    }
}

/// Concurrent store of call records
#[derive(Debug, Clone, Default)]
pub struct CallRecordStore {
    records: Arc<DashMap<CallId, CallRecord>>,
}

impl CallRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a call from its offer
    ///
    /// An existing record for the same call is replaced and returned.
    pub fn create_for_offer(
        &self,
        call_id: CallId,
        role: CallRole,
        offer: SessionDescription,
        local_ports: Vec<u16>,
    ) -> Option<CallRecord> {
        debug!("Recording offer for call {} as {}", call_id, role);
        self.insert(call_id, CallRecord::new(role, offer, local_ports))
    }

    /// Track a call whose offer and answer are both known
    pub fn create_negotiated(
        &self,
        call_id: CallId,
        role: CallRole,
        offer: SessionDescription,
        answer: SessionDescription,
        flows: FlowTable,
        local_ports: Vec<u16>,
    ) -> Option<CallRecord> {
        debug!("Recording negotiated call {} as {} ({} flows)", call_id, role, flows.len());
        let record = CallRecord {
            answer: Some(answer),
            flows,
            ..CallRecord::new(role, offer, local_ports)
        };
        self.insert(call_id, record)
    }

    fn insert(&self, call_id: CallId, record: CallRecord) -> Option<CallRecord> {
        let replaced = self.records.insert(call_id.clone(), record);
        if replaced.is_some() {
            warn!("Replaced existing record for call {}", call_id);
        }
        replaced
    }

    /// Attach the answer to a tracked call, returning the updated record
    pub fn attach_answer(&self, call_id: &CallId, answer: SessionDescription) -> Result<CallRecord> {
        let mut record = self
            .records
            .get_mut(call_id)
            .ok_or_else(|| NegotiationError::call_not_found(call_id.as_str()))?;
        if record.answer.is_some() {
            debug!("Replacing answer of call {}", call_id);
        }
        record.answer = Some(answer);
        Ok(record.clone())
    }

    /// Replace the flow table of a tracked call
    pub fn set_flows(&self, call_id: &CallId, flows: FlowTable) -> Result<()> {
        let mut record = self
            .records
            .get_mut(call_id)
            .ok_or_else(|| NegotiationError::call_not_found(call_id.as_str()))?;
        record.flows = flows;
        Ok(())
    }

    pub fn flow_table(&self, call_id: &CallId) -> Option<FlowTable> {
        self.records.get(call_id).map(|r| r.flows.clone())
    }

    pub fn role(&self, call_id: &CallId) -> Option<CallRole> {
        self.records.get(call_id).map(|r| r.role)
    }

    /// Snapshot of a record
    pub fn record(&self, call_id: &CallId) -> Option<CallRecord> {
        self.records.get(call_id).map(|r| r.clone())
    }

    pub fn contains(&self, call_id: &CallId) -> bool {
        self.records.contains_key(call_id)
    }

    /// Forget a call; removing an unknown call is a no-op
    pub fn remove(&self, call_id: &CallId) -> Option<CallRecord> {
        let removed = self.records.remove(call_id).map(|(_, record)| record);
        if removed.is_some() {
            debug!("Removed record for call {}", call_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn call_ids(&self) -> Vec<CallId> {
        self.records.iter().map(|r| r.key().clone()).collect()
    }
}
