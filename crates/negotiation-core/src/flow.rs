//! Per-call flow table
//!
//! One entry per negotiated codec, holding the data and control endpoints
//! on both sides. Iteration follows the order in which codecs were first
//! negotiated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::Codec;
use crate::types::Endpoint;

/// Endpoints for one negotiated codec, already attributed to local/remote
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowEntry {
    pub local_data: Endpoint,
    pub local_control: Endpoint,
    pub remote_data: Endpoint,
    pub remote_control: Endpoint,
}

impl fmt::Display for FlowEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data {} -> {}, control {} -> {}",
            self.local_data, self.remote_data, self.local_control, self.remote_control
        )
    }
}

/// Negotiated codecs of a call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowTable {
    entries: IndexMap<Codec, FlowEntry>,
}

impl FlowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a codec, returning the replaced one
    pub fn insert(&mut self, codec: Codec, entry: FlowEntry) -> Option<FlowEntry> {
        self.entries.insert(codec, entry)
    }

    pub fn get(&self, codec: &Codec) -> Option<&FlowEntry> {
        self.entries.get(codec)
    }

    /// Entry for the codec with the given rtpmap signature
    pub fn get_by_signature(&self, signature: &str) -> Option<(&Codec, &FlowEntry)> {
        self.entries.iter().find(|(codec, _)| codec.matches_signature(signature))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Codec, &FlowEntry)> {
        self.entries.iter()
    }

    pub fn codecs(&self) -> impl Iterator<Item = &Codec> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty table means no media to set up
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FlowTable {
    type Item = (&'a Codec, &'a FlowEntry);
    type IntoIter = indexmap::map::Iter<'a, Codec, FlowEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
