//! Ephemeral media port allocation
//!
//! Ports are drawn uniformly at random from a configured range and tracked
//! per call, so concurrently active calls never advertise the same port.
//!
//! Both ends of a call usually share one call id, and with it one entry in a
//! shared allocator. A side that only wants to give back its own ports must
//! use [`PortAllocator::release_ports`]; [`PortAllocator::release_call`]
//! frees every port recorded under the id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{NegotiationError, Result};
use crate::types::CallId;

/// Lowest ephemeral media port
pub const DEFAULT_MIN_PORT: u16 = 16384;
/// Upper bound of the ephemeral media port range (exclusive)
pub const DEFAULT_MAX_PORT: u16 = 32767;
/// Draws attempted before giving up on a crowded range
pub const DEFAULT_MAX_ATTEMPTS: usize = 64;

static GLOBAL_ALLOCATOR: Lazy<Arc<PortAllocator>> =
    Lazy::new(|| Arc::new(PortAllocator::new(PortAllocatorConfig::default())));

/// Port allocator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAllocatorConfig {
    pub min_port: u16,
    /// Exclusive
    pub max_port: u16,
    pub max_attempts: usize,
}

impl Default for PortAllocatorConfig {
    fn default() -> Self {
        Self {
            min_port: DEFAULT_MIN_PORT,
            max_port: DEFAULT_MAX_PORT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PortAllocatorConfig {
    /// Number of ports in the range
    pub fn capacity(&self) -> usize {
        usize::from(self.max_port.saturating_sub(self.min_port))
    }
}

#[derive(Debug, Default)]
struct Allocations {
    in_use: HashSet<u16>,
    by_call: HashMap<CallId, Vec<u16>>,
}

/// Random port allocator with per-call ownership
#[derive(Debug)]
pub struct PortAllocator {
    config: PortAllocatorConfig,
    allocations: Mutex<Allocations>,
}

impl PortAllocator {
    pub fn new(config: PortAllocatorConfig) -> Self {
        Self {
            config,
            allocations: Mutex::new(Allocations::default()),
        }
    }

    /// The process-wide allocator, over the default range
    pub fn global() -> Arc<PortAllocator> {
        GLOBAL_ALLOCATOR.clone()
    }

    pub fn config(&self) -> &PortAllocatorConfig {
        &self.config
    }

    /// Allocate a free port on behalf of a call
    pub fn allocate(&self, call_id: &CallId) -> Result<u16> {
        let exhausted = || NegotiationError::PortsExhausted {
            min: self.config.min_port,
            max: self.config.max_port,
            attempts: self.config.max_attempts,
        };
        if self.config.capacity() == 0 {
            return Err(exhausted());
        }

        let mut allocations = self.allocations.lock();
        if allocations.in_use.len() >= self.config.capacity() {
            warn!("Port range {}..{} is full", self.config.min_port, self.config.max_port);
            return Err(exhausted());
        }

        let mut rng = rand::thread_rng();
        for _ in 0..self.config.max_attempts.max(1) {
            let port = rng.gen_range(self.config.min_port..self.config.max_port);
            if allocations.in_use.insert(port) {
                allocations.by_call.entry(call_id.clone()).or_default().push(port);
                debug!("Allocated port {} for call {}", port, call_id);
                return Ok(port);
            }
        }

        warn!(
            "No free port for call {} after {} attempts",
            call_id, self.config.max_attempts
        );
        Err(exhausted())
    }

    /// Return every port recorded under a call id; returns how many were freed
    pub fn release_call(&self, call_id: &CallId) -> usize {
        let mut allocations = self.allocations.lock();
        let Some(ports) = allocations.by_call.remove(call_id) else {
            return 0;
        };
        for port in &ports {
            allocations.in_use.remove(port);
        }
        debug!("Released {} ports for call {}", ports.len(), call_id);
        ports.len()
    }

    /// Return specific ports held by a call; returns how many were freed
    ///
    /// Ports not recorded under `call_id` are left alone.
    pub fn release_ports(&self, call_id: &CallId, ports: &[u16]) -> usize {
        let mut allocations = self.allocations.lock();
        let Some(held) = allocations.by_call.get_mut(call_id) else {
            return 0;
        };
        let mut freed = Vec::new();
        held.retain(|p| {
            let release = ports.contains(p);
            if release {
                freed.push(*p);
            }
            !release
        });
        if held.is_empty() {
            allocations.by_call.remove(call_id);
        }
        for port in &freed {
            allocations.in_use.remove(port);
        }
        debug!("Released {} of {} ports for call {}", freed.len(), ports.len(), call_id);
        freed.len()
    }

    /// Ports currently held by a call, in allocation order
    pub fn ports_of(&self, call_id: &CallId) -> Vec<u16> {
        self.allocations
            .lock()
            .by_call
            .get(call_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_allocated(&self, port: u16) -> bool {
        self.allocations.lock().in_use.contains(&port)
    }

    pub fn allocated_count(&self) -> usize {
        self.allocations.lock().in_use.len()
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(PortAllocatorConfig::default())
    }
}
