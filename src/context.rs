//! Shared broker state
//!
//! `BrokerContext` owns everything that outlives a single connection: the
//! topic registry, the statistics counters and the admission controller. It is
//! built once at startup and handed to the accept loop and every connection
//! handler as an `Arc<BrokerContext>`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::broker::Broker;
use crate::stats::SharedStats;
use crate::transport::admission::Admission;

#[derive(Debug)]
pub struct BrokerContext {
    registry: Mutex<Broker>,
    stats: Arc<SharedStats>,
    admission: Admission,
}

impl BrokerContext {
    /// Creates the shared state for a server admitting at most
    /// `max_connections` concurrent clients (`0` means unbounded).
    pub fn new(max_connections: usize) -> Self {
        Self {
            registry: Mutex::new(Broker::new()),
            stats: Arc::new(SharedStats::new()),
            admission: Admission::new(max_connections),
        }
    }

    /// Locks the topic registry.
    ///
    /// A handler that panicked while holding the lock leaves the registry in
    /// a consistent state, since every mutation completes before returning,
    /// so a poisoned lock is recovered rather than propagated.
    pub fn registry(&self) -> MutexGuard<'_, Broker> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> &Arc<SharedStats> {
        &self.stats
    }

    pub fn admission(&self) -> &Admission {
        &self.admission
    }
}
