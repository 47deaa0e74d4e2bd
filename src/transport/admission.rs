//! Admission control
//!
//! A counting permit pool bounding the number of simultaneously active
//! connections. The accept loop awaits a permit before accepting, so once the
//! pool is exhausted the server simply stops accepting until a handler
//! finishes and its permit is dropped.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::utils::BrokerError;

#[derive(Debug, Clone)]
pub struct Admission {
    /// `None` when the pool is unbounded.
    permits: Option<Arc<Semaphore>>,
}

/// One admitted connection. Dropping it returns the permit to the pool.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl Admission {
    /// Creates a pool of `max_connections` permits; `0` means unbounded.
    pub fn new(max_connections: usize) -> Self {
        let permits = (max_connections > 0)
            .then(|| Arc::new(Semaphore::new(max_connections.min(Semaphore::MAX_PERMITS))));
        Self { permits }
    }

    /// Waits until a permit is free.
    pub async fn acquire(&self) -> Result<AdmissionPermit, BrokerError> {
        let permit = match &self.permits {
            Some(permits) => Some(
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .map_err(|_| BrokerError::AdmissionClosed)?,
            ),
            None => None,
        };
        Ok(AdmissionPermit { _permit: permit })
    }
}
