/*!
 * Document admission gate.
 *
 * Bounds the number of documents the process translates simultaneously.
 * Waiters are served in arrival order; a permit lives as long as the job
 * and releases its slot on drop.
 */

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::JobError;

/// FIFO gate over simultaneously processed documents
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    cap: usize,
}

/// Held for the lifetime of one admitted job
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Gate admitting at most `cap` documents at once
    pub fn new(cap: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(cap.max(1))), cap: cap.max(1) }
    }

    /// Wait for a slot. Waiters are queued fairly, so admission order is
    /// arrival order.
    pub async fn admit(&self) -> Result<AdmissionPermit, JobError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| JobError::AdmissionClosed)?;
        Ok(AdmissionPermit { _permit: permit })
    }

    /// Stop admitting new jobs; queued waiters get `AdmissionClosed`
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Configured capacity
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
