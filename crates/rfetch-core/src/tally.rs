//! Shared, per-instance fault tally. Not a global: each [`ErrorTally`] belongs
//! to exactly one running transfer, so multiple engine instances never share
//! abort state.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Fault;

#[derive(Debug, Default)]
struct Inner {
    count: u64,
    first: Option<Fault>,
}

/// Serialized fault counter. Cheap to clone; clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct ErrorTally {
    inner: Arc<Mutex<Inner>>,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault, incrementing the tally. The first fault recorded is
    /// retained as the transfer's terminal error.
    pub async fn record(&self, fault: Fault) {
        let mut inner = self.inner.lock().await;
        let was_healthy = inner.first.is_none();
        if was_healthy {
            inner.first = Some(fault.clone());
        }
        inner.count += 1;
        if was_healthy {
            tracing::warn!(%fault, "transfer aborting: first fault recorded");
        } else {
            tracing::debug!(%fault, count = inner.count, "additional fault recorded");
        }
    }

    /// True once at least one fault has been recorded.
    pub async fn is_aborted(&self) -> bool {
        self.inner.lock().await.count > 0
    }

    pub async fn count(&self) -> u64 {
        self.inner.lock().await.count
    }

    /// The first fault recorded, if any. This is what the engine reports as
    /// the transfer's terminal error.
    pub async fn first_fault(&self) -> Option<Fault> {
        self.inner.lock().await.first.clone()
    }
}
