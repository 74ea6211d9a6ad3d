//! The ordered buffer queue: the sole handoff between the supervisor and the
//! sequencer, and the mechanism that enforces memory backpressure.
//!
//! A queue of capacity `M_max` *is* the pool of resident segment buffers: a
//! full queue means `M_max` segments are already checked out, so the next
//! `send` blocks until the sequencer frees one by draining it. There is no
//! separate buffer allocator to keep in sync with the queue's capacity.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::baton::Baton;
use crate::error::Fault;
use crate::planner::Segment;

/// The result a fetch worker hands back to whoever is waiting on it.
pub type FetchResult = Result<Bytes, Fault>;

/// One segment's slot in the ordered queue: its planned range, a receiver
/// that resolves once the fetch finishes (successfully or not), the baton
/// marking its FETCHED -> EMITTED transition, and a handle the sequencer can
/// use to terminate the fetch early if the run is aborted while waiting.
pub struct QueueItem {
    pub segment: Segment,
    pub result_rx: oneshot::Receiver<FetchResult>,
    pub baton: Baton,
    pub abort: tokio::task::AbortHandle,
}

/// Sender half. Enqueuing blocks when the queue is at capacity; this is the
/// memory-backpressure mechanism.
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<Option<QueueItem>>,
}

pub struct QueueReceiver {
    rx: mpsc::Receiver<Option<QueueItem>>,
}

/// Creates an ordered queue with capacity `memory_cap` (in segments).
pub fn ordered_queue(memory_cap: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(memory_cap.max(1));
    (QueueSender { tx }, QueueReceiver { rx })
}

impl QueueSender {
    /// Enqueues a segment. Blocks (awaits) while the queue is full.
    pub async fn send(&self, item: QueueItem) -> Result<(), ()> {
        self.tx.send(Some(item)).await.map_err(|_| ())
    }

    /// Enqueues a segment, failing instead of waiting past `timeout`.
    pub async fn send_timeout(
        &self,
        item: QueueItem,
        timeout: std::time::Duration,
    ) -> Result<(), QueueSendTimeout> {
        match tokio::time::timeout(timeout, self.tx.send(Some(item))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(QueueSendTimeout::Closed),
            Err(_) => Err(QueueSendTimeout::TimedOut),
        }
    }

    /// Enqueues the end-of-stream sentinel.
    pub async fn close(&self) {
        let _ = self.tx.send(None).await;
    }
}

#[derive(Debug)]
pub enum QueueSendTimeout {
    Closed,
    TimedOut,
}

impl QueueReceiver {
    /// Dequeues the next item. `Ok(None)` means the sentinel was reached (or
    /// the sender was dropped without one, which the sequencer treats the
    /// same way: nothing more is coming).
    pub async fn recv(&mut self) -> Option<QueueItem> {
        match self.rx.recv().await {
            Some(Some(item)) => Some(item),
            Some(None) | None => None,
        }
    }
}
