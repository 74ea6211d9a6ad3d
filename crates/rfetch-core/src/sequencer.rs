//! The sequencer: the single consumer of the ordered queue, responsible for
//! writing segments to the sink in strict planner order.

use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::error::Fault;
use crate::queue::QueueReceiver;
use crate::tally::ErrorTally;

/// Drains `queue` in order, writing each segment's bytes to `sink`.
///
/// Returns the total number of bytes written. Stops (without error) at the
/// end-of-stream sentinel. Stops early, having written only the prefix that
/// completed before the tally turned non-zero, if a fault is observed. On
/// any stop due to a fault, every segment still sitting in the queue (and
/// its already-spawned fetch worker) is drained and aborted too, rather than
/// left to run to completion or its own watchdog after the run has already
/// been decided to abort.
pub async fn run<W>(
    mut queue: QueueReceiver,
    sink: &mut W,
    tally: &ErrorTally,
    fetch_wait_timeout: Duration,
) -> u64
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut written = 0u64;

    while let Some(item) = queue.recv().await {
        let segment = item.segment.index;

        if tally.is_aborted().await {
            tracing::debug!(segment, "run already aborted, aborting in-flight fetch");
            item.abort.abort();
            drain_remaining(&mut queue).await;
            break;
        }

        // Segment n is FETCHED (or about to fail); its turn has come.
        tracing::debug!(segment, "segment's turn to emit, releasing baton");
        item.baton.release();

        match tokio::time::timeout(fetch_wait_timeout, item.result_rx).await {
            Ok(Ok(Ok(bytes))) => {
                if let Err(e) = sink.write_all(&bytes).await {
                    let fault = Fault::Sink {
                        segment,
                        detail: e.to_string(),
                    };
                    tracing::warn!(segment, %fault, "sink write failed");
                    tally.record(fault).await;
                    drain_remaining(&mut queue).await;
                    break;
                }
                written += bytes.len() as u64;
                tracing::debug!(segment, bytes = bytes.len(), "segment emitted");
                // Buffer `bytes` goes out of scope here: RECLAIMED.
            }
            Ok(Ok(Err(fault))) => {
                // The fetch worker already recorded this fault into the
                // tally the instant it happened; don't double-count it here.
                tracing::warn!(segment, %fault, "segment failed");
                drain_remaining(&mut queue).await;
                break;
            }
            Ok(Err(_)) => {
                // The fetch task ended without sending a result (panicked or
                // was aborted elsewhere); treat as a transport fault.
                let fault = Fault::Transport {
                    segment,
                    detail: "fetch task ended without a result".into(),
                };
                tracing::warn!(segment, %fault, "fetch task ended unexpectedly");
                tally.record(fault).await;
                drain_remaining(&mut queue).await;
                break;
            }
            Err(_) => {
                item.abort.abort();
                let fault = Fault::BackpressureTimeout { segment };
                tracing::warn!(segment, %fault, "timed out waiting for fetch");
                tally.record(fault).await;
                drain_remaining(&mut queue).await;
                break;
            }
        }
    }

    tracing::info!(bytes_written = written, "sequencer finished");
    written
}

/// Drains every item still buffered in the ordered queue, aborting each
/// one's fetch worker instead of letting it run to completion (or its own
/// watchdog) after the run has already been decided to abort. Continues
/// until the queue is closed, which also catches any segment the supervisor
/// was still in the middle of enqueuing when the abort was observed.
async fn drain_remaining(queue: &mut QueueReceiver) {
    while let Some(item) = queue.recv().await {
        tracing::debug!(segment = item.segment.index, "draining and aborting queued fetch");
        item.abort.abort();
    }
}
