//! The supervisor: drives the planner, gates concurrency, spawns fetch
//! workers, and enqueues their handles onto the ordered queue.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};

use crate::baton;
use crate::credentials::CredentialCache;
use crate::error::Fault;
use crate::fetch;
use crate::job::TransferJob;
use crate::queue::{QueueItem, QueueSender};
use crate::tally::ErrorTally;

/// Runs the supervisor loop for `job`, feeding `queue` until every segment
/// has been spawned (or the tally goes non-zero, at which point it stops
/// starting new work and unwinds).
pub async fn run(
    job: &TransferJob,
    client: reqwest::Client,
    credentials: &CredentialCache,
    queue: QueueSender,
    tally: ErrorTally,
) {
    let gate = Arc::new(Semaphore::new(job.concurrency_cap.max(1)));

    for segment in job.plan() {
        if tally.is_aborted().await {
            break;
        }

        let snapshot = match credentials.current().await {
            Ok(s) => s,
            Err(e) => {
                tally
                    .record(Fault::Credential {
                        detail: e.to_string(),
                    })
                    .await;
                break;
            }
        };

        let permit = match gate.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => break, // semaphore closed: shutting down
        };

        let (result_tx, result_rx) = oneshot::channel();
        let (baton, _wait) = baton::new();

        let worker_client = client.clone();
        let worker_url = job.source.url.clone();
        let timeout = job.fetch_timeout;
        let worker_tally = tally.clone();
        tracing::debug!(segment = segment.index, "fetch spawned");
        let handle = tokio::spawn(async move {
            let result =
                fetch::fetch_segment(&worker_client, &worker_url, segment, &snapshot, timeout)
                    .await;
            // Record the fault the instant it's known, not only once the
            // sequencer happens to dequeue this segment: segments complete
            // out of order, so a failure here must abort the run before the
            // supervisor spawns any more doomed fetches.
            if let Err(fault) = &result {
                tracing::warn!(segment = segment.index, %fault, "fetch worker fault");
                worker_tally.record(fault.clone()).await;
            }
            let _ = result_tx.send(result);
            drop(permit); // release the concurrency-gate slot on termination
        });

        let item = QueueItem {
            segment,
            result_rx,
            baton,
            abort: handle.abort_handle(),
        };

        let enqueue_timeout = backpressure_timeout(job.fetch_timeout);
        match queue.send_timeout(item, enqueue_timeout).await {
            Ok(()) => {}
            Err(_) => {
                tally
                    .record(Fault::BackpressureTimeout {
                        segment: segment.index,
                    })
                    .await;
                break;
            }
        }
    }

    queue.close().await;
}

/// The supervisor's enqueue wait is bounded by the same per-fetch timeout
/// used elsewhere, per the design's backpressure-timeout policy.
fn backpressure_timeout(fetch_timeout: Duration) -> Duration {
    fetch_timeout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialSnapshot, StaticCredentialProvider};
    use crate::job::SourceLocator;
    use crate::queue::ordered_queue;

    fn test_job(url: String, total_size: u64, segment_size: u64) -> TransferJob {
        TransferJob {
            source: SourceLocator {
                bucket: "b".into(),
                key: "k".into(),
                url,
            },
            total_size,
            segment_size,
            concurrency_cap: 2,
            memory_cap: 2,
            fetch_timeout: Duration::from_secs(5),
            refresh_margin: Duration::from_secs(300),
            credentials: Arc::new(StaticCredentialProvider::new(
                CredentialSnapshot::pass_through(),
            )),
        }
    }

    #[tokio::test]
    async fn zero_size_object_enqueues_nothing_but_closes() {
        let job = test_job("https://example.invalid/x".into(), 0, 1024);
        let client = reqwest::Client::new();
        let cache = CredentialCache::new(
            Arc::new(StaticCredentialProvider::new(
                CredentialSnapshot::pass_through(),
            )),
            Duration::from_secs(300),
        );
        let (tx, mut rx) = ordered_queue(4);
        let tally = ErrorTally::new();

        run(&job, client, &cache, tx, tally.clone()).await;
        assert!(rx.recv().await.is_none());
        assert!(!tally.is_aborted().await);
    }
}
