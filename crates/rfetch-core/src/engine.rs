//! Public entry point: ties the supervisor and sequencer together around one
//! ordered queue and wires up an HTTP client and credential cache for the job.

use crate::credentials::CredentialCache;
use crate::error::Fault;
use crate::job::TransferJob;
use crate::queue::ordered_queue;
use crate::sequencer;
use crate::supervisor;
use crate::tally::ErrorTally;

/// Result of a completed (or aborted) transfer.
#[derive(Debug)]
pub struct TransferOutcome {
    /// Bytes actually written to the sink. On success this equals
    /// `job.total_size`; on abort it is the length of whatever ordered
    /// prefix completed before the fault.
    pub bytes_written: u64,
    /// The first fault recorded, if the transfer aborted.
    pub fault: Option<Fault>,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        self.fault.is_none()
    }
}

/// Runs one transfer: plans segments, fetches them with bounded concurrency
/// and bounded memory, and writes them to `sink` in order.
///
/// This is the whole engine's surface area. It does not retry: a failed run
/// returns a non-`None` `fault` and whatever prefix of the sink was written
/// before the failure; retrying the whole transfer is the caller's decision.
pub async fn run_transfer<W>(job: &TransferJob, sink: &mut W) -> TransferOutcome
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let client = reqwest::Client::new();
    let credentials = CredentialCache::new(job.credentials.clone(), job.refresh_margin);
    let (queue_tx, queue_rx) = ordered_queue(job.memory_cap);
    let tally = ErrorTally::new();

    let supervisor_tally = tally.clone();
    let supervisor_fut = supervisor::run(job, client, &credentials, queue_tx, supervisor_tally);
    let sequencer_fut = sequencer::run(queue_rx, sink, &tally, job.fetch_timeout);

    let (_, bytes_written) = tokio::join!(supervisor_fut, sequencer_fut);

    let fault = tally.first_fault().await;
    TransferOutcome {
        bytes_written,
        fault,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialSnapshot, StaticCredentialProvider};
    use crate::job::SourceLocator;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn empty_object_completes_immediately() {
        let job = TransferJob {
            source: SourceLocator {
                bucket: "b".into(),
                key: "k".into(),
                url: "https://example.invalid/b/k".into(),
            },
            total_size: 0,
            segment_size: 1024,
            concurrency_cap: 2,
            memory_cap: 2,
            fetch_timeout: Duration::from_secs(5),
            refresh_margin: Duration::from_secs(300),
            credentials: Arc::new(StaticCredentialProvider::new(
                CredentialSnapshot::pass_through(),
            )),
        };
        let mut sink = Vec::new();
        let outcome = run_transfer(&job, &mut sink).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.bytes_written, 0);
        assert!(sink.is_empty());
    }
}
