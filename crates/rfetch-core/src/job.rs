//! The transfer job: an immutable description of one fetch-and-reassemble run.

use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialProvider;
use crate::planner::{self, Segment};

/// Source locator: an object identified by bucket and key in some remote
/// object store. The engine never interprets this beyond passing it to the
/// HTTP layer that builds request URLs; bucket/key resolution to a concrete
/// endpoint is the caller's concern.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    pub bucket: String,
    pub key: String,
    /// Fully-resolved URL to GET with a Range header. Kept separate from
    /// bucket/key so callers can plug in any object-store addressing scheme
    /// without the engine needing to know its conventions.
    pub url: String,
}

/// Immutable description of one transfer. Constructing a `TransferJob` does
/// not start any I/O.
pub struct TransferJob {
    pub source: SourceLocator,
    /// Total object size in bytes, as resolved by an external metadata
    /// lookup before the job is constructed.
    pub total_size: u64,
    pub segment_size: u64,
    pub concurrency_cap: usize,
    pub memory_cap: usize,
    pub fetch_timeout: Duration,
    pub refresh_margin: Duration,
    pub credentials: Arc<dyn CredentialProvider>,
}

impl TransferJob {
    /// Number of segments this job will be split into.
    pub fn segment_count(&self) -> usize {
        planner::segment_count(self.total_size, self.segment_size)
    }

    /// The ordered sequence of segments this job will fetch.
    pub fn plan(&self) -> Vec<Segment> {
        planner::plan_segments(self.total_size, self.segment_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentialProvider;
    use crate::credentials::CredentialSnapshot;

    fn job(total_size: u64, segment_size: u64) -> TransferJob {
        TransferJob {
            source: SourceLocator {
                bucket: "b".into(),
                key: "k".into(),
                url: "https://example.invalid/b/k".into(),
            },
            total_size,
            segment_size,
            concurrency_cap: 4,
            memory_cap: 4,
            fetch_timeout: Duration::from_secs(10),
            refresh_margin: Duration::from_secs(300),
            credentials: Arc::new(StaticCredentialProvider::new(
                CredentialSnapshot::pass_through(),
            )),
        }
    }

    #[test]
    fn empty_object_has_zero_segments() {
        let j = job(0, 1024);
        assert_eq!(j.segment_count(), 0);
        assert!(j.plan().is_empty());
    }

    #[test]
    fn segment_count_matches_plan_length() {
        let j = job(1_000_000, 262_144);
        assert_eq!(j.segment_count(), j.plan().len());
    }
}
