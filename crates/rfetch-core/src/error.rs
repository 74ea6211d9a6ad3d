//! The fault hierarchy used to classify why a transfer aborted.

use std::fmt;

/// One of the ways a transfer can fail. Every fault increments the error
/// tally; the first one observed determines the transfer's terminal outcome.
#[derive(Debug, Clone)]
pub enum Fault {
    /// The underlying HTTP call for a segment terminated abnormally, or
    /// returned a body shorter than the expected range length.
    Transport { segment: usize, detail: String },
    /// A fetch's inactivity watchdog fired before any progress was made.
    Stall { segment: usize },
    /// The supervisor could not hand a finished segment to the sequencer
    /// within the per-fetch timeout (the ordered queue stayed full).
    BackpressureTimeout { segment: usize },
    /// Writing a segment's bytes to the sink failed.
    Sink { segment: usize, detail: String },
    /// The credential provider could not produce a usable snapshot.
    Credential { detail: String },
    /// An invariant the engine depends on did not hold (e.g. a segment was
    /// about to be emitted out of order). Always a bug, never expected.
    InternalInvariant { detail: String },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Transport { segment, detail } => {
                write!(f, "segment {segment}: transport fault: {detail}")
            }
            Fault::Stall { segment } => write!(f, "segment {segment}: stalled"),
            Fault::BackpressureTimeout { segment } => {
                write!(f, "segment {segment}: timed out waiting for buffer space")
            }
            Fault::Sink { segment, detail } => {
                write!(f, "segment {segment}: sink write failed: {detail}")
            }
            Fault::Credential { detail } => write!(f, "credential refresh failed: {detail}"),
            Fault::InternalInvariant { detail } => {
                write!(f, "internal invariant violated: {detail}")
            }
        }
    }
}

impl std::error::Error for Fault {}
