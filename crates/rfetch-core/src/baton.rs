//! The baton: a single-use "your turn" signal handed from the supervisor to
//! whichever task is allowed to read a segment's buffer.
//!
//! In this engine the sequencer is the sole reader of every segment buffer,
//! so releasing a baton is not required for correctness (see DESIGN.md). It
//! is kept as a real type, released on the FETCHED -> EMITTED transition, so
//! the state machine and its traces stay faithful to a design where segment
//! consumers are independent tasks that must not start reading early.

use tokio::sync::oneshot;

/// Held by the producer side; consumed exactly once to signal a segment's
/// turn has come.
pub struct Baton {
    tx: oneshot::Sender<()>,
}

/// Held by a segment's consumer; resolves once its baton is released.
pub struct BatonWait {
    rx: oneshot::Receiver<()>,
}

/// Creates a baton/wait pair for one segment.
pub fn new() -> (Baton, BatonWait) {
    let (tx, rx) = oneshot::channel();
    (Baton { tx }, BatonWait { rx })
}

impl Baton {
    /// Releases the baton: the segment's turn has come.
    pub fn release(self) {
        // The receiver may already have been dropped if nothing is waiting
        // on this baton (the common case, since the sequencer writes the
        // buffer itself); that is not an error.
        let _ = self.tx.send(());
    }
}

impl BatonWait {
    /// Waits for the baton to be released. Resolves immediately, with
    /// `Err`, if the baton was dropped without being released (e.g. the
    /// segment failed before reaching EMITTED).
    pub async fn wait(self) -> Result<(), oneshot::error::RecvError> {
        self.rx.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn release_resolves_wait() {
        let (baton, wait) = new();
        baton.release();
        assert!(wait.wait().await.is_ok());
    }

    #[tokio::test]
    async fn dropping_without_release_errors_the_wait() {
        let (baton, wait) = new();
        drop(baton);
        assert!(wait.wait().await.is_err());
    }
}
