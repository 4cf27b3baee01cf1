//! Background mining worker and cancellation
//!
//! The proof-of-work search is long-running, CPU-bound and blocking, so it
//! runs on a dedicated worker thread. A [`CancelToken`] lets a caller abort
//! an in-progress search (for example on shutdown); cancellation either
//! completes to a fully sealed block or leaves the pending pool unchanged,
//! never a partial mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver};
use tracing::warn;

use crate::crypto::Address;
use crate::error::MineError;
use crate::shared::SharedLedger;

/// A cloneable cancellation flag shared between a caller and a search loop.
/// Starts untripped; tripping is one-way.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the search holding this token to stop at its next iteration.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Handle to a one-shot mining worker spawned with [`spawn`].
pub struct MinerHandle {
    cancel: CancelToken,
    result: Receiver<Result<u64, MineError>>,
    thread: JoinHandle<()>,
}

impl MinerHandle {
    /// Abort the in-progress search. The worker restores the pending pool
    /// and reports [`MineError::Cancelled`] through [`join`](Self::join).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this worker's search; useful for wiring into
    /// shutdown paths.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the round to finish and return the mined block's index.
    pub fn join(self) -> Result<u64, MineError> {
        let outcome = match self.result.recv() {
            Ok(outcome) => outcome,
            // The worker always sends before exiting; a closed channel
            // means it died without completing a round.
            Err(_) => {
                warn!("mining worker exited without reporting a result");
                Err(MineError::Cancelled)
            }
        };
        let _ = self.thread.join();
        outcome
    }
}

/// Run one mining round on a dedicated worker thread: seal the shared
/// ledger's pending pool into a block credited to `miner_address`. The
/// returned handle cancels or joins the round.
pub fn spawn(ledger: SharedLedger, miner_address: impl Into<Address>) -> MinerHandle {
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let address = miner_address.into();
    let (sender, result) = bounded(1);

    let thread = std::thread::spawn(move || {
        let outcome = ledger.mine_pending_with(&address, &worker_cancel);
        let _ = sender.send(outcome);
    });

    MinerHandle {
        cancel,
        result,
        thread,
    }
}
