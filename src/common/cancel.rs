//! Cancellation signalling for harness runs
//!
//! A `CancelToken` lets a harness invocation be aborted between runners and
//! makes retry loops exit promptly instead of completing their full attempt
//! budget. Dwell waits are deliberately not interruptible so the agent is
//! never left in a started-but-unvalidated state.

use std::sync::Arc;

use tokio::sync::watch;

/// Sending half: signals cancellation to every token clone
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half: checked by the suite loop and retry helper
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    /// Keeps the channel open for tokens created without a handle
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelToken {
    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancellation is requested
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Already-cancelled tokens must resolve immediately
        if *rx.borrow_and_update() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        // Sender dropped without cancelling: never resolves
        std::future::pending::<()>().await;
    }

    /// A token that can never be cancelled, for callers without a handle
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }
}

/// Create a linked cancellation handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx },
        CancelToken {
            rx,
            _keepalive: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_reports_cancellation() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
        token.cancelled().await; // must resolve immediately
    }

    #[tokio::test]
    async fn clones_share_the_signal() {
        let (handle, token) = cancel_pair();
        let clone = token.clone();
        handle.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn never_token_stays_pending_across_clones_and_drops() {
        let token = CancelToken::never();
        let clone = token.clone();
        drop(token);

        assert!(!clone.is_cancelled());
        // The channel must stay open: cancelled() neither resolves nor
        // falls through on a closed sender.
        tokio::select! {
            _ = clone.cancelled() => panic!("never token resolved"),
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
        }
    }
}
