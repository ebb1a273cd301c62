//! Cancellation context handed to registered tasks
//!
//! Built on a `watch` channel holding `false` until cancelled, the same
//! shape as the engine's shutdown signal.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation flag. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Drive `future` unless the token is cancelled first
    pub async fn run_until_cancelled<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }

    /// Guard that cancels the token when dropped
    pub fn drop_guard(self) -> DropGuard {
        DropGuard { token: self }
    }
}

/// Cancels its token on drop, including during unwinding
#[derive(Debug)]
pub struct DropGuard {
    token: CancelToken,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
