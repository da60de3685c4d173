use crate::{BridgeError, Result};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cooperative cancellation for a running transfer.
///
/// - `cancel()` flips a boolean and wakes sleepers.
/// - `reset()` clears the flag so the next transfer can run.
/// - Pacing sleeps select on either the timer or cancellation.
#[derive(Clone, Debug)]
pub struct CancellationState {
    tx: watch::Sender<bool>,
}

impl Default for CancellationState {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    // send_replace updates the value even while nobody is subscribed.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Resolves once `cancel_rx` observes cancellation; pends forever if the
/// sender is dropped first.
pub async fn cancelled(mut cancel_rx: watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            // Sender dropped; treat as non-cancelable.
            std::future::pending::<()>().await;
        }
    }
}

/// Sleep for `duration`, returning [`BridgeError::Cancelled`] early if
/// cancellation is requested or `deadline` passes first.
pub async fn sleep_with_cancel(
    cancel_rx: watch::Receiver<bool>,
    duration: Duration,
    deadline: Option<Instant>,
) -> Result<()> {
    if *cancel_rx.borrow() {
        return Err(BridgeError::Cancelled);
    }

    let wake = Instant::now() + duration;
    if let Some(deadline) = deadline {
        if deadline <= wake {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return Err(BridgeError::Cancelled),
                _ = cancelled(cancel_rx) => return Err(BridgeError::Cancelled),
            }
        }
    }

    tokio::select! {
        _ = tokio::time::sleep_until(wake) => Ok(()),
        _ = cancelled(cancel_rx) => Err(BridgeError::Cancelled),
    }
}
