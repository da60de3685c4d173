//! Spacing of outbound provider requests.
//!
//! Destination catalogs rate-limit per key, so the matcher never starts two
//! searches closer together than the configured request delay. The pacer
//! hands out start slots; it is shared by every in-flight resolution, which
//! keeps aggregate throughput identical whether tracks are resolved one at a
//! time or through a bounded pool.

use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::cancel::sleep_with_cancel;
use crate::Result;

/// Hands out request start times at least `interval` apart.
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Reserve the next start slot and return how long to wait for it.
    ///
    /// The first reservation is immediate.
    pub async fn reserve(&self) -> Duration {
        let now = Instant::now();
        let mut next_slot = self.next_slot.lock().await;
        let slot = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next_slot = Some(slot + self.interval);
        slot.saturating_duration_since(now)
    }

    /// Wait for a start slot, aborting on cancellation or past `deadline`.
    pub async fn wait_turn(
        &self,
        cancel_rx: watch::Receiver<bool>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let wait = self.reserve().await;
        if wait.is_zero() {
            if *cancel_rx.borrow() {
                return Err(crate::BridgeError::Cancelled);
            }
            return Ok(());
        }
        log::trace!("Pacing provider request by {wait:?}");
        sleep_with_cancel(cancel_rx, wait, deadline).await
    }
}
