//! # Transfer Progress Events
//!
//! This module provides a broadcast channel system for emitting progress
//! events while a playlist transfer runs, so front ends can show per-track
//! status without polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::Platform;

/// Events emitted by the matcher and transfer orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransferEvent {
    /// The source playlist was read.
    PlaylistFetched {
        timestamp: DateTime<Utc>,
        platform: Platform,
        playlist_name: String,
        track_count: usize,
    },
    /// A source track was resolved on the destination platform.
    TrackMatched {
        timestamp: DateTime<Utc>,
        /// Position of the track in the source playlist (0-based)
        index: usize,
        name: String,
        artist: String,
        /// Destination platform ID the track resolved to
        destination_id: Option<String>,
    },
    /// A source track could not be resolved.
    TrackUnmatched {
        timestamp: DateTime<Utc>,
        index: usize,
        name: String,
        artist: String,
        reason: String,
    },
    /// A search was rate limited and will be retried.
    RateLimited {
        timestamp: DateTime<Utc>,
        delay_seconds: u64,
    },
    /// The destination playlist was created.
    PlaylistCreated {
        timestamp: DateTime<Utc>,
        platform: Platform,
        playlist_id: String,
        url: Option<String>,
        track_count: usize,
    },
    /// The transfer finished, successfully or not.
    TransferFinished {
        timestamp: DateTime<Utc>,
        success: bool,
        matched: usize,
        failed: usize,
    },
}

/// A handle for receiving transfer events.
///
/// # Examples
///
/// ```rust,no_run
/// use beatbridge::events::{create_event_channel, TransferEvent};
/// use tokio::sync::broadcast::error::RecvError;
///
/// # tokio_test::block_on(async {
/// let (sender, mut receiver) = create_event_channel();
///
/// tokio::spawn(async move {
///     loop {
///         match receiver.recv().await {
///             Ok(TransferEvent::TrackUnmatched { name, reason, .. }) => {
///                 println!("Could not transfer {name}: {reason}");
///             }
///             Ok(_) => {}
///             Err(RecvError::Lagged(skipped)) => {
///                 println!("Event receiver lagged, {skipped} events skipped");
///             }
///             Err(RecvError::Closed) => break,
///         }
///     }
/// });
/// # drop(sender);
/// # });
/// ```
pub type TransferEventReceiver = broadcast::Receiver<TransferEvent>;

/// A handle for sending transfer events.
pub type TransferEventSender = broadcast::Sender<TransferEvent>;

/// Creates a new broadcast channel for transfer events.
///
/// The channel has a capacity of 100 events.
pub fn create_event_channel() -> (TransferEventSender, TransferEventReceiver) {
    broadcast::channel(100)
}

/// Helper trait for emitting transfer events through an optional sender.
pub trait TransferEventEmitter {
    fn emit_playlist_fetched(&self, platform: Platform, playlist_name: &str, track_count: usize);

    fn emit_track_matched(
        &self,
        index: usize,
        name: &str,
        artist: &str,
        destination_id: Option<&str>,
    );

    fn emit_track_unmatched(&self, index: usize, name: &str, artist: &str, reason: &str);

    fn emit_rate_limited(&self, delay_seconds: u64);

    fn emit_playlist_created(
        &self,
        platform: Platform,
        playlist_id: &str,
        url: Option<&str>,
        track_count: usize,
    );

    fn emit_transfer_finished(&self, success: bool, matched: usize, failed: usize);
}

impl TransferEventEmitter for Option<TransferEventSender> {
    fn emit_playlist_fetched(&self, platform: Platform, playlist_name: &str, track_count: usize) {
        if let Some(sender) = self {
            let _ = sender.send(TransferEvent::PlaylistFetched {
                timestamp: Utc::now(),
                platform,
                playlist_name: playlist_name.to_string(),
                track_count,
            }); // Ignore send errors (no receivers)
        }
    }

    fn emit_track_matched(
        &self,
        index: usize,
        name: &str,
        artist: &str,
        destination_id: Option<&str>,
    ) {
        if let Some(sender) = self {
            let _ = sender.send(TransferEvent::TrackMatched {
                timestamp: Utc::now(),
                index,
                name: name.to_string(),
                artist: artist.to_string(),
                destination_id: destination_id.map(str::to_string),
            });
        }
    }

    fn emit_track_unmatched(&self, index: usize, name: &str, artist: &str, reason: &str) {
        if let Some(sender) = self {
            let _ = sender.send(TransferEvent::TrackUnmatched {
                timestamp: Utc::now(),
                index,
                name: name.to_string(),
                artist: artist.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    fn emit_rate_limited(&self, delay_seconds: u64) {
        if let Some(sender) = self {
            let _ = sender.send(TransferEvent::RateLimited {
                timestamp: Utc::now(),
                delay_seconds,
            });
        }
    }

    fn emit_playlist_created(
        &self,
        platform: Platform,
        playlist_id: &str,
        url: Option<&str>,
        track_count: usize,
    ) {
        if let Some(sender) = self {
            let _ = sender.send(TransferEvent::PlaylistCreated {
                timestamp: Utc::now(),
                platform,
                playlist_id: playlist_id.to_string(),
                url: url.map(str::to_string),
                track_count,
            });
        }
    }

    fn emit_transfer_finished(&self, success: bool, matched: usize, failed: usize) {
        if let Some(sender) = self {
            let _ = sender.send(TransferEvent::TransferFinished {
                timestamp: Utc::now(),
                success,
                matched,
                failed,
            });
        }
    }
}
