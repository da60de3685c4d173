pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod matching;
pub mod pacing;
pub mod parsing;
pub mod playlist_url;
pub mod provider;
pub mod retry;
pub mod similarity;
pub mod transfer;
pub mod types;

pub use cancel::CancellationState;
pub use catalog::MemoryCatalog;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use events::{create_event_channel, TransferEvent};
pub use matching::{
    deduplicate_tracks, find_best_match, MatchConfig, MatchReport, MatchedTrack, TrackMatcher,
    UnmatchedTrack,
};
pub use provider::{CatalogProvider, ProviderRegistry};
pub use retry::RetryConfig;
pub use similarity::similarity;
pub use transfer::{PlaylistTransfer, TransferOptions};
pub use types::{FailedTrack, MissReason, Platform, Playlist, Track, TransferResult};

// Re-export the mock for downstream tests
#[cfg(any(test, feature = "mock"))]
pub use provider::MockCatalogProvider;

pub type Result<T> = std::result::Result<T, BridgeError>;
