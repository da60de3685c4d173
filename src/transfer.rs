//! End-to-end playlist transfer.
//!
//! [`PlaylistTransfer`] reads a playlist from a source provider, resolves its
//! tracks on the destination provider, creates the destination playlist and
//! folds every outcome into a [`TransferResult`]. It is the only place where
//! internal track values become the user-facing failure report.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::cancel::CancellationState;
use crate::events::{TransferEventEmitter, TransferEventSender};
use crate::matching::{
    deduplicate_tracks, MatchConfig, MatchReport, TrackMatcher, UnmatchedTrack,
};
use crate::{
    CatalogProvider, FailedTrack, MissReason, Platform, Playlist, ProviderRegistry,
    TransferResult,
};

/// Per-transfer options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferOptions {
    /// Destination playlist name; defaults to the source playlist's name
    pub playlist_name: Option<String>,
    /// Destination playlist description; defaults to a note naming the source
    pub description: Option<String>,
    /// Drop repeated name/artist pairs before matching
    pub deduplicate: bool,
    /// Give up starting new searches after this many milliseconds
    pub timeout_ms: Option<u64>,
}

impl TransferOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_playlist_name(mut self, name: impl Into<String>) -> Self {
        self.playlist_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_deduplication(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Sub-millisecond remainders round up so a non-zero timeout never
    /// becomes zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_millis() + u128::from(timeout.subsec_nanos() % 1_000_000 != 0);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }
}

/// Runs playlist transfers.
///
/// # Examples
///
/// ```rust
/// use beatbridge::{MatchConfig, MemoryCatalog, Platform, Playlist, PlaylistTransfer, Track, TransferOptions};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let mut spotify = MemoryCatalog::new(Platform::Spotify);
/// let mut playlist = Playlist::new("37i9dQZF1DX4sWSpwq3LiO", "Morning", Platform::Spotify);
/// playlist.add_track(Track::new("Sunflower", "Post Malone").with_platform_id(Platform::Spotify, "s1"));
/// spotify.add_playlist(playlist);
///
/// let mut apple = MemoryCatalog::new(Platform::AppleMusic);
/// apple.add_track(Track::new("Sunflower", "Post Malone").with_platform_id(Platform::AppleMusic, "a1"));
///
/// let transfer = PlaylistTransfer::new(MatchConfig::default().with_request_delay(Duration::ZERO));
/// let result = transfer
///     .run(&spotify, "37i9dQZF1DX4sWSpwq3LiO", &apple, &TransferOptions::default())
///     .await;
///
/// assert!(result.success);
/// assert_eq!(
///     result.message,
///     "Successfully created Apple Music playlist with 1 tracks. 0 tracks could not be found."
/// );
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlaylistTransfer {
    matcher: TrackMatcher,
    events: Option<TransferEventSender>,
}

impl PlaylistTransfer {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            matcher: TrackMatcher::new(config),
            events: None,
        }
    }

    /// Share a cancellation handle with the caller.
    pub fn with_cancellation(mut self, cancellation: CancellationState) -> Self {
        self.matcher = self.matcher.with_cancellation(cancellation);
        self
    }

    /// Emit progress events on `sender`.
    pub fn with_events(mut self, sender: TransferEventSender) -> Self {
        self.matcher = self.matcher.with_events(sender.clone());
        self.events = Some(sender);
        self
    }

    pub fn matcher(&self) -> &TrackMatcher {
        &self.matcher
    }

    /// Transfer the playlist `playlist_id` from `source` to `destination`.
    ///
    /// Never fails: every error ends up in the returned result.
    pub async fn run(
        &self,
        source: &dyn CatalogProvider,
        playlist_id: &str,
        destination: &dyn CatalogProvider,
        options: &TransferOptions,
    ) -> TransferResult {
        let deadline = options
            .timeout()
            .and_then(|timeout| Instant::now().checked_add(timeout));

        log::info!(
            "Fetching playlist {playlist_id} from {}",
            source.platform().display_name()
        );
        let playlist = match source.fetch_playlist(playlist_id).await {
            Ok(playlist) => playlist,
            Err(e) => {
                log::error!("Failed to fetch source playlist {playlist_id}: {e}");
                return self.finish(TransferResult::failure(format!(
                    "Failed to fetch source playlist: {e}"
                )));
            }
        };

        self.events
            .emit_playlist_fetched(playlist.platform, &playlist.name, playlist.track_count());

        self.transfer_playlist(playlist, destination, options, deadline)
            .await
    }

    /// Look both providers up by platform tag, then [`run`](Self::run).
    pub async fn run_with_registry(
        &self,
        registry: &ProviderRegistry,
        source_platform: Platform,
        playlist_id: &str,
        destination_platform: Platform,
        options: &TransferOptions,
    ) -> TransferResult {
        let providers = registry
            .get(source_platform)
            .and_then(|source| Ok((source, registry.get(destination_platform)?)));

        match providers {
            Ok((source, destination)) => {
                self.run(source.as_ref(), playlist_id, destination.as_ref(), options)
                    .await
            }
            Err(e) => self.finish(TransferResult::failure(e.to_string())),
        }
    }

    /// Transfer an already hydrated playlist to `destination`.
    pub async fn transfer_playlist(
        &self,
        playlist: Playlist,
        destination: &dyn CatalogProvider,
        options: &TransferOptions,
        deadline: Option<Instant>,
    ) -> TransferResult {
        let platform = destination.platform();
        let name = options
            .playlist_name
            .clone()
            .unwrap_or_else(|| playlist.name.clone());
        let description = options.description.clone().unwrap_or_else(|| {
            format!("Transferred from {}", playlist.platform.display_name())
        });

        let tracks = if options.deduplicate {
            let before = playlist.tracks.len();
            let unique = deduplicate_tracks(playlist.tracks);
            if unique.len() < before {
                log::info!("Removed {} duplicate tracks", before - unique.len());
            }
            unique
        } else {
            playlist.tracks
        };
        let total_tracks = tracks.len();

        let report = match self
            .matcher
            .match_tracks_until(tracks, destination, deadline)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                log::error!("Matching against {} aborted: {e}", platform.display_name());
                let mut result = TransferResult::failure(format!(
                    "Could not match tracks on {}: {e}",
                    platform.display_name()
                ));
                result.total_tracks = total_tracks;
                return self.finish(result);
            }
        };

        if report.matched.is_empty() {
            let mut result = TransferResult::failure(format!(
                "No tracks could be matched on {}",
                platform.display_name()
            ));
            result.total_tracks = total_tracks;
            result.failed_tracks = failed_tracks(report.unmatched, report.skipped, Vec::new());
            return self.finish(result);
        }

        let matched_tracks: Vec<_> = report.matched.iter().map(|m| m.track.clone()).collect();
        log::info!(
            "Creating {} playlist '{name}' with {} tracks",
            platform.display_name(),
            matched_tracks.len()
        );

        match destination
            .create_playlist(&name, &description, &matched_tracks)
            .await
        {
            Ok(created) => {
                self.events.emit_playlist_created(
                    platform,
                    &created.id,
                    created.url.as_deref(),
                    created.track_count(),
                );
                self.finish(created_result(created, report, total_tracks))
            }
            Err(e) => {
                log::error!("Failed to create {} playlist: {e}", platform.display_name());
                let reason = MissReason::NotCreated(e.to_string());
                let not_created = report
                    .matched
                    .into_iter()
                    .map(|m| UnmatchedTrack {
                        source_index: m.source_index,
                        track: m.track,
                        reason: reason.clone(),
                    })
                    .collect();

                let mut result = TransferResult::failure(format!(
                    "Failed to create {} playlist: {e}",
                    platform.display_name()
                ));
                result.total_tracks = total_tracks;
                result.failed_tracks = failed_tracks(report.unmatched, report.skipped, not_created);
                self.finish(result)
            }
        }
    }

    fn finish(&self, result: TransferResult) -> TransferResult {
        self.events.emit_transfer_finished(
            result.success,
            result.matched_tracks,
            result.failed_tracks.len(),
        );
        result
    }
}

fn created_result(created: Playlist, report: MatchReport, total_tracks: usize) -> TransferResult {
    let matched = report.matched.len();
    let skipped = report.skipped.len();
    let failed = failed_tracks(report.unmatched, report.skipped, Vec::new());

    let mut message = format!(
        "Successfully created {} playlist with {matched} tracks. {} tracks could not be found.",
        created.platform.display_name(),
        failed.len() - skipped
    );
    if skipped > 0 {
        message.push_str(&format!(
            " Transfer stopped early: {skipped} tracks were not attempted."
        ));
    }

    TransferResult {
        success: true,
        message,
        destination_playlist_id: Some(created.id),
        destination_playlist_url: created.url,
        failed_tracks: failed,
        total_tracks,
        matched_tracks: matched,
    }
}

/// Merge every failure list back into source order for display.
fn failed_tracks(
    unmatched: Vec<UnmatchedTrack>,
    skipped: Vec<UnmatchedTrack>,
    not_created: Vec<UnmatchedTrack>,
) -> Vec<FailedTrack> {
    let mut all: Vec<UnmatchedTrack> = unmatched
        .into_iter()
        .chain(skipped)
        .chain(not_created)
        .collect();
    all.sort_by_key(|u| u.source_index);
    all.iter()
        .map(|u| FailedTrack::new(&u.track, &u.reason))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockCatalogProvider;
    use crate::{BridgeError, Track};

    fn instant() -> MatchConfig {
        MatchConfig::default().with_request_delay(Duration::ZERO)
    }

    fn source_with(tracks: Vec<Track>) -> MockCatalogProvider {
        let mut source = MockCatalogProvider::new();
        source.expect_platform().return_const(Platform::Spotify);
        source.expect_fetch_playlist().returning(move |id| {
            let mut playlist = Playlist::new(id, "Road Trip", Platform::Spotify);
            playlist.tracks = tracks.clone();
            Ok(playlist)
        });
        source
    }

    fn apple_destination() -> MockCatalogProvider {
        let mut destination = MockCatalogProvider::new();
        destination
            .expect_platform()
            .return_const(Platform::AppleMusic);
        destination.expect_search_track().returning(|q| {
            if q.name.starts_with("Missing") {
                Ok(None)
            } else {
                Ok(Some(
                    Track::new(q.name.clone(), q.artist.clone())
                        .with_platform_id(Platform::AppleMusic, format!("am-{}", q.name)),
                ))
            }
        });
        destination
    }

    #[test]
    fn test_with_timeout_keeps_sub_second_precision() {
        let options = TransferOptions::default().with_timeout(Duration::from_millis(900));
        assert_eq!(options.timeout_ms, Some(900));

        let options = TransferOptions::default().with_timeout(Duration::from_micros(1));
        assert_eq!(options.timeout_ms, Some(1));

        let options = TransferOptions::default().with_timeout(Duration::MAX);
        assert_eq!(options.timeout_ms, Some(u64::MAX));
    }

    #[tokio::test]
    async fn test_successful_transfer_reports_misses() {
        let source = source_with(vec![
            Track::new("One", "A"),
            Track::new("Missing Two", "B"),
            Track::new("Three", "C"),
        ]);
        let mut destination = apple_destination();
        destination
            .expect_create_playlist()
            .withf(|name, description, tracks| {
                name == "Road Trip"
                    && description == "Transferred from Spotify"
                    && tracks.len() == 2
                    && tracks.iter().all(|t| t.is_resolved_on(Platform::AppleMusic))
            })
            .returning(|name, _, tracks| {
                let mut playlist = Playlist::new("pl.new", name, Platform::AppleMusic);
                playlist.url = Some("https://music.apple.com/library/playlist/pl.new".to_string());
                playlist.tracks = tracks.to_vec();
                Ok(playlist)
            });

        let result = PlaylistTransfer::new(instant())
            .run(&source, "abc", &destination, &TransferOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(
            result.message,
            "Successfully created Apple Music playlist with 2 tracks. 1 tracks could not be found."
        );
        assert_eq!(result.destination_playlist_id.as_deref(), Some("pl.new"));
        assert_eq!(result.total_tracks, 3);
        assert_eq!(result.matched_tracks, 2);
        assert_eq!(result.failed_tracks.len(), 1);
        assert_eq!(result.failed_tracks[0].name, "Missing Two");
        assert_eq!(
            result.failed_tracks[0].reason,
            "No match found on destination platform"
        );
    }

    #[tokio::test]
    async fn test_no_matches_creates_nothing() {
        let source = source_with(vec![Track::new("Missing", "A")]);
        let mut destination = apple_destination();
        destination.expect_create_playlist().never();

        let result = PlaylistTransfer::new(instant())
            .run(&source, "abc", &destination, &TransferOptions::default())
            .await;

        assert!(!result.success);
        assert_eq!(result.message, "No tracks could be matched on Apple Music");
        assert_eq!(result.failed_tracks.len(), 1);
        assert!(result.destination_playlist_id.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_a_failed_result() {
        let mut source = MockCatalogProvider::new();
        source.expect_platform().return_const(Platform::Spotify);
        source
            .expect_fetch_playlist()
            .returning(|id| Err(BridgeError::NotFound(format!("playlist {id}"))));
        let destination = apple_destination();

        let result = PlaylistTransfer::new(instant())
            .run(&source, "gone", &destination, &TransferOptions::default())
            .await;

        assert!(!result.success);
        assert!(result.message.starts_with("Failed to fetch source playlist"));
    }

    #[tokio::test]
    async fn test_fatal_search_error_creates_no_playlist() {
        let source = source_with(vec![Track::new("One", "A"), Track::new("Two", "B")]);
        let mut destination = MockCatalogProvider::new();
        destination
            .expect_platform()
            .return_const(Platform::AppleMusic);
        destination
            .expect_search_track()
            .returning(|_| Err(BridgeError::Auth("developer token expired".to_string())));
        destination.expect_create_playlist().never();

        let result = PlaylistTransfer::new(instant())
            .run(&source, "abc", &destination, &TransferOptions::default())
            .await;

        assert!(!result.success);
        assert!(result.message.contains("developer token expired"));
        assert_eq!(result.total_tracks, 2);
    }

    #[tokio::test]
    async fn test_creation_failure_lists_matched_tracks() {
        let source = source_with(vec![
            Track::new("One", "A"),
            Track::new("Missing Two", "B"),
            Track::new("Three", "C"),
        ]);
        let mut destination = apple_destination();
        destination
            .expect_create_playlist()
            .returning(|_, _, _| Err(BridgeError::CreateFailed("quota exceeded".to_string())));

        let result = PlaylistTransfer::new(instant())
            .run(&source, "abc", &destination, &TransferOptions::default())
            .await;

        assert!(!result.success);
        let names: Vec<&str> = result.failed_tracks.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Missing Two", "Three"]);
        assert!(result.failed_tracks[0].reason.contains("quota exceeded"));
        assert_eq!(result.matched_tracks, 0);
    }

    #[tokio::test]
    async fn test_options_name_and_deduplication() {
        let source = source_with(vec![
            Track::new("One", "A"),
            Track::new("ONE", "a"),
            Track::new("Two", "B"),
        ]);
        let mut destination = apple_destination();
        destination
            .expect_create_playlist()
            .withf(|name, description, tracks| {
                name == "Copy" && description == "mine" && tracks.len() == 2
            })
            .returning(|name, _, tracks| {
                let mut playlist = Playlist::new("pl.copy", name, Platform::AppleMusic);
                playlist.tracks = tracks.to_vec();
                Ok(playlist)
            });

        let options = TransferOptions::default()
            .with_playlist_name("Copy")
            .with_description("mine")
            .with_deduplication(true);
        let result = PlaylistTransfer::new(instant())
            .run(&source, "abc", &destination, &options)
            .await;

        assert!(result.success);
        assert_eq!(result.total_tracks, 2);
        assert_eq!(result.success_rate(), 100.0);
    }

    #[tokio::test]
    async fn test_unregistered_platform_fails() {
        let registry = ProviderRegistry::new();
        let result = PlaylistTransfer::new(instant())
            .run_with_registry(
                &registry,
                Platform::Spotify,
                "abc",
                Platform::YoutubeMusic,
                &TransferOptions::default(),
            )
            .await;

        assert!(!result.success);
        assert!(result.message.contains("No catalog provider registered for Spotify"));
    }
}
