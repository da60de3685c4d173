//! Cross-platform track resolution.
//!
//! [`TrackMatcher::match_tracks`] resolves each source track against a
//! destination [`CatalogProvider`] and partitions the tracks into matched and
//! unmatched lists, both in source order. [`find_best_match`] picks the best
//! of a candidate set under the acceptance threshold, and
//! [`deduplicate_tracks`] removes repeated name/artist pairs.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

use crate::cancel::{cancelled, CancellationState};
use crate::events::{TransferEventEmitter, TransferEventSender};
use crate::pacing::RequestPacer;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::similarity::similarity;
use crate::{BridgeError, CatalogProvider, MissReason, Platform, Result, Track};

/// Minimum similarity for a candidate to count as the same song.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.8;

/// Default spacing between provider searches, in milliseconds.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 100;

/// Matching policy.
///
/// Both the acceptance threshold and the request delay are uncalibrated
/// defaults; tune them against real catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum similarity for [`find_best_match`] and match verification
    pub acceptance_threshold: f64,
    /// Minimum spacing between the starts of two provider searches
    pub request_delay_ms: u64,
    /// Number of searches allowed in flight at once
    pub max_concurrent_searches: usize,
    /// Score provider results against the source track and reject those
    /// below the acceptance threshold
    pub verify_matches: bool,
    /// Retry policy for rate-limited searches
    pub retry: RetryConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            max_concurrent_searches: 1,
            verify_matches: false,
            retry: RetryConfig::default(),
        }
    }
}

impl MatchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn with_acceptance_threshold(mut self, threshold: f64) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_concurrent_searches(mut self, max: usize) -> Self {
        self.max_concurrent_searches = max;
        self
    }

    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_matches = verify;
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(BridgeError::Config(format!(
                "acceptance_threshold must be within [0, 1], got {}",
                self.acceptance_threshold
            )));
        }
        if self.max_concurrent_searches == 0 {
            return Err(BridgeError::Config(
                "max_concurrent_searches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A source track resolved on the destination platform.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedTrack {
    /// Position in the source sequence
    pub source_index: usize,
    /// The source track with the destination identifiers merged in
    pub track: Track,
}

/// A source track that was not resolved, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedTrack {
    /// Position in the source sequence
    pub source_index: usize,
    pub track: Track,
    pub reason: MissReason,
}

/// Outcome of [`TrackMatcher::match_tracks`].
///
/// Every source track lands in exactly one of the three lists, and each list
/// is ordered by source index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub matched: Vec<MatchedTrack>,
    pub unmatched: Vec<UnmatchedTrack>,
    /// Tracks never searched because the run was cancelled or timed out
    pub skipped: Vec<UnmatchedTrack>,
}

impl MatchReport {
    /// Number of source tracks accounted for.
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len() + self.skipped.len()
    }

    /// Whether the run stopped before every track was attempted.
    pub fn interrupted(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Split into `(matched, unmatched)` track lists, folding skipped tracks
    /// into the unmatched list at their source position.
    pub fn into_tracks(self) -> (Vec<Track>, Vec<Track>) {
        let matched = self.matched.into_iter().map(|m| m.track).collect();

        let mut unmatched: Vec<UnmatchedTrack> =
            self.unmatched.into_iter().chain(self.skipped).collect();
        unmatched.sort_by_key(|u| u.source_index);

        (matched, unmatched.into_iter().map(|u| u.track).collect())
    }
}

enum Resolution {
    Matched(MatchedTrack),
    Unmatched(UnmatchedTrack),
    Skipped(UnmatchedTrack),
}

/// Resolves source tracks on a destination catalog.
///
/// # Examples
///
/// ```rust
/// use beatbridge::{MatchConfig, MemoryCatalog, Platform, Track, TrackMatcher};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let mut catalog = MemoryCatalog::new(Platform::YoutubeMusic);
/// catalog.add_track(
///     Track::new("Blinding Lights", "The Weeknd").with_platform_id(Platform::YoutubeMusic, "4NRXx6U8ABQ"),
/// );
///
/// let matcher = TrackMatcher::new(MatchConfig::default().with_request_delay(Duration::ZERO));
/// let source = vec![
///     Track::new("Blinding Lights", "The Weeknd"),
///     Track::new("Unreleased Demo", "Nobody"),
/// ];
///
/// let report = matcher.match_tracks(source, &catalog).await.unwrap();
/// assert_eq!(report.matched.len(), 1);
/// assert_eq!(report.unmatched.len(), 1);
/// assert_eq!(
///     report.matched[0].track.platform_id(Platform::YoutubeMusic),
///     Some("4NRXx6U8ABQ")
/// );
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrackMatcher {
    config: MatchConfig,
    cancellation: CancellationState,
    events: Option<TransferEventSender>,
}

impl TrackMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            cancellation: CancellationState::new(),
            events: None,
        }
    }

    /// Share a cancellation handle with the caller.
    pub fn with_cancellation(mut self, cancellation: CancellationState) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Emit per-track progress events on `sender`.
    pub fn with_events(mut self, sender: TransferEventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationState {
        &self.cancellation
    }

    /// Resolve every track on `destination`.
    ///
    /// A per-track miss (no result, a failed search, exhausted rate-limit
    /// retries) never aborts the batch. Only a fatal provider error
    /// ([`BridgeError::is_fatal`]) is returned as `Err`.
    pub async fn match_tracks(
        &self,
        tracks: Vec<Track>,
        destination: &dyn CatalogProvider,
    ) -> Result<MatchReport> {
        self.match_tracks_until(tracks, destination, None).await
    }

    /// Like [`match_tracks`](Self::match_tracks), but stop starting searches
    /// once `deadline` passes.
    ///
    /// Work finished before the deadline is kept; tracks not yet resolved are
    /// returned in [`MatchReport::skipped`].
    pub async fn match_tracks_until(
        &self,
        tracks: Vec<Track>,
        destination: &dyn CatalogProvider,
        deadline: Option<Instant>,
    ) -> Result<MatchReport> {
        self.config.validate()?;

        let total = tracks.len();
        let platform = destination.platform();
        log::info!("Matching {total} tracks to {}", platform.display_name());

        let pacer = RequestPacer::new(self.config.request_delay());
        let mut resolutions = stream::iter(tracks.into_iter().enumerate())
            .map(|(index, track)| {
                self.resolve(index, total, track, destination, &pacer, deadline)
            })
            .buffered(self.config.max_concurrent_searches);

        let mut report = MatchReport::default();
        while let Some(resolution) = resolutions.next().await {
            match resolution? {
                Resolution::Matched(m) => report.matched.push(m),
                Resolution::Unmatched(u) => report.unmatched.push(u),
                Resolution::Skipped(s) => report.skipped.push(s),
            }
        }

        if report.interrupted() {
            log::warn!(
                "Matching stopped early: {} of {total} tracks were not attempted",
                report.skipped.len()
            );
        }
        log::info!("Matched {}/{total} tracks", report.matched.len());
        Ok(report)
    }

    async fn resolve(
        &self,
        index: usize,
        total: usize,
        track: Track,
        destination: &dyn CatalogProvider,
        pacer: &RequestPacer,
        deadline: Option<Instant>,
    ) -> Result<Resolution> {
        let platform = destination.platform();

        if let Some(id) = track.platform_id(platform) {
            log::debug!("'{track}' already carries {platform} ID {id}; skipping search");
            self.events
                .emit_track_matched(index, &track.name, &track.artist, Some(id));
            return Ok(Resolution::Matched(MatchedTrack {
                source_index: index,
                track,
            }));
        }

        if self.should_stop(deadline) {
            return Ok(self.skipped(index, track));
        }

        if pacer
            .wait_turn(self.cancellation.subscribe(), deadline)
            .await
            .is_err()
        {
            return Ok(self.skipped(index, track));
        }

        log::debug!("Matching track {}/{total}: {track}", index + 1);

        let outcome = {
            let search = retry_with_backoff(
                &self.config.retry,
                "search_track",
                || destination.search_track(&track),
                |delay, _| self.events.emit_rate_limited(delay),
            );
            let bounded = async {
                match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline, search).await.ok(),
                    None => Some(search.await),
                }
            };
            tokio::select! {
                result = bounded => result,
                _ = cancelled(self.cancellation.subscribe()) => None,
            }
        };

        let Some(result) = outcome else {
            return Ok(self.skipped(index, track));
        };

        match result {
            Ok(retried) => {
                if retried.attempts_made > 0 {
                    log::info!(
                        "Search for '{track}' succeeded after {} retries ({}s waiting)",
                        retried.attempts_made,
                        retried.total_retry_time
                    );
                }
                match retried.result {
                    Some(found) => Ok(self.accept(index, track, &found, platform)),
                    None => {
                        log::debug!("No match found for '{track}'");
                        Ok(self.unmatched(index, track, MissReason::NoResult))
                    }
                }
            }
            Err(e) if e.is_fatal() => {
                log::error!("Destination provider failed while matching '{track}': {e}");
                Err(e)
            }
            Err(e) => {
                log::warn!("Search for '{track}' failed: {e}");
                Ok(self.unmatched(index, track, MissReason::SearchFailed(e.to_string())))
            }
        }
    }

    fn accept(&self, index: usize, track: Track, found: &Track, platform: Platform) -> Resolution {
        if !found.is_resolved_on(platform) {
            let reason = MissReason::SearchFailed(format!(
                "provider result carried no {platform} ID"
            ));
            return self.unmatched(index, track, reason);
        }

        if self.config.verify_matches {
            let score = similarity(&track, found);
            if score < self.config.acceptance_threshold {
                log::debug!("Rejected '{found}' for '{track}' with score {score:.3}");
                return self.unmatched(index, track, MissReason::LowConfidence { score });
            }
        }

        let track = track.merged_with(found, platform);
        log::debug!("Found match for '{track}'");
        self.events.emit_track_matched(
            index,
            &track.name,
            &track.artist,
            track.platform_id(platform),
        );
        Resolution::Matched(MatchedTrack {
            source_index: index,
            track,
        })
    }

    fn unmatched(&self, index: usize, track: Track, reason: MissReason) -> Resolution {
        self.events
            .emit_track_unmatched(index, &track.name, &track.artist, &reason.to_string());
        Resolution::Unmatched(UnmatchedTrack {
            source_index: index,
            track,
            reason,
        })
    }

    fn skipped(&self, index: usize, track: Track) -> Resolution {
        let reason = MissReason::NotAttempted(self.stop_reason().to_string());
        Resolution::Skipped(UnmatchedTrack {
            source_index: index,
            track,
            reason,
        })
    }

    fn should_stop(&self, deadline: Option<Instant>) -> bool {
        self.cancellation.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn stop_reason(&self) -> &'static str {
        if self.cancellation.is_cancelled() {
            "transfer cancelled"
        } else {
            "transfer timed out"
        }
    }

    /// [`find_best_match`] using this matcher's acceptance threshold.
    pub fn find_best_match<'a>(&self, track: &Track, candidates: &'a [Track]) -> Option<&'a Track> {
        find_best_match_with_threshold(track, candidates, self.config.acceptance_threshold)
    }
}

/// The highest-scoring candidate and its score, regardless of threshold.
///
/// Ties keep the earliest candidate.
pub fn best_candidate<'a>(
    track: &Track,
    candidates: impl IntoIterator<Item = &'a Track>,
) -> Option<(&'a Track, f64)> {
    let mut best: Option<(&Track, f64)> = None;
    for candidate in candidates {
        let score = similarity(track, candidate);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    best
}

/// The best candidate for `track`, accepted only if it scores at least
/// `threshold`.
pub fn find_best_match_with_threshold<'a>(
    track: &Track,
    candidates: impl IntoIterator<Item = &'a Track>,
    threshold: f64,
) -> Option<&'a Track> {
    let (candidate, score) = best_candidate(track, candidates)?;
    if score >= threshold {
        Some(candidate)
    } else {
        log::debug!("Best candidate for '{track}' scored {score:.3}, below {threshold}");
        None
    }
}

/// The best candidate for `track` at the default 0.8 acceptance threshold.
///
/// Below the threshold two tracks are treated as different songs. Remixes or
/// live versions sharing a title usually fall under it through artist or
/// duration drift, but that is not guaranteed.
///
/// ```rust
/// use beatbridge::{find_best_match, Track};
///
/// let wanted = Track::new("Hello", "Adele").with_duration_ms(295_000);
/// let candidates = vec![
///     Track::new("Hello", "Lionel Richie").with_duration_ms(247_000),
///     Track::new("Hello", "Adele").with_duration_ms(295_500),
/// ];
///
/// let best = find_best_match(&wanted, &candidates).unwrap();
/// assert_eq!(best.artist, "Adele");
/// ```
pub fn find_best_match<'a>(track: &Track, candidates: &'a [Track]) -> Option<&'a Track> {
    find_best_match_with_threshold(track, candidates, DEFAULT_ACCEPTANCE_THRESHOLD)
}

/// Remove tracks whose lower-cased name and artist repeat an earlier track.
///
/// The first occurrence wins and order is otherwise preserved. Matching is
/// exact after lower-casing; no similarity scoring is involved.
pub fn deduplicate_tracks(tracks: impl IntoIterator<Item = Track>) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.identity_key()))
        .collect()
}
