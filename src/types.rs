//! Data types shared by every part of the crate.
//!
//! This module contains the platform-neutral track and playlist records, the
//! platform tag that keys their per-platform identifiers, and the
//! external-facing transfer report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::parsing::non_empty_or_unknown;
use crate::BridgeError;

// ================================================================================================
// PLATFORM TAG
// ================================================================================================

/// A supported streaming platform.
///
/// The serialized form (`spotify`, `apple_music`, `youtube_music`) is the tag
/// used as key in [`Track::uris`] and [`Track::platform_ids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Spotify,
    AppleMusic,
    YoutubeMusic,
}

impl Platform {
    /// Every supported platform, in a stable order.
    pub const ALL: [Platform; 3] = [
        Platform::Spotify,
        Platform::AppleMusic,
        Platform::YoutubeMusic,
    ];

    /// The machine tag of this platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::AppleMusic => "apple_music",
            Platform::YoutubeMusic => "youtube_music",
        }
    }

    /// The user-facing platform name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::AppleMusic => "Apple Music",
            Platform::YoutubeMusic => "YouTube Music",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BridgeError;

    /// Parse a platform tag, ignoring case and accepting `-`, `_` or spaces
    /// as separators (`apple-music`, `Apple Music`, `apple_music`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "spotify" => Ok(Platform::Spotify),
            "applemusic" | "apple" => Ok(Platform::AppleMusic),
            "youtubemusic" | "youtube" | "ytmusic" => Ok(Platform::YoutubeMusic),
            _ => Err(BridgeError::Parse(format!("Unsupported platform: {s}"))),
        }
    }
}

// ================================================================================================
// TRACK
// ================================================================================================

/// A platform-neutral song record.
///
/// One `Track` represents one logical song. As it is resolved on other
/// platforms it accumulates entries in [`uris`](Self::uris) and
/// [`platform_ids`](Self::platform_ids); the same song on two platforms is one
/// value with two keys, not two values.
///
/// `name` and `artist` are never empty: constructors and deserialization
/// substitute `"Unknown"`. A `duration_ms` of 0 means the duration is unknown.
///
/// # Examples
///
/// ```rust
/// use beatbridge::{Platform, Track};
///
/// let track = Track::new("Blinding Lights", "The Weeknd")
///     .with_album("After Hours")
///     .with_duration_ms(200_040)
///     .with_isrc("USUG11904206")
///     .with_platform_id(Platform::Spotify, "0VjIjW4GlUZAMYd2vXMi3b")
///     .with_uri(Platform::Spotify, "spotify:track:0VjIjW4GlUZAMYd2vXMi3b");
///
/// assert_eq!(track.to_string(), "Blinding Lights by The Weeknd");
/// assert!(track.is_resolved_on(Platform::Spotify));
/// assert!(!track.is_resolved_on(Platform::AppleMusic));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// The track title
    #[serde(default = "unknown", deserialize_with = "deserialize_identity")]
    pub name: String,
    /// The primary artist
    #[serde(default = "unknown", deserialize_with = "deserialize_identity")]
    pub artist: String,
    /// The album name, empty when the platform did not report one
    #[serde(default)]
    pub album: String,
    /// Duration in milliseconds, 0 when unknown
    #[serde(default)]
    pub duration_ms: u64,
    /// International Standard Recording Code
    #[serde(default)]
    pub isrc: Option<String>,
    /// Platform-specific URIs keyed by platform
    #[serde(default)]
    pub uris: BTreeMap<Platform, String>,
    /// Platform-specific opaque IDs keyed by platform
    #[serde(default)]
    pub platform_ids: BTreeMap<Platform, String>,
    /// Featured artists after the primary one, in display order
    #[serde(default)]
    pub additional_artists: Vec<String>,
    #[serde(default)]
    pub release_year: Option<u16>,
    #[serde(default)]
    pub album_art_url: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    /// Platform-specific popularity (0-100); not comparable across platforms
    #[serde(default)]
    pub popularity: Option<u8>,
    #[serde(default)]
    pub genres: Vec<String>,
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn deserialize_identity<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(non_empty_or_unknown(raw.as_deref()))
}

impl Track {
    /// Create a track with only its identity fields set.
    ///
    /// Empty or whitespace-only `name`/`artist` become `"Unknown"`.
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        let name = name.into();
        let artist = artist.into();
        Self {
            name: non_empty_or_unknown(Some(&name)),
            artist: non_empty_or_unknown(Some(&artist)),
            album: String::new(),
            duration_ms: 0,
            isrc: None,
            uris: BTreeMap::new(),
            platform_ids: BTreeMap::new(),
            additional_artists: Vec::new(),
            release_year: None,
            album_art_url: None,
            explicit: false,
            popularity: None,
            genres: Vec::new(),
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the ISRC. Blank codes are ignored.
    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        let isrc = isrc.into();
        let isrc = isrc.trim();
        self.isrc = (!isrc.is_empty()).then(|| isrc.to_uppercase());
        self
    }

    pub fn with_platform_id(mut self, platform: Platform, id: impl Into<String>) -> Self {
        self.platform_ids.insert(platform, id.into());
        self
    }

    pub fn with_uri(mut self, platform: Platform, uri: impl Into<String>) -> Self {
        self.uris.insert(platform, uri.into());
        self
    }

    pub fn with_additional_artists(mut self, artists: Vec<String>) -> Self {
        self.additional_artists = artists;
        self
    }

    pub fn with_release_year(mut self, year: u16) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_album_art_url(mut self, url: impl Into<String>) -> Self {
        self.album_art_url = Some(url.into());
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// Set the popularity, clamped to 100.
    pub fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = Some(popularity.min(100));
        self
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    /// The opaque ID of this track on `platform`, if resolved there.
    pub fn platform_id(&self, platform: Platform) -> Option<&str> {
        self.platform_ids.get(&platform).map(String::as_str)
    }

    /// The URI of this track on `platform`, if resolved there.
    pub fn uri(&self, platform: Platform) -> Option<&str> {
        self.uris.get(&platform).map(String::as_str)
    }

    /// Whether this track carries an ID for `platform`.
    pub fn is_resolved_on(&self, platform: Platform) -> bool {
        self.platform_ids.contains_key(&platform)
    }

    /// Copy `other`'s identifiers for `platform` into this track.
    ///
    /// Only the entries keyed by `platform` are copied; identifiers this track
    /// already holds for other platforms are left untouched.
    pub fn merge_identifiers_from(&mut self, other: &Track, platform: Platform) {
        if let Some(uri) = other.uris.get(&platform) {
            self.uris.insert(platform, uri.clone());
        }
        if let Some(id) = other.platform_ids.get(&platform) {
            self.platform_ids.insert(platform, id.clone());
        }
    }

    /// Owned variant of [`merge_identifiers_from`](Self::merge_identifiers_from).
    #[must_use]
    pub fn merged_with(mut self, other: &Track, platform: Platform) -> Track {
        self.merge_identifiers_from(other, platform);
        self
    }

    /// All artists joined for display: `"A"`, `"A & B"`, `"A, B & C"`.
    pub fn artists_string(&self) -> String {
        if self.additional_artists.is_empty() {
            return self.artist.clone();
        }

        let mut artists = Vec::with_capacity(self.additional_artists.len() + 1);
        artists.push(self.artist.as_str());
        artists.extend(self.additional_artists.iter().map(String::as_str));
        crate::parsing::join_artist_names(&artists)
    }

    /// Free-text query used when no ISRC lookup is possible.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.name, self.artist)
    }

    /// Case-insensitive name/artist key used for coarse de-duplication.
    pub fn identity_key(&self) -> (String, String) {
        (self.name.to_lowercase(), self.artist.to_lowercase())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.name, self.artist)
    }
}

// ================================================================================================
// PLAYLIST
// ================================================================================================

/// An ordered collection of tracks owned by exactly one platform.
///
/// Track order is playback order and mirrors the source platform. A transfer
/// never re-tags a playlist: the destination playlist is a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Platform-specific playlist ID
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Owner display name
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// The platform this playlist lives on
    pub platform: Platform,
    #[serde(default)]
    pub url: Option<String>,
    /// Cover art URL
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Free-form platform-specific metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_public() -> bool {
    true
}

/// Number of tracks included in [`Playlist::preview`].
const PREVIEW_TRACKS: usize = 10;

impl Playlist {
    /// Create an empty public playlist.
    pub fn new(id: impl Into<String>, name: impl Into<String>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            owner: String::new(),
            tracks: Vec::new(),
            platform,
            url: None,
            image_url: None,
            is_public: true,
            collaborative: false,
            followers: 0,
            created_at: None,
            metadata: HashMap::new(),
        }
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Remove the first track whose ID on this playlist's platform is `track_id`.
    ///
    /// Returns `false` when no such track exists.
    pub fn remove_track(&mut self, track_id: &str) -> bool {
        let platform = self.platform;
        match self
            .tracks
            .iter()
            .position(|t| t.platform_id(platform) == Some(track_id))
        {
            Some(index) => {
                self.tracks.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// A display summary with the first ten tracks.
    pub fn preview(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "owner": self.owner,
            "platform": self.platform,
            "url": self.url,
            "image_url": self.image_url,
            "is_public": self.is_public,
            "followers": self.followers,
            "collaborative": self.collaborative,
            "created_at": self.created_at,
            "track_count": self.tracks.len(),
            "tracks": self.tracks.iter().take(PREVIEW_TRACKS).collect::<Vec<_>>(),
            "has_more_tracks": self.tracks.len() > PREVIEW_TRACKS,
        })
    }
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} tracks) on {}",
            self.name,
            self.tracks.len(),
            self.platform
        )
    }
}

// ================================================================================================
// TRANSFER REPORTING
// ================================================================================================

/// Why a source track did not end up on the destination playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MissReason {
    /// The provider answered with an explicit "no result".
    NoResult,
    /// The provider call failed for this track.
    SearchFailed(String),
    /// The best candidate scored below the acceptance threshold.
    LowConfidence { score: f64 },
    /// The track was never searched (deadline or cancellation).
    NotAttempted(String),
    /// The track matched but the destination playlist was not created.
    NotCreated(String),
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::NoResult => write!(f, "No match found on destination platform"),
            MissReason::SearchFailed(err) => write!(f, "Search failed: {err}"),
            MissReason::LowConfidence { score } => write!(
                f,
                "Best candidate scored {score:.2}, below the acceptance threshold"
            ),
            MissReason::NotAttempted(why) => write!(f, "Not attempted: {why}"),
            MissReason::NotCreated(err) => write!(f, "Not created: {err}"),
        }
    }
}

/// A track that could not be transferred, reduced for user display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTrack {
    pub name: String,
    pub artist: String,
    pub reason: String,
}

impl FailedTrack {
    pub fn new(track: &Track, reason: &MissReason) -> Self {
        Self {
            name: track.name.clone(),
            artist: track.artist.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of one playlist transfer.
///
/// This is the only value that crosses the core boundary: every failure is
/// folded into `success: false` plus a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    pub destination_playlist_id: Option<String>,
    pub destination_playlist_url: Option<String>,
    /// Tracks that did not make it, in source order
    pub failed_tracks: Vec<FailedTrack>,
    /// Number of source tracks considered
    pub total_tracks: usize,
    /// Number of tracks placed on the destination playlist
    pub matched_tracks: usize,
}

impl TransferResult {
    /// A failed transfer with no destination playlist.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            destination_playlist_id: None,
            destination_playlist_url: None,
            failed_tracks: Vec::new(),
            total_tracks: 0,
            matched_tracks: 0,
        }
    }

    /// Percentage of source tracks that were transferred.
    pub fn success_rate(&self) -> f64 {
        if self.total_tracks == 0 {
            return 0.0;
        }
        (self.matched_tracks as f64 / self.total_tracks as f64) * 100.0
    }
}
