//! An in-memory catalog provider.
//!
//! [`MemoryCatalog`] holds the playlists and searchable tracks of one
//! platform. It backs the command-line tool (catalogs are loaded from JSON
//! files) and the integration tests, and follows the same lookup contract a
//! network-backed provider must honour.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::matching::{find_best_match_with_threshold, DEFAULT_ACCEPTANCE_THRESHOLD};
use crate::{BridgeError, CatalogProvider, Platform, Playlist, Result, Track};

/// On-disk shape of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub platform: Platform,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    /// Tracks available to `search_track`, beyond those on playlists
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// A [`CatalogProvider`] over tracks and playlists held in memory.
///
/// # Examples
///
/// ```rust
/// use beatbridge::{CatalogProvider, MemoryCatalog, Platform, Track};
///
/// # tokio_test::block_on(async {
/// let mut catalog = MemoryCatalog::new(Platform::AppleMusic);
/// catalog.add_track(
///     Track::new("Levitating", "Dua Lipa")
///         .with_isrc("GBAHT1901121")
///         .with_platform_id(Platform::AppleMusic, "1538003843"),
/// );
///
/// let query = Track::new("Levitating (feat. DaBaby)", "Dua Lipa").with_isrc("GBAHT1901121");
/// let found = catalog.search_track(&query).await.unwrap().unwrap();
/// assert_eq!(found.platform_id(Platform::AppleMusic), Some("1538003843"));
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryCatalog {
    platform: Platform,
    playlists: Mutex<HashMap<String, Playlist>>,
    tracks: Vec<Track>,
    match_threshold: f64,
    available: AtomicBool,
    next_playlist: AtomicU64,
}

impl MemoryCatalog {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            playlists: Mutex::new(HashMap::new()),
            tracks: Vec::new(),
            match_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            available: AtomicBool::new(true),
            next_playlist: AtomicU64::new(1),
        }
    }

    /// Minimum similarity for a fuzzy text hit to be returned.
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Build a catalog from its file representation.
    ///
    /// Every track on a playlist is also searchable.
    pub fn from_file(file: CatalogFile) -> Self {
        let mut catalog = Self::new(file.platform);
        for track in file.tracks {
            catalog.add_track(track);
        }
        for playlist in file.playlists {
            catalog.add_playlist(playlist);
        }
        catalog
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json(&json)?;
        log::debug!(
            "Loaded {} catalog with {} tracks from {}",
            catalog.platform,
            catalog.tracks.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Snapshot the catalog in its file representation, playlists sorted by ID.
    pub fn to_file(&self) -> CatalogFile {
        let mut playlists: Vec<Playlist> = self.lock_playlists().values().cloned().collect();
        playlists.sort_by(|a, b| a.id.cmp(&b.id));
        CatalogFile {
            platform: self.platform,
            playlists,
            tracks: self.tracks.clone(),
        }
    }

    /// Write the catalog to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_file())?;
        std::fs::write(path, json)?;
        log::debug!("Saved {} catalog to {}", self.platform, path.display());
        Ok(())
    }

    /// Make a track searchable.
    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Store a playlist, making its tracks searchable as well.
    ///
    /// A playlist with the same ID is replaced.
    pub fn add_playlist(&mut self, playlist: Playlist) {
        for track in &playlist.tracks {
            if !self.tracks.contains(track) {
                self.tracks.push(track.clone());
            }
        }
        self.lock_playlists().insert(playlist.id.clone(), playlist);
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`BridgeError::ProviderUnavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// A stored playlist, including those created through the provider.
    pub fn playlist(&self, playlist_id: &str) -> Option<Playlist> {
        self.lock_playlists().get(playlist_id).cloned()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn lock_playlists(&self) -> std::sync::MutexGuard<'_, HashMap<String, Playlist>> {
        // A poisoned map still holds consistent data; inserts are single calls.
        self.playlists
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BridgeError::ProviderUnavailable(format!(
                "{} catalog is unreachable",
                self.platform.display_name()
            )))
        }
    }

    fn search_by_isrc(&self, isrc: &str) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.isrc.as_deref().is_some_and(|code| code.eq_ignore_ascii_case(isrc)))
    }

    /// Free-text lookup on name and artist.
    ///
    /// An exact case-insensitive name/artist pair wins. Otherwise every track
    /// sharing a word of the title with the query is a candidate, and the best
    /// one is returned if it reaches the match threshold.
    fn search_by_text(&self, query: &Track) -> Option<&Track> {
        let key = query.identity_key();
        if let Some(exact) = self.tracks.iter().find(|t| t.identity_key() == key) {
            return Some(exact);
        }

        let words: Vec<String> = query
            .name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let hits = self.tracks.iter().filter(|t| {
            let name = t.name.to_lowercase();
            words.iter().any(|w| name.contains(w.as_str()))
        });

        find_best_match_with_threshold(query, hits, self.match_threshold)
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        self.ensure_available()?;
        self.playlist(playlist_id).ok_or_else(|| {
            BridgeError::NotFound(format!(
                "Playlist {playlist_id} not found on {}",
                self.platform.display_name()
            ))
        })
    }

    async fn search_track(&self, query: &Track) -> Result<Option<Track>> {
        self.ensure_available()?;

        if let Some(isrc) = query.isrc.as_deref() {
            if let Some(found) = self.search_by_isrc(isrc) {
                log::trace!("ISRC {isrc} resolved to '{found}'");
                return Ok(Some(found.clone()));
            }
        }

        Ok(self.search_by_text(query).cloned())
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        tracks: &[Track],
    ) -> Result<Playlist> {
        self.ensure_available()?;
        if name.trim().is_empty() {
            return Err(BridgeError::CreateFailed(
                "Playlist name must not be empty".to_string(),
            ));
        }

        let serial = self.next_playlist.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}-playlist-{serial}", self.platform);

        let mut playlist = Playlist::new(id.clone(), name, self.platform);
        playlist.description = description.to_string();
        playlist.url = Some(format!("memory://{}/playlist/{id}", self.platform));
        playlist.created_at = Some(chrono::Utc::now());
        playlist.tracks = tracks
            .iter()
            .filter(|t| t.is_resolved_on(self.platform))
            .cloned()
            .collect();

        let skipped = tracks.len() - playlist.tracks.len();
        if skipped > 0 {
            log::debug!("Skipped {skipped} tracks without a {} ID", self.platform);
        }

        self.lock_playlists().insert(id, playlist.clone());
        Ok(playlist)
    }
}
