#![allow(dead_code)]
use beatbridge::{MatchConfig, MemoryCatalog, Platform, Playlist, Track};
use std::time::Duration;

pub const SOURCE_PLAYLIST_ID: &str = "37i9dQZF1DX4sWSpwq3LiO";

/// Matching without pacing so tests run instantly
pub fn instant_config() -> MatchConfig {
    MatchConfig::default().with_request_delay(Duration::ZERO)
}

fn spotify_track(name: &str, artist: &str, album: &str, duration_ms: u64, id: &str) -> Track {
    Track::new(name, artist)
        .with_album(album)
        .with_duration_ms(duration_ms)
        .with_platform_id(Platform::Spotify, id)
        .with_uri(Platform::Spotify, format!("spotify:track:{id}"))
}

/// The tracks of the Spotify source playlist, in playback order
pub fn source_tracks() -> Vec<Track> {
    vec![
        spotify_track(
            "Blinding Lights",
            "The Weeknd",
            "After Hours",
            200_040,
            "0VjIjW4GlUZAMYd2vXMi3b",
        )
        .with_isrc("USUG11904206"),
        spotify_track(
            "Levitating",
            "Dua Lipa",
            "Future Nostalgia",
            203_064,
            "463CkQjx2Zk1yXoBuierM9",
        ),
        spotify_track("Some Obscure B-Side", "Local Band", "", 180_000, "1obscure"),
        spotify_track(
            "Watermelon Sugar",
            "Harry Styles",
            "Fine Line",
            174_000,
            "6UelLqGlWMcVH1E5c4H7lY",
        ),
    ]
}

/// A Spotify catalog holding the source playlist
pub fn spotify_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new(Platform::Spotify);
    let mut playlist = Playlist::new(SOURCE_PLAYLIST_ID, "Today's Top Hits", Platform::Spotify);
    playlist.description = "The hottest tracks right now".to_string();
    playlist.owner = "Spotify".to_string();
    for track in source_tracks() {
        playlist.add_track(track);
    }
    catalog.add_playlist(playlist);
    catalog
}

/// An Apple Music catalog that carries every source track except the B-side
pub fn apple_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new(Platform::AppleMusic);
    catalog.add_track(
        Track::new("Blinding Lights", "The Weeknd")
            .with_album("After Hours")
            .with_duration_ms(200_040)
            .with_isrc("USUG11904206")
            .with_platform_id(Platform::AppleMusic, "1499378615")
            .with_uri(Platform::AppleMusic, "https://music.apple.com/us/song/1499378615"),
    );
    catalog.add_track(
        Track::new("Levitating", "Dua Lipa")
            .with_album("Future Nostalgia")
            .with_duration_ms(203_807)
            .with_platform_id(Platform::AppleMusic, "1538003843"),
    );
    catalog.add_track(
        Track::new("Watermelon Sugar", "Harry Styles")
            .with_album("Fine Line")
            .with_duration_ms(174_000)
            .with_platform_id(Platform::AppleMusic, "1485802967"),
    );
    catalog
}
