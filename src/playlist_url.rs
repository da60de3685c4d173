//! Playlist share links.
//!
//! Users identify a source playlist by pasting its share URL. These helpers
//! tell which platform a link belongs to and pull out the playlist ID that
//! [`CatalogProvider::fetch_playlist`](crate::CatalogProvider::fetch_playlist)
//! expects.
//!
//! Recognised forms:
//!
//! - `https://open.spotify.com/playlist/<id>?si=...`
//! - `spotify:playlist:<id>`
//! - `https://music.apple.com/<country>/playlist/<slug>/pl.<id>`
//! - `https://music.youtube.com/playlist?list=<id>`

use regex::Regex;
use std::sync::OnceLock;

use crate::{BridgeError, Platform, Result};

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static playlist URL pattern"))
}

fn spotify_web() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"spotify\.com/playlist/([a-zA-Z0-9]+)")
}

fn spotify_uri() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"spotify:playlist:([a-zA-Z0-9]+)")
}

fn apple_library() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"music\.apple\.com/.+/playlist/.+/(pl\.[a-zA-Z0-9]+)")
}

fn apple_any() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"music\.apple\.com/.+/playlist/.+/([a-zA-Z0-9\.]+)")
}

fn youtube_list() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"list=([a-zA-Z0-9_-]+)")
}

fn first_capture(re: &Regex, url: &str) -> Option<String> {
    re.captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Value of query parameter `key`, percent-decoded.
fn query_param(url: &str, key: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Extract the playlist ID from a share URL for `platform`.
///
/// Returns `None` when the URL does not carry a playlist ID in one of the
/// forms that platform uses.
///
/// # Examples
///
/// ```rust
/// use beatbridge::playlist_url::extract_playlist_id;
/// use beatbridge::Platform;
///
/// let url = "https://open.spotify.com/playlist/37i9dQZF1DX4sWSpwq3LiO?si=12345678";
/// assert_eq!(
///     extract_playlist_id(url, Platform::Spotify).as_deref(),
///     Some("37i9dQZF1DX4sWSpwq3LiO")
/// );
/// assert_eq!(extract_playlist_id(url, Platform::AppleMusic), None);
/// ```
pub fn extract_playlist_id(url: &str, platform: Platform) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    match platform {
        Platform::Spotify => {
            first_capture(spotify_web(), url).or_else(|| first_capture(spotify_uri(), url))
        }
        Platform::AppleMusic => {
            first_capture(apple_library(), url).or_else(|| first_capture(apple_any(), url))
        }
        Platform::YoutubeMusic => query_param(url, "list"),
    }
}

/// Guess the platform a share URL belongs to from its host or URI scheme.
pub fn detect_platform(url: &str) -> Option<Platform> {
    let url = url.trim().to_lowercase();
    if url.contains("spotify.com") || url.starts_with("spotify:") {
        Some(Platform::Spotify)
    } else if url.contains("music.apple.com") {
        Some(Platform::AppleMusic)
    } else if url.contains("music.youtube.com") {
        Some(Platform::YoutubeMusic)
    } else {
        None
    }
}

fn has_scheme_and_host(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !scheme.is_empty() && !host.is_empty()
        }
        None => false,
    }
}

/// Check that `url` is a playlist link for `platform` and return its ID.
///
/// The error message says what is wrong with the link so it can be shown to
/// the user as-is.
pub fn validate_playlist_url(url: &str, platform: Platform) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(invalid("Please enter a playlist URL."));
    }

    let spotify_uri = platform == Platform::Spotify && url.starts_with("spotify:");
    if !spotify_uri && !has_scheme_and_host(url) {
        return Err(invalid("Invalid URL format. Please enter a complete URL."));
    }

    match platform {
        Platform::Spotify => validate_spotify(url),
        Platform::AppleMusic => validate_apple_music(url),
        Platform::YoutubeMusic => validate_youtube_music(url),
    }
}

fn invalid(message: &str) -> BridgeError {
    BridgeError::Parse(message.to_string())
}

fn missing_id() -> BridgeError {
    invalid("Could not find a valid playlist ID in the URL. Please check the URL and try again.")
}

fn validate_spotify(url: &str) -> Result<String> {
    if !url.contains("spotify.com") && !url.contains("spotify:") {
        return Err(invalid(
            "This doesn't appear to be a Spotify URL. Please enter a URL from open.spotify.com.",
        ));
    }
    if !url.contains("playlist") {
        return Err(invalid(
            "This doesn't appear to be a playlist URL. Please enter a Spotify playlist URL.",
        ));
    }

    if url.contains("spotify.com/playlist/") {
        first_capture(spotify_web(), url).ok_or_else(missing_id)
    } else if url.contains("spotify:playlist:") {
        first_capture(spotify_uri(), url).ok_or_else(|| {
            invalid(
                "Could not find a valid playlist ID in the URI. Please use a URL from the Spotify web player.",
            )
        })
    } else {
        Err(invalid(
            "This doesn't appear to be a valid Spotify playlist URL. Please enter a URL from the Spotify web player.",
        ))
    }
}

fn validate_apple_music(url: &str) -> Result<String> {
    if !url.contains("music.apple.com") {
        return Err(invalid(
            "This doesn't appear to be an Apple Music URL. Please enter a URL from music.apple.com.",
        ));
    }
    if !url.contains("/playlist/") {
        return Err(invalid(
            "This doesn't appear to be a playlist URL. Please enter an Apple Music playlist URL.",
        ));
    }
    extract_playlist_id(url, Platform::AppleMusic).ok_or_else(missing_id)
}

fn validate_youtube_music(url: &str) -> Result<String> {
    if !url.contains("music.youtube.com") {
        return Err(invalid(
            "This doesn't appear to be a YouTube Music URL. Please enter a URL from music.youtube.com.",
        ));
    }
    if !url.contains("list=") {
        return Err(invalid(
            "This doesn't appear to be a playlist URL. Please enter a YouTube Music playlist URL.",
        ));
    }
    if youtube_list().is_match(url) {
        extract_playlist_id(url, Platform::YoutubeMusic).ok_or_else(missing_id)
    } else {
        Err(missing_id())
    }
}
