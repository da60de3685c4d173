//! Adapters used at the provider boundary.
//!
//! Providers receive loosely structured catalog data (JSON documents, video
//! titles, ISO-8601 durations) and must turn it into typed [`Track`](crate::Track)
//! values before anything reaches the matcher. These helpers hold the shared
//! parsing rules so each provider applies the same defaults.

use regex::Regex;
use std::sync::OnceLock;

/// Literal substituted for a missing title or artist.
pub const UNKNOWN: &str = "Unknown";

/// Return the trimmed value, or `"Unknown"` when it is absent or blank.
pub fn non_empty_or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Join artist names for display: `"A"`, `"A & B"`, `"A, B & C"`.
///
/// An empty slice yields `"Unknown Artist"`.
pub fn join_artist_names(artists: &[&str]) -> String {
    match artists {
        [] => "Unknown Artist".to_string(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} & {second}"),
        [init @ .., last] => format!("{} & {}", init.join(", "), last),
    }
}

/// Extract the year from a release date such as `2020`, `2020-03` or
/// `2020-03-20`.
///
/// Returns `None` for blank input and for the `0000` placeholder some
/// catalogs emit.
pub fn parse_release_year(release_date: &str) -> Option<u16> {
    let year: String = release_date.trim().chars().take(4).collect();
    if year.len() != 4 {
        return None;
    }
    year.parse::<u16>().ok().filter(|y| *y > 0)
}

fn duration_component(pattern: &'static OnceLock<Regex>, source: &str, text: &str) -> u64 {
    let re = pattern.get_or_init(|| Regex::new(source).expect("static duration pattern"));
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Convert an ISO-8601 duration (`PT4M13S`, `PT1H2M`, `PT0S`) to milliseconds.
///
/// Unrecognised or overflowing input yields 0, which the rest of the crate
/// reads as "duration unknown".
pub fn iso8601_duration_ms(iso_duration: &str) -> u64 {
    static HOURS: OnceLock<Regex> = OnceLock::new();
    static MINUTES: OnceLock<Regex> = OnceLock::new();
    static SECONDS: OnceLock<Regex> = OnceLock::new();

    // Only the time part after 'T' carries H/M/S; "P1M" would be a month.
    let time_part = match iso_duration.find('T') {
        Some(idx) => &iso_duration[idx..],
        None => return 0,
    };

    let hours = duration_component(&HOURS, r"(\d+)H", time_part);
    let minutes = duration_component(&MINUTES, r"(\d+)M", time_part);
    let seconds = duration_component(&SECONDS, r"(\d+)S", time_part);

    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .and_then(|total| total.checked_mul(1000))
        .unwrap_or(0)
}

/// Split a music video title into `(artist, track)`.
///
/// Handles the common `Artist - Track`, `Artist: Track`, and trailing
/// decorations like `(Official Video)`, `[Lyrics]` or `| Live`. When no
/// separator is present the artist is empty and the whole title is the track.
pub fn split_video_title(title: &str) -> (String, String) {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"^(.*?)\s*[-:]\s*(.*?)(?:\s*[\(\[\|].*)?$").expect("static title pattern")
    });

    match re.captures(title) {
        Some(caps) => {
            let artist = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
            let track = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            (artist, track)
        }
        None => (String::new(), title.trim().to_string()),
    }
}
