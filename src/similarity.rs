//! Metadata similarity between two track records.
//!
//! [`similarity`] is a weighted partial-credit sum over title, artist, album
//! and duration, normalised by the weight of the fields that apply to the
//! pair. Album and duration only corroborate: when either side lacks them the
//! field drops out of the denominator instead of counting against the pair.
//!
//! | Field    | Weight | Full credit            | Partial credit                    |
//! |----------|--------|------------------------|-----------------------------------|
//! | name     | 0.5    | equal (ignoring case)  | 0.8× when one contains the other  |
//! | artist   | 0.3    | equal (ignoring case)  | 0.8× when one contains the other  |
//! | album    | 0.1    | equal, both non-empty  | 0.8× when one contains the other  |
//! | duration | 0.1    | < 5% relative diff     | 0.8× under 10%, 0.5× under 20%    |

use crate::Track;

/// Per-field weights used by [`similarity`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub name: f64,
    pub artist: f64,
    pub album: f64,
    pub duration: f64,
}

/// The standard weight table.
pub const WEIGHTS: FieldWeights = FieldWeights {
    name: 0.5,
    artist: 0.3,
    album: 0.1,
    duration: 0.1,
};

/// Fraction of a field's weight awarded for substring containment.
pub const PARTIAL_CREDIT: f64 = 0.8;

/// Duration tiers: (relative difference strictly below, credit fraction).
const DURATION_TIERS: [(f64, f64); 3] = [(0.05, 1.0), (0.10, 0.8), (0.20, 0.5)];

/// Breakdown of a similarity computation, useful for logging and tuning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimilarityScore {
    /// Sum of credited weight
    pub credited: f64,
    /// Sum of weight for fields that applied to the pair
    pub applicable: f64,
}

impl SimilarityScore {
    /// The normalised score in `[0.0, 1.0]`; 0.0 when nothing applied.
    pub fn value(&self) -> f64 {
        if self.applicable > 0.0 {
            self.credited / self.applicable
        } else {
            0.0
        }
    }

    fn add(&mut self, weight: f64, fraction: Option<f64>) {
        if let Some(fraction) = fraction {
            self.applicable += weight;
            if fraction >= 1.0 {
                self.credited += weight;
            } else if fraction > 0.0 {
                self.credited += weight * fraction;
            }
        }
    }
}

/// Credit fraction for two text values: 1.0 equal, 0.8 containment, else 0.
fn text_credit(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        1.0
    } else if a.contains(&b) || b.contains(&a) {
        PARTIAL_CREDIT
    } else {
        0.0
    }
}

/// Album credit, or `None` when either album is missing.
fn album_credit(a: &str, b: &str) -> Option<f64> {
    if a.trim().is_empty() || b.trim().is_empty() {
        return None;
    }
    Some(text_credit(a, b))
}

/// Duration credit, or `None` when either duration is unknown.
fn duration_credit(a_ms: u64, b_ms: u64) -> Option<f64> {
    if a_ms == 0 || b_ms == 0 {
        return None;
    }

    let diff = a_ms.abs_diff(b_ms) as f64 / a_ms.max(b_ms) as f64;
    let credit = DURATION_TIERS
        .iter()
        .find(|(limit, _)| diff < *limit)
        .map_or(0.0, |(_, credit)| *credit);
    Some(credit)
}

/// Score every applicable field of `a` against `b`.
pub fn score_breakdown(a: &Track, b: &Track) -> SimilarityScore {
    let mut score = SimilarityScore::default();

    score.add(WEIGHTS.name, Some(text_credit(&a.name, &b.name)));
    score.add(WEIGHTS.artist, Some(text_credit(&a.artist, &b.artist)));
    score.add(WEIGHTS.album, album_credit(&a.album, &b.album));
    score.add(
        WEIGHTS.duration,
        duration_credit(a.duration_ms, b.duration_ms),
    );

    score
}

/// Confidence in `[0.0, 1.0]` that `a` and `b` denote the same recording.
///
/// Deterministic and free of I/O. A track scored against itself yields
/// exactly 1.0.
///
/// ```rust
/// use beatbridge::{similarity, Track};
///
/// let a = Track::new("Blinding Lights", "The Weeknd").with_duration_ms(200_000);
/// let b = Track::new("Blinding Lights", "The Weeknd").with_duration_ms(201_000);
/// assert!(similarity(&a, &b) >= 0.95);
///
/// let c = Track::new("Blinding Lights", "Drake").with_duration_ms(200_000);
/// assert!(similarity(&a, &c) < 0.8);
/// ```
pub fn similarity(a: &Track, b: &Track) -> f64 {
    score_breakdown(a, b).value()
}
