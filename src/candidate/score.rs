//! Match scoring between sampled colors and a target pattern.

use crate::pattern::{Color, Pattern};

/// Fraction of sections whose sampled color equals the pattern color.
///
/// Returns a value in `[0, 1]`; `1.0` is an exact match. Sequences of a
/// different length than the pattern score `0.0`.
pub fn match_score(sampled: &[Color], pattern: &Pattern) -> f32 {
    if sampled.len() != pattern.len() {
        return 0.0;
    }
    let hits = sampled
        .iter()
        .zip(pattern.colors())
        .filter(|(seen, want)| seen == want)
        .count();
    hits as f32 / pattern.len() as f32
}
