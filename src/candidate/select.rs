//! Per-pattern selection: threshold, near-duplicate suppression, best-K.
//!
//! Qualifying candidates are collected in the sort buffer; when it is full a
//! new candidate replaces the lowest scorer if it scores strictly higher.
//! The buffer is then ranked by descending score
//! (ties keep discovery order). They are then accepted greedily: a candidate
//! whose segment lies within `min_line_distance` of an accepted one is a
//! duplicate, and once `appearance_capacity` candidates are accepted the rest
//! are dropped. The survivors are put back into discovery order.

use crate::candidate::score::match_score;
use crate::context::ContextOptions;
use crate::detect::rails::SampledCandidate;
use crate::pattern::Pattern;
use crate::scratch::BoundedBuf;
use crate::trace::trace_warn;
use crate::util::segment_distance;
use std::cmp::Ordering;

/// A staged candidate index with its score for one pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    /// Index into the staging buffer.
    pub index: u32,
    /// Match score for the pattern.
    pub score: f32,
}

fn scored_cmp_desc(a: &Scored, b: &Scored) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}

/// Bookkeeping from one selection pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Candidates that met the score and length thresholds.
    pub qualified: usize,
    /// Qualifying candidates lost to a full sort buffer (the lowest scorers).
    pub sort_dropped: usize,
    /// Candidates suppressed as near-duplicates.
    pub duplicates: usize,
    /// Distinct candidates dropped because the context was full.
    pub over_capacity: usize,
}

impl SelectionStats {
    /// True when a buffer limit cost this context candidates.
    pub fn truncated(&self) -> bool {
        self.sort_dropped > 0 || self.over_capacity > 0
    }
}

/// Ranks `staged` for `pattern` and leaves the accepted entries in `sort`,
/// ordered by staging index.
pub fn select_appearances(
    staged: &[SampledCandidate],
    pattern: &Pattern,
    options: &ContextOptions,
    sort: &mut BoundedBuf<Scored>,
) -> SelectionStats {
    sort.clear();
    let mut stats = SelectionStats::default();
    let min_length = options.min_line_length as f32;

    for (index, candidate) in staged.iter().enumerate() {
        if candidate.segment_length() < min_length {
            continue;
        }
        let score = match_score(candidate.colors(), pattern);
        if score < options.min_match_score {
            continue;
        }
        stats.qualified += 1;
        let entry = Scored {
            index: index as u32,
            score,
        };
        if !sort.is_full() {
            sort.push(entry);
            continue;
        }
        // Full: the new entry only displaces the current worst on a strictly
        // higher score. Either way one candidate is lost.
        stats.sort_dropped += 1;
        let worst = sort
            .as_mut_slice()
            .iter_mut()
            .max_by(|a, b| scored_cmp_desc(a, b));
        if let Some(worst) = worst {
            if score > worst.score {
                *worst = entry;
            }
        }
    }

    let min_distance = options.min_line_distance as f32;
    let entries = sort.as_mut_slice();
    entries.sort_unstable_by(scored_cmp_desc);

    let mut kept = 0usize;
    for r in 0..entries.len() {
        let cand = &staged[entries[r].index as usize];
        let segment = (cand.color_start, cand.color_end);
        let duplicate = entries[..kept].iter().any(|k| {
            let other = &staged[k.index as usize];
            segment_distance(segment, (other.color_start, other.color_end)) <= min_distance
        });
        if duplicate {
            stats.duplicates += 1;
            continue;
        }
        if kept == options.appearance_capacity {
            stats.over_capacity += 1;
            continue;
        }
        entries.swap(kept, r);
        kept += 1;
    }
    sort.truncate(kept);
    sort.as_mut_slice().sort_unstable_by_key(|s| s.index);

    if stats.sort_dropped > 0 {
        trace_warn!(
            "appearance_sort_capacity_exhausted",
            capacity = sort.capacity(),
            dropped = stats.sort_dropped
        );
    }
    stats
}
