//! Per-pattern result storage.
//!
//! A [`ContextSet`] owns one [`FindContext`] per registered pattern. All
//! patterns in a set have the same length, so a single scan of an image
//! serves every context. Contexts are read either by borrowing them through
//! [`ContextSet::context`] or through a copyable [`ContextHandle`], which is
//! validated against the owning set on every access. Once a set is released,
//! every accessor fails with [`BarCodeError::Released`].

use crate::candidate::select::{Scored, SelectionStats};
use crate::detect::boxes::MarkerBox;
use crate::detect::rails::SampledCandidate;
use crate::pattern::{Color, Pattern, MAX_PATTERN_LEN};
use crate::util::{BarCodeError, BarCodeResult, Point};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// One accepted detection of a pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    first_box: MarkerBox,
    second_box: MarkerBox,
    color_start: Point,
    color_end: Point,
    score: f32,
    sampled: [Color; MAX_PATTERN_LEN],
    len: u8,
}

impl Appearance {
    fn from_candidate(candidate: &SampledCandidate, score: f32) -> Self {
        let (sampled, len) = candidate.colors_array();
        Self {
            first_box: candidate.first_box,
            second_box: candidate.second_box,
            color_start: candidate.color_start,
            color_end: candidate.color_end,
            score,
            sampled,
            len,
        }
    }

    /// The rail the sampled segment starts from.
    pub fn first_box(&self) -> MarkerBox {
        self.first_box
    }

    /// The rail the sampled segment ends at.
    pub fn second_box(&self) -> MarkerBox {
        self.second_box
    }

    /// First colorful pixel of the segment.
    pub fn color_start(&self) -> Point {
        self.color_start
    }

    /// Last colorful pixel of the segment.
    pub fn color_end(&self) -> Point {
        self.color_end
    }

    /// Fraction of sections matching the pattern, in `[0, 1]`.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Colors read along the segment, one per section.
    pub fn sampled(&self) -> &[Color] {
        &self.sampled[..self.len as usize]
    }
}

/// Per-context tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextOptions {
    /// Candidates scoring below this are discarded.
    pub min_match_score: f32,
    /// Candidates whose segment is within this many pixels of an accepted one
    /// are near-duplicates.
    pub min_line_distance: u32,
    /// Maximum appearances kept per find call.
    pub appearance_capacity: usize,
    /// Segments shorter than this many pixels are ignored. Zero disables the filter.
    pub min_line_length: u32,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            min_match_score: 0.1,
            min_line_distance: 8,
            appearance_capacity: 16,
            min_line_length: 0,
        }
    }
}

impl ContextOptions {
    fn validate(&self) -> BarCodeResult<()> {
        if self.min_match_score.is_nan() {
            return Err(BarCodeError::InvalidInput("min_match_score must not be NaN"));
        }
        if self.appearance_capacity == 0 {
            return Err(BarCodeError::InvalidCapacity {
                name: "appearances",
                requested: 0,
            });
        }
        Ok(())
    }
}

/// Lifecycle of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// Registered; no find call has run yet.
    Ready,
    /// Holds the appearances of the latest find call.
    Populated,
    /// The owning set was released.
    Released,
}

/// One pattern with its bounded appearance list.
#[derive(Debug)]
pub struct FindContext {
    pattern: Pattern,
    options: ContextOptions,
    appearances: Vec<Appearance>,
    stats: SelectionStats,
    state: ContextState,
}

impl FindContext {
    fn new(pattern: Pattern, options: ContextOptions) -> BarCodeResult<Self> {
        let mut appearances = Vec::new();
        appearances
            .try_reserve_exact(options.appearance_capacity)
            .map_err(|_| BarCodeError::AllocationFailed {
                name: "appearances",
                requested: options.appearance_capacity,
            })?;
        Ok(Self {
            pattern,
            options,
            appearances,
            stats: SelectionStats::default(),
            state: ContextState::Ready,
        })
    }

    /// The target pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Tunables this context was registered with.
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// `Ready` until the first find call, `Populated` afterwards.
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Number of appearances from the latest find call.
    pub fn appearance_count(&self) -> usize {
        self.appearances.len()
    }

    /// Appearance at `index`, in discovery order.
    pub fn appearance(&self, index: usize) -> BarCodeResult<&Appearance> {
        self.appearances
            .get(index)
            .ok_or(BarCodeError::IndexOutOfBounds {
                index,
                len: self.appearances.len(),
                context: "appearances",
            })
    }

    /// All appearances in discovery order.
    pub fn appearances(&self) -> &[Appearance] {
        &self.appearances
    }

    /// Selection bookkeeping from the latest find call.
    pub fn selection_stats(&self) -> SelectionStats {
        self.stats
    }

    pub(crate) fn replace_appearances(
        &mut self,
        staged: &[SampledCandidate],
        kept: &[Scored],
        stats: SelectionStats,
    ) {
        self.appearances.clear();
        for entry in kept.iter().take(self.options.appearance_capacity) {
            if let Some(candidate) = staged.get(entry.index as usize) {
                self.appearances
                    .push(Appearance::from_candidate(candidate, entry.score));
            }
        }
        self.stats = stats;
        self.state = ContextState::Populated;
    }

    pub(crate) fn clear_appearances(&mut self) {
        self.appearances.clear();
        self.stats = SelectionStats::default();
        self.state = ContextState::Populated;
    }
}

/// Copyable reference to a context inside a [`ContextSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextHandle {
    set_id: u64,
    index: usize,
}

impl ContextHandle {
    /// Position of the context in its set.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Contexts sharing one scan of an image.
#[derive(Debug)]
pub struct ContextSet {
    id: u64,
    contexts: Vec<FindContext>,
    section_count: usize,
    released: bool,
}

impl ContextSet {
    /// Registers `patterns` with shared tunables.
    ///
    /// Fails without allocating if the patterns differ in length, the score
    /// threshold is NaN, or the capacity is zero.
    pub fn new(
        patterns: &[Pattern],
        min_match_score: f32,
        min_line_distance: u32,
        appearance_capacity: usize,
    ) -> BarCodeResult<Self> {
        Self::with_options(
            patterns,
            ContextOptions {
                min_match_score,
                min_line_distance,
                appearance_capacity,
                ..ContextOptions::default()
            },
        )
    }

    /// Registers `patterns`, each with a copy of `options`.
    pub fn with_options(patterns: &[Pattern], options: ContextOptions) -> BarCodeResult<Self> {
        options.validate()?;
        let section_count = patterns.first().map_or(0, Pattern::len);
        for (index, pattern) in patterns.iter().enumerate() {
            if pattern.len() != section_count {
                return Err(BarCodeError::MismatchedPatternLength {
                    expected: section_count,
                    got: pattern.len(),
                    index,
                });
            }
        }

        let mut contexts = Vec::new();
        contexts
            .try_reserve_exact(patterns.len())
            .map_err(|_| BarCodeError::AllocationFailed {
                name: "contexts",
                requested: patterns.len(),
            })?;
        for pattern in patterns {
            contexts.push(FindContext::new(pattern.clone(), options)?);
        }

        Ok(Self {
            id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
            contexts,
            section_count,
            released: false,
        })
    }

    /// Number of registered contexts.
    pub fn context_count(&self) -> BarCodeResult<usize> {
        self.ensure_live()?;
        Ok(self.contexts.len())
    }

    /// Pattern length shared by every context.
    pub fn section_count(&self) -> BarCodeResult<usize> {
        self.ensure_live()?;
        Ok(self.section_count)
    }

    /// Borrows the context at `index`.
    pub fn context(&self, index: usize) -> BarCodeResult<&FindContext> {
        self.ensure_live()?;
        self.contexts
            .get(index)
            .ok_or(BarCodeError::IndexOutOfBounds {
                index,
                len: self.contexts.len(),
                context: "contexts",
            })
    }

    /// Iterates over all contexts in registration order.
    pub fn contexts(&self) -> BarCodeResult<impl Iterator<Item = &FindContext>> {
        self.ensure_live()?;
        Ok(self.contexts.iter())
    }

    /// Issues a handle for the context at `index`.
    pub fn handle(&self, index: usize) -> BarCodeResult<ContextHandle> {
        self.context(index)?;
        Ok(ContextHandle {
            set_id: self.id,
            index,
        })
    }

    /// Handles for every context in registration order.
    pub fn handles(&self) -> BarCodeResult<Vec<ContextHandle>> {
        self.ensure_live()?;
        Ok((0..self.contexts.len())
            .map(|index| ContextHandle {
                set_id: self.id,
                index,
            })
            .collect())
    }

    fn resolve(&self, handle: ContextHandle) -> BarCodeResult<&FindContext> {
        if handle.set_id != self.id {
            return Err(BarCodeError::ForeignHandle);
        }
        self.context(handle.index)
    }

    /// Number of appearances held by the context behind `handle`.
    pub fn appearance_count(&self, handle: ContextHandle) -> BarCodeResult<usize> {
        Ok(self.resolve(handle)?.appearance_count())
    }

    /// Appearance `index` of the context behind `handle`.
    pub fn appearance(&self, handle: ContextHandle, index: usize) -> BarCodeResult<&Appearance> {
        self.resolve(handle)?.appearance(index)
    }

    /// Pattern of the context behind `handle`.
    pub fn pattern(&self, handle: ContextHandle) -> BarCodeResult<&Pattern> {
        Ok(self.resolve(handle)?.pattern())
    }

    /// Lifecycle state of the context behind `handle`.
    ///
    /// Unlike the other accessors this answers [`ContextState::Released`]
    /// after [`ContextSet::release`] instead of failing.
    pub fn state(&self, handle: ContextHandle) -> BarCodeResult<ContextState> {
        if handle.set_id != self.id {
            return Err(BarCodeError::ForeignHandle);
        }
        if self.released {
            return Ok(ContextState::Released);
        }
        Ok(self.context(handle.index)?.state())
    }

    /// Drops every context and its appearances. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.contexts = Vec::new();
        self.released = true;
    }

    /// True once [`ContextSet::release`] has run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn ensure_live(&self) -> BarCodeResult<()> {
        if self.released {
            Err(BarCodeError::Released("context set"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn contexts_mut(&mut self) -> &mut [FindContext] {
        &mut self.contexts
    }
}
