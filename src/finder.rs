//! The find entry point.
//!
//! One call scans the image once (runs, boxes, rail pairs, sampling) and then
//! selects appearances for every context of the set from the shared staging
//! buffer. Capacity shortfalls never fail the call; they show up in the
//! returned [`FindReport`].

use crate::candidate::select::select_appearances;
use crate::context::ContextSet;
use crate::detect::boxes::build_marker_boxes;
use crate::detect::classify::DetectionConfig;
use crate::detect::rails::{pair_rails, sample_rail_pairs};
use crate::detect::scanline::find_marker_runs;
use crate::image::RgbaView;
use crate::scratch::{ScratchCapacities, TemporaryMemory};
use crate::trace::{trace_event, trace_span};
use crate::util::{BarCodeError, BarCodeResult};

/// Default number of non-marker pixels bridged inside a marker region.
pub const DEFAULT_MAX_YELLOW_SPACING: u32 = 5;

/// Stage counts and truncation flags of one find call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FindReport {
    /// Marker runs found by the scan.
    pub marker_runs: usize,
    /// The scan-line buffer filled and the scan stopped early.
    pub runs_truncated: bool,
    /// Marker boxes built from the runs.
    pub marker_boxes: usize,
    /// Runs that could not open a box because the box buffer was full.
    pub dropped_box_runs: usize,
    /// The marker box buffer filled.
    pub boxes_truncated: bool,
    /// Plausible rail pairs.
    pub rail_pairs: usize,
    /// The temporary index buffer filled; remaining pairs were not explored.
    pub pairs_truncated: bool,
    /// Rail pairs with a colorful segment, staged for every pattern.
    pub sampled_candidates: usize,
    /// The appearance staging buffer filled.
    pub staging_truncated: bool,
    /// At least one context overflowed the sort buffer.
    pub sort_truncated: bool,
}

impl FindReport {
    /// True when any scratch buffer ran out of room.
    pub fn is_truncated(&self) -> bool {
        self.runs_truncated
            || self.boxes_truncated
            || self.pairs_truncated
            || self.staging_truncated
            || self.sort_truncated
    }
}

/// Finds every pattern of `contexts` in `image`.
///
/// Replaces the appearances of every context. `max_yellow_spacing` is the
/// largest gap of non-marker pixels bridged inside one marker region.
///
/// # Errors
///
/// Fails only if `contexts` or `scratch` has been released, or if
/// `max_yellow_spacing` does not fit pixel coordinates. The image is never
/// modified.
pub fn find(
    image: RgbaView<'_>,
    cfg: &DetectionConfig,
    contexts: &mut ContextSet,
    max_yellow_spacing: u32,
    scratch: &mut TemporaryMemory,
) -> BarCodeResult<FindReport> {
    contexts.ensure_live()?;
    scratch.ensure_live()?;
    let spacing = i32::try_from(max_yellow_spacing)
        .map_err(|_| BarCodeError::InvalidInput("max_yellow_spacing too large"))?;
    let sections = contexts.section_count()?;
    let context_count = contexts.context_count()?;

    let _span = trace_span!(
        "find",
        width = image.width(),
        height = image.height(),
        contexts = context_count
    )
    .entered();

    scratch.reset();
    let mut report = FindReport::default();
    if sections == 0 || context_count == 0 {
        return Ok(report);
    }

    let scan = find_marker_runs(image, cfg, spacing, &mut scratch.runs);
    report.marker_runs = scan.runs;
    report.runs_truncated = scan.truncated;

    let build = build_marker_boxes(
        scratch.runs.as_slice(),
        spacing,
        &mut scratch.open_boxes,
        &mut scratch.active,
        &mut scratch.boxes,
    );
    report.marker_boxes = build.boxes;
    report.dropped_box_runs = build.dropped_runs;
    report.boxes_truncated = build.truncated;

    let paired = pair_rails(scratch.boxes.as_slice(), sections, &mut scratch.pairs);
    report.rail_pairs = paired.count;
    report.pairs_truncated = paired.truncated;

    let sampled = sample_rail_pairs(
        image,
        cfg,
        scratch.boxes.as_slice(),
        scratch.pairs.as_slice(),
        sections,
        &mut scratch.staging,
    );
    report.sampled_candidates = sampled.count;
    report.staging_truncated = sampled.truncated;

    let staged = scratch.staging.as_slice();
    for (index, ctx) in contexts.contexts_mut().iter_mut().enumerate() {
        if staged.is_empty() {
            ctx.clear_appearances();
            continue;
        }
        let stats = select_appearances(staged, ctx.pattern(), ctx.options(), &mut scratch.sort);
        report.sort_truncated |= stats.sort_dropped > 0;
        ctx.replace_appearances(staged, scratch.sort.as_slice(), stats);
        trace_event!(
            "appearances",
            context = index,
            count = ctx.appearance_count(),
            duplicates = stats.duplicates
        );
    }

    Ok(report)
}

/// A finder owning its scratch memory.
///
/// Run one `Finder` per thread; `find` borrows it mutably, so a single
/// instance cannot serve two calls at once.
#[derive(Debug)]
pub struct Finder {
    scratch: TemporaryMemory,
}

impl Finder {
    /// Reserves scratch memory with the given capacities.
    pub fn new(capacities: ScratchCapacities) -> BarCodeResult<Self> {
        Ok(Self {
            scratch: TemporaryMemory::new(capacities)?,
        })
    }

    /// Runs [`find`] with this finder's scratch memory.
    pub fn find(
        &mut self,
        image: RgbaView<'_>,
        cfg: &DetectionConfig,
        contexts: &mut ContextSet,
        max_yellow_spacing: u32,
    ) -> BarCodeResult<FindReport> {
        find(image, cfg, contexts, max_yellow_spacing, &mut self.scratch)
    }

    /// Capacities of the owned scratch memory.
    pub fn capacities(&self) -> ScratchCapacities {
        self.scratch.capacities()
    }

    /// Frees the scratch memory. Later calls to [`Finder::find`] fail.
    pub fn release(&mut self) {
        self.scratch.release();
    }

    /// True once [`Finder::release`] has run.
    pub fn is_released(&self) -> bool {
        self.scratch.is_released()
    }
}

#[cfg(test)]
mod tests {
    use super::{find, Finder, DEFAULT_MAX_YELLOW_SPACING};
    use crate::context::ContextSet;
    use crate::detect::classify::DetectionConfig;
    use crate::image::OwnedRgbaImage;
    use crate::pattern::Pattern;
    use crate::scratch::{ScratchCapacities, TemporaryMemory};
    use crate::util::BarCodeError;

    #[test]
    fn released_scratch_is_rejected() {
        let img = OwnedRgbaImage::filled(8, 8, [0, 0, 0]).unwrap();
        let pattern: Pattern = "RGB".parse().unwrap();
        let mut set = ContextSet::new(&[pattern], 0.5, 8, 4).unwrap();
        let mut scratch = TemporaryMemory::new(ScratchCapacities::default()).unwrap();
        scratch.release();
        let err = find(
            img.view(),
            &DetectionConfig::default(),
            &mut set,
            DEFAULT_MAX_YELLOW_SPACING,
            &mut scratch,
        )
        .unwrap_err();
        assert_eq!(err, BarCodeError::Released("temporary memory"));
    }

    #[test]
    fn empty_set_is_a_no_op() {
        let img = OwnedRgbaImage::filled(8, 8, [255, 230, 0]).unwrap();
        let mut set = ContextSet::new(&[], 0.5, 8, 4).unwrap();
        let mut finder = Finder::new(ScratchCapacities::default()).unwrap();
        let report = finder
            .find(img.view(), &DetectionConfig::default(), &mut set, 5)
            .unwrap();
        assert_eq!(report.marker_runs, 0);
    }
}
