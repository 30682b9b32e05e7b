//! Rayon-parallel batch find (feature-gated).
//!
//! Each worker thread builds its own [`TemporaryMemory`] once and reuses it
//! for every job it picks up, so no scratch buffer is ever shared.

use crate::context::ContextSet;
use crate::detect::classify::DetectionConfig;
use crate::finder::{find, FindReport};
use crate::image::RgbaView;
use crate::scratch::{ScratchCapacities, TemporaryMemory};
use crate::util::BarCodeResult;
use rayon::prelude::*;

/// One image with the contexts to populate from it.
#[derive(Debug)]
pub struct FindJob<'a> {
    pub image: RgbaView<'a>,
    pub contexts: ContextSet,
}

impl<'a> FindJob<'a> {
    pub fn new(image: RgbaView<'a>, contexts: ContextSet) -> Self {
        Self { image, contexts }
    }
}

/// Runs [`find`] on every job in parallel.
///
/// Reports are returned in job order. Results are identical to running the
/// jobs one after another with the same capacities.
pub fn find_batch_par(
    jobs: &mut [FindJob<'_>],
    cfg: &DetectionConfig,
    max_yellow_spacing: u32,
    capacities: ScratchCapacities,
) -> BarCodeResult<Vec<FindReport>> {
    jobs.par_iter_mut()
        .map_init(
            || TemporaryMemory::new(capacities),
            |scratch, job| {
                let scratch = scratch.as_mut().map_err(|err| err.clone())?;
                find(job.image, cfg, &mut job.contexts, max_yellow_spacing, scratch)
            },
        )
        .collect()
}
