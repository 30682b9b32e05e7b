//! Low-level building blocks for custom detection pipelines.
//!
//! These expose the individual stages that [`crate::find`] chains together.
//! Most users should prefer `find` or `Finder`; the stages are useful when
//! inspecting intermediate results (marker runs, boxes, rail pairs) or when
//! feeding boxes from another source into the sampler.

pub use crate::candidate::score::match_score;
pub use crate::candidate::select::{select_appearances, Scored, SelectionStats};
pub use crate::detect::boxes::{build_marker_boxes, BoxBuild, OpenBox};
pub use crate::detect::rails::{
    colorful_segment, is_plausible_pair, pair_rails, sample_rail_pairs, sample_sections,
    RailPair, SampledCandidate, StageCount,
};
pub use crate::detect::scanline::{find_marker_runs, RunScan, MIN_RUN_WIDTH};
pub use crate::scratch::BoundedBuf;
pub use crate::util::{segment_distance, LineWalker};
