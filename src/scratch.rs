//! Pre-sized scratch buffers reused across find calls.
//!
//! Every buffer is reserved once at construction and never grows. Writes past
//! the reserved capacity are refused and counted instead of reallocating, so a
//! find call either fits its budget or degrades by dropping work, never by
//! allocating.

use crate::candidate::select::Scored;
use crate::detect::boxes::{MarkerBox, OpenBox};
use crate::detect::rails::{RailPair, SampledCandidate};
use crate::detect::scanline::MarkerRun;
use crate::util::{BarCodeError, BarCodeResult};

/// Fixed-capacity buffer with soft overflow.
#[derive(Debug)]
pub struct BoundedBuf<T> {
    items: Vec<T>,
    capacity: usize,
    rejected: usize,
}

impl<T> BoundedBuf<T> {
    /// Reserves room for exactly `capacity` items.
    pub fn with_capacity(name: &'static str, capacity: usize) -> BarCodeResult<Self> {
        if capacity == 0 {
            return Err(BarCodeError::InvalidCapacity {
                name,
                requested: capacity,
            });
        }
        let mut items = Vec::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| BarCodeError::AllocationFailed {
                name,
                requested: capacity,
            })?;
        Ok(Self {
            items,
            capacity,
            rejected: 0,
        })
    }

    /// A released buffer that accepts nothing.
    pub(crate) fn empty() -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
            rejected: 0,
        }
    }

    /// Appends `item` if there is room; otherwise counts it as rejected.
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() < self.capacity {
            self.items.push(item);
            true
        } else {
            self.rejected += 1;
            false
        }
    }

    /// Removes all items and resets the rejection counter.
    pub fn clear(&mut self) {
        self.items.clear();
        self.rejected = 0;
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when the next push would be rejected.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Number of pushes refused since the last clear.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Stored items in insertion order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}

/// Sizes of the scratch buffers owned by a [`TemporaryMemory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScratchCapacities {
    /// Marker runs for a whole image (roughly rows times markers per row).
    pub scan_lines: usize,
    /// Marker boxes, about twice the expected bar codes plus noise.
    pub marker_boxes: usize,
    /// Candidate rail pairs considered per image.
    pub temp_indices: usize,
    /// Sampled candidates shared by all patterns of one find call.
    pub appearance_staging: usize,
    /// Qualifying candidates ranked per pattern.
    pub appearance_sort: usize,
}

impl Default for ScratchCapacities {
    fn default() -> Self {
        Self {
            scan_lines: 1080 * 16,
            marker_boxes: 512 * 16,
            temp_indices: 512 * 16,
            appearance_staging: 512 * 16,
            appearance_sort: 512,
        }
    }
}

/// Scratch memory for one finder.
///
/// A `TemporaryMemory` is reused across find calls and must only serve one
/// call at a time; `find` takes it by `&mut` to enforce that.
#[derive(Debug)]
pub struct TemporaryMemory {
    capacities: ScratchCapacities,
    pub(crate) runs: BoundedBuf<MarkerRun>,
    pub(crate) open_boxes: BoundedBuf<OpenBox>,
    pub(crate) active: Vec<u32>,
    pub(crate) boxes: BoundedBuf<MarkerBox>,
    pub(crate) pairs: BoundedBuf<RailPair>,
    pub(crate) staging: BoundedBuf<SampledCandidate>,
    pub(crate) sort: BoundedBuf<Scored>,
    released: bool,
}

impl TemporaryMemory {
    /// Reserves every buffer up front.
    pub fn new(capacities: ScratchCapacities) -> BarCodeResult<Self> {
        let runs = BoundedBuf::with_capacity("scan lines", capacities.scan_lines)?;
        let open_boxes = BoundedBuf::with_capacity("marker boxes", capacities.marker_boxes)?;
        let boxes = BoundedBuf::with_capacity("marker boxes", capacities.marker_boxes)?;
        let mut active = Vec::new();
        active
            .try_reserve_exact(capacities.marker_boxes)
            .map_err(|_| BarCodeError::AllocationFailed {
                name: "marker boxes",
                requested: capacities.marker_boxes,
            })?;
        let pairs = BoundedBuf::with_capacity("temporary indices", capacities.temp_indices)?;
        let staging =
            BoundedBuf::with_capacity("appearance staging", capacities.appearance_staging)?;
        let sort = BoundedBuf::with_capacity("appearance sort buffer", capacities.appearance_sort)?;

        Ok(Self {
            capacities,
            runs,
            open_boxes,
            active,
            boxes,
            pairs,
            staging,
            sort,
            released: false,
        })
    }

    /// Capacities this memory was built with.
    pub fn capacities(&self) -> ScratchCapacities {
        self.capacities
    }

    /// Frees every buffer. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.runs = BoundedBuf::empty();
        self.open_boxes = BoundedBuf::empty();
        self.active = Vec::new();
        self.boxes = BoundedBuf::empty();
        self.pairs = BoundedBuf::empty();
        self.staging = BoundedBuf::empty();
        self.sort = BoundedBuf::empty();
        self.released = true;
    }

    /// True once [`TemporaryMemory::release`] has run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn ensure_live(&self) -> BarCodeResult<()> {
        if self.released {
            Err(BarCodeError::Released("temporary memory"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn reset(&mut self) {
        self.runs.clear();
        self.open_boxes.clear();
        self.active.clear();
        self.boxes.clear();
        self.pairs.clear();
        self.staging.clear();
        self.sort.clear();
    }
}
