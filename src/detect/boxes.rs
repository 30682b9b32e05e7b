//! Streaming consolidation of marker runs into rectangular boxes.
//!
//! Runs arrive in raster order. Each open box remembers the last row it was
//! extended on; a box stays open while the next run's row is within
//! `max_spacing + 1` of that row. A run that touches several open boxes fuses
//! them into the oldest one.

use crate::detect::scanline::MarkerRun;
use crate::scratch::BoundedBuf;
use crate::trace::{trace_event, trace_warn};
use crate::util::Point;

/// Axis-aligned box around a marker region. All four edges are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerBox {
    /// Leftmost marker column.
    pub left: i32,
    /// Topmost marker row.
    pub top: i32,
    /// Rightmost marker column.
    pub right: i32,
    /// Bottom marker row.
    pub bottom: i32,
}

impl MarkerBox {
    /// Box covering exactly `run`.
    pub fn from_run(run: &MarkerRun) -> Self {
        Self {
            left: run.start,
            top: run.y,
            right: run.end - 1,
            bottom: run.y,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    /// Integer center (rounded toward the top-left).
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right).div_euclid(2),
            (self.top + self.bottom).div_euclid(2),
        )
    }

    /// True when `p` lies inside the box (edges included).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &MarkerBox) -> MarkerBox {
        MarkerBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    fn grow_to_run(&mut self, run: &MarkerRun) {
        self.left = self.left.min(run.start);
        self.right = self.right.max(run.end - 1);
        self.top = self.top.min(run.y);
        self.bottom = self.bottom.max(run.y);
    }
}

/// Box under construction.
#[derive(Clone, Copy, Debug)]
pub struct OpenBox {
    rect: MarkerBox,
    last_row: i32,
    alive: bool,
}

/// Outcome of box building.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoxBuild {
    /// Boxes written to the output.
    pub boxes: usize,
    /// Runs that could not open a new box because the box buffer was full.
    pub dropped_runs: usize,
    /// True when at least one run was dropped.
    pub truncated: bool,
}

/// Horizontal pixel gap between a run and a box's column range (negative on overlap).
#[inline]
fn column_gap(rect: &MarkerBox, run: &MarkerRun) -> i32 {
    (run.start - rect.right - 1).max(rect.left - run.end)
}

/// Drops slots absorbed by a fusion and renumbers `active` to match.
///
/// `active` holds live slot indices in ascending order; compaction keeps the
/// slot order, so the oldest box stays first.
fn compact_open_boxes(open: &mut BoundedBuf<OpenBox>, active: &mut [u32]) {
    let mut cursor = 0usize;
    let mut live = 0u32;
    for (i, slot) in open.as_slice().iter().enumerate() {
        if !slot.alive {
            continue;
        }
        if cursor < active.len() && active[cursor] == i as u32 {
            active[cursor] = live;
            cursor += 1;
        }
        live += 1;
    }
    open.retain(|slot| slot.alive);
}

/// Builds marker boxes from `runs` (which must be in raster order).
///
/// `open` and `active` are working storage; `out` receives the finished boxes
/// in creation order. Slots freed by fusing are reclaimed before a new box is
/// opened. When `open` still holds `capacity` live boxes, runs that would
/// start a new box are dropped and counted.
pub fn build_marker_boxes(
    runs: &[MarkerRun],
    max_spacing: i32,
    open: &mut BoundedBuf<OpenBox>,
    active: &mut Vec<u32>,
    out: &mut BoundedBuf<MarkerBox>,
) -> BoxBuild {
    open.clear();
    active.clear();
    out.clear();
    let mut build = BoxBuild::default();
    let mut current_row = i32::MIN;

    for run in runs {
        if run.y != current_row {
            current_row = run.y;
            let slots = open.as_slice();
            active.retain(|&i| run.y - slots[i as usize].last_row - 1 <= max_spacing);
        }

        // The oldest touching box absorbs the run and every other touching box.
        let slots = open.as_mut_slice();
        let mut target: Option<u32> = None;
        for &i in active.iter() {
            let slot = &slots[i as usize];
            if column_gap(&slot.rect, run) <= max_spacing {
                target = Some(target.map_or(i, |t| t.min(i)));
            }
        }

        match target {
            Some(t) => {
                let mut merged = slots[t as usize];
                merged.rect.grow_to_run(run);
                merged.last_row = run.y;
                for &i in active.iter() {
                    if i == t {
                        continue;
                    }
                    let other = slots[i as usize];
                    if column_gap(&other.rect, run) <= max_spacing {
                        merged.rect = merged.rect.union(&other.rect);
                        merged.last_row = merged.last_row.max(other.last_row);
                        slots[i as usize].alive = false;
                    }
                }
                slots[t as usize] = merged;
                active.retain(|&i| slots[i as usize].alive);
            }
            None => {
                if open.is_full() {
                    compact_open_boxes(open, active);
                }
                let index = open.len() as u32;
                let opened = open.push(OpenBox {
                    rect: MarkerBox::from_run(run),
                    last_row: run.y,
                    alive: true,
                });
                if opened {
                    active.push(index);
                } else {
                    build.dropped_runs += 1;
                }
            }
        }
    }

    for slot in open.as_slice().iter().filter(|slot| slot.alive) {
        if out.push(slot.rect) {
            build.boxes += 1;
        }
    }

    if build.dropped_runs > 0 {
        build.truncated = true;
        trace_warn!(
            "marker_box_capacity_exhausted",
            capacity = open.capacity(),
            dropped_runs = build.dropped_runs
        );
    }
    trace_event!("marker_boxes", count = build.boxes);
    build
}

#[cfg(test)]
mod tests {
    use super::{build_marker_boxes, MarkerBox};
    use crate::detect::scanline::MarkerRun;
    use crate::scratch::BoundedBuf;

    fn run(y: i32, start: i32, end: i32) -> MarkerRun {
        MarkerRun { y, start, end }
    }

    fn boxes_of(runs: &[MarkerRun], spacing: i32, capacity: usize) -> (Vec<MarkerBox>, bool) {
        let mut open = BoundedBuf::with_capacity("marker boxes", capacity).unwrap();
        let mut active = Vec::with_capacity(capacity);
        let mut out = BoundedBuf::with_capacity("marker boxes", capacity).unwrap();
        let build = build_marker_boxes(runs, spacing, &mut open, &mut active, &mut out);
        (out.as_slice().to_vec(), build.truncated)
    }

    #[test]
    fn stacks_overlapping_rows() {
        let runs = [run(3, 10, 15), run(4, 11, 16), run(5, 9, 14)];
        let (boxes, truncated) = boxes_of(&runs, 0, 4);
        assert!(!truncated);
        assert_eq!(
            boxes,
            vec![MarkerBox {
                left: 9,
                top: 3,
                right: 15,
                bottom: 5
            }]
        );
        assert_eq!(boxes[0].center(), super::Point::new(12, 4));
    }

    #[test]
    fn separates_distant_columns_and_rows() {
        let runs = [
            run(0, 0, 4),
            run(0, 20, 24),
            run(1, 0, 4),
            run(1, 20, 24),
            run(9, 0, 4),
        ];
        let (boxes, _) = boxes_of(&runs, 2, 8);
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0].bottom, 1);
        assert_eq!(boxes[2].top, 9);
    }

    #[test]
    fn bridging_run_fuses_boxes_into_oldest() {
        // Two legs of a "U" joined by a bottom bar.
        let runs = [
            run(0, 0, 3),
            run(0, 10, 13),
            run(1, 0, 3),
            run(1, 10, 13),
            run(2, 0, 13),
        ];
        let (boxes, _) = boxes_of(&runs, 1, 4);
        assert_eq!(
            boxes,
            vec![MarkerBox {
                left: 0,
                top: 0,
                right: 12,
                bottom: 2
            }]
        );
    }

    #[test]
    fn full_buffer_drops_new_boxes() {
        let runs = [run(0, 0, 3), run(0, 10, 13), run(0, 20, 23), run(1, 21, 24)];
        let (boxes, truncated) = boxes_of(&runs, 0, 2);
        assert!(truncated);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[1].left, 10);
    }

    #[test]
    fn fused_slots_are_reused() {
        // A "U" rail whose legs fuse on row 2, then a second rail further down.
        let runs = [
            run(0, 0, 3),
            run(0, 10, 13),
            run(1, 0, 3),
            run(1, 10, 13),
            run(2, 0, 13),
            run(10, 0, 13),
            run(11, 0, 13),
        ];
        let (boxes, truncated) = boxes_of(&runs, 1, 2);
        assert!(!truncated);
        assert_eq!(
            boxes,
            vec![
                MarkerBox {
                    left: 0,
                    top: 0,
                    right: 12,
                    bottom: 2
                },
                MarkerBox {
                    left: 0,
                    top: 10,
                    right: 12,
                    bottom: 11
                },
            ]
        );
    }
}
