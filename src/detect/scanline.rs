//! Row-wise aggregation of marker pixels into runs.

use crate::detect::classify::{marker_mask8, DetectionConfig, BLOCK};
use crate::image::{RgbaView, CHANNELS};
use crate::scratch::BoundedBuf;
use crate::trace::{trace_event, trace_warn};

/// Runs narrower than this many pixels are treated as noise.
pub const MIN_RUN_WIDTH: i32 = 2;

/// Horizontal span of marker pixels on one row, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerRun {
    /// Row of the run.
    pub y: i32,
    /// First marker pixel.
    pub start: i32,
    /// One past the last marker pixel.
    pub end: i32,
}

impl MarkerRun {
    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.end - self.start
    }
}

/// Outcome of a run scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunScan {
    /// Runs written to the buffer.
    pub runs: usize,
    /// Rows fully scanned before the buffer filled.
    pub rows_scanned: usize,
    /// True when the buffer filled and the scan stopped early.
    pub truncated: bool,
}

/// Open run state while walking a row.
struct RowState {
    y: i32,
    max_gap: i32,
    start: i32,
    last: i32,
    open: bool,
}

impl RowState {
    /// Feeds one pixel; returns a finished run when a gap grows too large.
    #[inline]
    fn feed(&mut self, x: i32, marker: bool) -> Option<MarkerRun> {
        if marker {
            if self.open && x - self.last - 1 <= self.max_gap {
                self.last = x;
                return None;
            }
            let finished = self.close();
            self.start = x;
            self.last = x;
            self.open = true;
            finished
        } else if self.open && x - self.last > self.max_gap {
            self.close()
        } else {
            None
        }
    }

    #[inline]
    fn close(&mut self) -> Option<MarkerRun> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(MarkerRun {
            y: self.y,
            start: self.start,
            end: self.last + 1,
        })
    }
}

/// Scans every row of `image` and fills `out` with marker runs in raster order.
///
/// Gaps of up to `max_spacing` non-marker pixels inside a run are bridged.
/// Runs narrower than [`MIN_RUN_WIDTH`] are discarded. When `out` fills, the
/// scan stops and the result is flagged as truncated.
pub fn find_marker_runs(
    image: RgbaView<'_>,
    cfg: &DetectionConfig,
    max_spacing: i32,
    out: &mut BoundedBuf<MarkerRun>,
) -> RunScan {
    out.clear();
    let width = image.width();
    let block_end = width / BLOCK * BLOCK;
    let mut scan = RunScan::default();

    for y in 0..image.height() {
        let Some(row) = image.row(y) else {
            break;
        };
        let mut state = RowState {
            y: y as i32,
            max_gap: max_spacing,
            start: 0,
            last: 0,
            open: false,
        };

        let mut x = 0usize;
        while x < block_end {
            let mask = marker_mask8(&row[x * CHANNELS..(x + BLOCK) * CHANNELS], cfg);
            if mask == 0 && !state.open {
                // Common case: nothing yellow and no run to extend.
                x += BLOCK;
                continue;
            }
            for i in 0..BLOCK {
                let marker = mask & (1 << i) != 0;
                if let Some(run) = state.feed((x + i) as i32, marker) {
                    if !emit(run, out, &mut scan) {
                        return finish_truncated(scan, y, out);
                    }
                }
            }
            x += BLOCK;
        }
        while x < width {
            let marker = cfg.is_marker_rgba(&row[x * CHANNELS..]);
            if let Some(run) = state.feed(x as i32, marker) {
                if !emit(run, out, &mut scan) {
                    return finish_truncated(scan, y, out);
                }
            }
            x += 1;
        }
        if let Some(run) = state.close() {
            if !emit(run, out, &mut scan) {
                return finish_truncated(scan, y, out);
            }
        }
        scan.rows_scanned = y + 1;
    }

    trace_event!("marker_runs", count = scan.runs);
    scan
}

/// Stores `run` if it is wide enough. Returns false once the buffer is full.
#[inline]
fn emit(run: MarkerRun, out: &mut BoundedBuf<MarkerRun>, scan: &mut RunScan) -> bool {
    if run.width() < MIN_RUN_WIDTH {
        return true;
    }
    if out.push(run) {
        scan.runs += 1;
        true
    } else {
        false
    }
}

fn finish_truncated(mut scan: RunScan, row: usize, out: &BoundedBuf<MarkerRun>) -> RunScan {
    scan.truncated = true;
    scan.rows_scanned = row;
    trace_warn!(
        "scan_line_capacity_exhausted",
        capacity = out.capacity(),
        row = row
    );
    scan
}
