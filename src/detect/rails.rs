//! Rail pairing and color sampling.
//!
//! Two marker boxes form a rail pair when they sit side by side (row ranges
//! overlap) or one above the other (column ranges overlap) with enough room
//! between their facing edges for one pixel per section. The colorful
//! segment between the rails is found by walking the line joining the box
//! centers, and each section is read at its midpoint along that segment.

use crate::detect::boxes::MarkerBox;
use crate::detect::classify::DetectionConfig;
use crate::image::RgbaView;
use crate::pattern::{Color, MAX_PATTERN_LEN};
use crate::scratch::BoundedBuf;
use crate::trace::{trace_event, trace_warn};
use crate::util::math::lerp_point;
use crate::util::{LineWalker, Point};

/// Indices of two marker boxes forming a candidate rail pair (`first < second`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RailPair {
    /// Index of the earlier box.
    pub first: u32,
    /// Index of the later box.
    pub second: u32,
}

/// A rail pair with its sampled color sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledCandidate {
    /// The first rail.
    pub first_box: MarkerBox,
    /// The second rail.
    pub second_box: MarkerBox,
    /// First colorful pixel after leaving the first rail.
    pub color_start: Point,
    /// Last colorful pixel before reaching the second rail.
    pub color_end: Point,
    colors: [Color; MAX_PATTERN_LEN],
    len: u8,
}

impl SampledCandidate {
    pub(crate) fn new(
        first_box: MarkerBox,
        second_box: MarkerBox,
        color_start: Point,
        color_end: Point,
        sampled: &[Color],
    ) -> Self {
        let len = sampled.len().min(MAX_PATTERN_LEN);
        let mut colors = [Color::Red; MAX_PATTERN_LEN];
        colors[..len].copy_from_slice(&sampled[..len]);
        Self {
            first_box,
            second_box,
            color_start,
            color_end,
            colors,
            len: len as u8,
        }
    }

    /// The sampled colors, one per section.
    pub fn colors(&self) -> &[Color] {
        &self.colors[..self.len as usize]
    }

    /// Euclidean length of the colorful segment.
    pub fn segment_length(&self) -> f32 {
        self.color_start.distance(self.color_end)
    }

    pub(crate) fn colors_array(&self) -> ([Color; MAX_PATTERN_LEN], u8) {
        (self.colors, self.len)
    }
}

/// Outcome of a pairing or sampling pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageCount {
    /// Items written.
    pub count: usize,
    /// True when the output buffer filled.
    pub truncated: bool,
}

/// Pixel gap between the facing edges of two inclusive ranges (negative on overlap).
#[inline]
fn range_gap(a0: i32, a1: i32, b0: i32, b1: i32) -> i32 {
    (b0 - a1 - 1).max(a0 - b1 - 1)
}

/// Returns true when `a` and `b` can frame a bar code of `sections` colors.
pub fn is_plausible_pair(a: &MarkerBox, b: &MarkerBox, sections: usize) -> bool {
    let rows_overlap = range_gap(a.top, a.bottom, b.top, b.bottom) < 0;
    let cols_overlap = range_gap(a.left, a.right, b.left, b.right) < 0;
    let needed = sections as i32;
    match (rows_overlap, cols_overlap) {
        (true, false) => range_gap(a.left, a.right, b.left, b.right) >= needed,
        (false, true) => range_gap(a.top, a.bottom, b.top, b.bottom) >= needed,
        _ => false,
    }
}

/// Enumerates plausible pairs `i < j` of `boxes` into `out`.
///
/// Stops once `out` is full; the remaining pairs are not explored.
pub fn pair_rails(
    boxes: &[MarkerBox],
    sections: usize,
    out: &mut BoundedBuf<RailPair>,
) -> StageCount {
    out.clear();
    let mut stage = StageCount::default();
    'outer: for (i, a) in boxes.iter().enumerate() {
        for (j, b) in boxes.iter().enumerate().skip(i + 1) {
            if !is_plausible_pair(a, b, sections) {
                continue;
            }
            if !out.push(RailPair {
                first: i as u32,
                second: j as u32,
            }) {
                stage.truncated = true;
                break 'outer;
            }
            stage.count += 1;
        }
    }
    if stage.truncated {
        trace_warn!(
            "temp_index_capacity_exhausted",
            capacity = out.capacity(),
            pairs = stage.count
        );
    }
    trace_event!("rail_pairs", count = stage.count);
    stage
}

/// Finds the colorful part of the line joining the centers of two rails.
///
/// Pixels inside either rail box are skipped. The start is the first
/// non-marker pixel after leaving `first`; the end is the last non-marker
/// pixel before reaching `second` or a trailing marker region. Stray marker
/// pixels in between do not end the segment early.
pub fn colorful_segment(
    image: RgbaView<'_>,
    cfg: &DetectionConfig,
    first: &MarkerBox,
    second: &MarkerBox,
) -> Option<(Point, Point)> {
    let mut start = None;
    let mut end = None;
    let mut prev = first.center();
    let mut in_color = false;

    for p in LineWalker::new(first.center(), second.center()) {
        if first.contains(p) {
            continue;
        }
        if second.contains(p) {
            break;
        }
        let [r, g, b] = image.rgb_at(p)?;
        if cfg.is_marker(r, g, b) {
            if in_color {
                end = Some(prev);
                in_color = false;
            }
        } else if !in_color {
            if start.is_none() {
                start = Some(p);
            }
            in_color = true;
        }
        prev = p;
    }
    if in_color {
        end = Some(prev);
    }

    match (start, end) {
        (Some(s), Some(e)) if s != e => Some((s, e)),
        _ => None,
    }
}

/// Reads `sections` evenly spaced colors along `start -> end`.
pub fn sample_sections(
    image: RgbaView<'_>,
    start: Point,
    end: Point,
    sections: usize,
) -> Option<[Color; MAX_PATTERN_LEN]> {
    let mut colors = [Color::Red; MAX_PATTERN_LEN];
    let n = sections.min(MAX_PATTERN_LEN);
    for (i, slot) in colors.iter_mut().enumerate().take(n) {
        let t = (i as f32 + 0.5) / n as f32;
        let [r, g, b] = image.rgb_at(lerp_point(start, end, t))?;
        *slot = Color::dominant(r, g, b);
    }
    Some(colors)
}

/// Samples every rail pair and stages the results in `out`.
pub fn sample_rail_pairs(
    image: RgbaView<'_>,
    cfg: &DetectionConfig,
    boxes: &[MarkerBox],
    pairs: &[RailPair],
    sections: usize,
    out: &mut BoundedBuf<SampledCandidate>,
) -> StageCount {
    out.clear();
    let mut stage = StageCount::default();
    let n = sections.min(MAX_PATTERN_LEN);

    for pair in pairs {
        let (Some(first_box), Some(second_box)) =
            (boxes.get(pair.first as usize), boxes.get(pair.second as usize))
        else {
            continue;
        };
        let Some((color_start, color_end)) = colorful_segment(image, cfg, first_box, second_box)
        else {
            continue;
        };
        if (color_start.steps_to(color_end) as usize) < n {
            continue;
        }
        let Some(colors) = sample_sections(image, color_start, color_end, n) else {
            continue;
        };

        let candidate =
            SampledCandidate::new(*first_box, *second_box, color_start, color_end, &colors[..n]);
        if !out.push(candidate) {
            stage.truncated = true;
            break;
        }
        stage.count += 1;
    }

    if stage.truncated {
        trace_warn!(
            "appearance_staging_capacity_exhausted",
            capacity = out.capacity(),
            staged = stage.count
        );
    }
    trace_event!("sampled_candidates", count = stage.count);
    stage
}

#[cfg(test)]
mod tests {
    use super::{colorful_segment, is_plausible_pair, sample_sections};
    use crate::detect::boxes::MarkerBox;
    use crate::detect::classify::DetectionConfig;
    use crate::image::OwnedRgbaImage;
    use crate::pattern::Color;
    use crate::util::Point;

    const YELLOW: [u8; 3] = [255, 230, 0];

    fn rect(left: i32, top: i32, right: i32, bottom: i32) -> MarkerBox {
        MarkerBox {
            left,
            top,
            right,
            bottom,
        }
    }

    #[test]
    fn plausibility_needs_alignment_and_room() {
        let a = rect(0, 10, 9, 29);
        assert!(is_plausible_pair(&a, &rect(40, 15, 49, 35), 3));
        assert!(is_plausible_pair(&a, &rect(2, 60, 8, 70), 3));
        assert!(!is_plausible_pair(&a, &rect(40, 60, 49, 70), 3), "diagonal");
        assert!(!is_plausible_pair(&a, &rect(12, 10, 20, 29), 3), "too close");
        assert!(!is_plausible_pair(&a, &rect(5, 20, 20, 40), 3), "overlapping");
    }

    #[test]
    fn facing_gap_must_reach_section_count() {
        let a = rect(0, 10, 9, 29);
        // Columns 10..=12 lie between the rails: exactly three pixels.
        assert!(is_plausible_pair(&a, &rect(13, 10, 22, 29), 3));
        assert!(!is_plausible_pair(&a, &rect(12, 10, 21, 29), 3));
        // Rows 30..=32 lie between the rails.
        assert!(is_plausible_pair(&a, &rect(0, 33, 9, 40), 3));
        assert!(!is_plausible_pair(&a, &rect(0, 32, 9, 40), 3));
        // The order of the boxes does not matter.
        assert!(is_plausible_pair(&rect(13, 10, 22, 29), &a, 3));
    }

    #[test]
    fn segment_skips_rails_and_stray_markers() {
        let mut img = OwnedRgbaImage::filled(40, 3, [10, 10, 200]).unwrap();
        img.fill_rect(0, 0, 4, 2, YELLOW);
        img.fill_rect(20, 1, 20, 1, YELLOW);
        img.fill_rect(35, 0, 39, 2, YELLOW);
        let cfg = DetectionConfig::default();
        let seg = colorful_segment(img.view(), &cfg, &rect(0, 0, 4, 2), &rect(35, 0, 39, 2));
        assert_eq!(seg, Some((Point::new(5, 1), Point::new(34, 1))));
    }

    #[test]
    fn all_marker_line_has_no_segment() {
        let img = OwnedRgbaImage::filled(10, 1, YELLOW).unwrap();
        let cfg = DetectionConfig::default();
        let seg = colorful_segment(img.view(), &cfg, &rect(0, 0, 1, 0), &rect(8, 0, 9, 0));
        assert_eq!(seg, None);
    }

    #[test]
    fn holes_inside_a_rail_are_not_colorful() {
        let mut img = OwnedRgbaImage::filled(40, 3, [10, 10, 200]).unwrap();
        img.fill_rect(0, 0, 9, 2, YELLOW);
        img.fill_rect(3, 0, 5, 2, [0, 0, 0]);
        img.fill_rect(30, 0, 39, 2, YELLOW);
        let cfg = DetectionConfig::default();
        let seg = colorful_segment(img.view(), &cfg, &rect(0, 0, 9, 2), &rect(30, 0, 39, 2));
        assert_eq!(seg, Some((Point::new(10, 1), Point::new(29, 1))));
    }

    #[test]
    fn samples_section_midpoints() {
        let mut img = OwnedRgbaImage::filled(30, 1, [0, 0, 0]).unwrap();
        img.fill_rect(0, 0, 9, 0, [200, 20, 20]);
        img.fill_rect(10, 0, 19, 0, [20, 200, 20]);
        img.fill_rect(20, 0, 29, 0, [20, 20, 200]);
        let colors = sample_sections(img.view(), Point::new(0, 0), Point::new(29, 0), 3).unwrap();
        assert_eq!(&colors[..3], &[Color::Red, Color::Green, Color::Blue]);
    }
}
