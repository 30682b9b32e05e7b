//! Starved scratch buffers degrade by dropping work, never by failing.

use barcode_finder::{
    find, ContextSet, DetectionConfig, FindReport, OwnedRgbaImage, Pattern, ScratchCapacities,
    TemporaryMemory,
};

const YELLOW: [u8; 3] = [255, 230, 0];
const RED: [u8; 3] = [220, 0, 0];
const GREEN: [u8; 3] = [0, 200, 0];
const BLUE: [u8; 3] = [0, 0, 200];

/// Two 20px tall RGB codes, the second below and right of the first.
fn scene() -> OwnedRgbaImage {
    let mut img = OwnedRgbaImage::filled(200, 120, [0, 0, 0]).unwrap();
    for (x0, y0) in [(20usize, 20usize), (110, 80)] {
        let y1 = y0 + 19;
        img.fill_rect(x0, y0, x0 + 9, y1, YELLOW);
        img.fill_rect(x0 + 10, y0, x0 + 19, y1, RED);
        img.fill_rect(x0 + 20, y0, x0 + 29, y1, GREEN);
        img.fill_rect(x0 + 30, y0, x0 + 39, y1, BLUE);
        img.fill_rect(x0 + 40, y0, x0 + 49, y1, YELLOW);
    }
    img
}

/// A vertical RGB code whose top rail starts as two legs that join lower down.
fn forked_rail_scene() -> OwnedRgbaImage {
    let mut img = OwnedRgbaImage::filled(80, 80, [0, 0, 0]).unwrap();
    img.fill_rect(20, 10, 24, 13, YELLOW);
    img.fill_rect(35, 10, 39, 13, YELLOW);
    img.fill_rect(20, 14, 39, 19, YELLOW);
    img.fill_rect(20, 20, 39, 29, RED);
    img.fill_rect(20, 30, 39, 39, GREEN);
    img.fill_rect(20, 40, 39, 49, BLUE);
    img.fill_rect(20, 50, 39, 59, YELLOW);
    img
}

/// A rail pair with nothing but black between it, above and right of an RGB code.
fn decoy_then_code_scene() -> OwnedRgbaImage {
    let mut img = OwnedRgbaImage::filled(200, 120, [0, 0, 0]).unwrap();
    img.fill_rect(100, 5, 109, 14, YELLOW);
    img.fill_rect(140, 5, 149, 14, YELLOW);
    img.fill_rect(20, 80, 29, 99, YELLOW);
    img.fill_rect(30, 80, 39, 99, RED);
    img.fill_rect(40, 80, 49, 99, GREEN);
    img.fill_rect(50, 80, 59, 99, BLUE);
    img.fill_rect(60, 80, 69, 99, YELLOW);
    img
}

fn run(capacities: ScratchCapacities, appearance_capacity: usize) -> (FindReport, ContextSet) {
    run_on(&scene(), capacities, 0.99, appearance_capacity)
}

fn run_on(
    img: &OwnedRgbaImage,
    capacities: ScratchCapacities,
    min_match_score: f32,
    appearance_capacity: usize,
) -> (FindReport, ContextSet) {
    let pattern: Pattern = "RGB".parse().unwrap();
    let mut set = ContextSet::new(&[pattern], min_match_score, 8, appearance_capacity).unwrap();
    let mut scratch = TemporaryMemory::new(capacities).unwrap();
    let report = find(
        img.view(),
        &DetectionConfig::default(),
        &mut set,
        5,
        &mut scratch,
    )
    .unwrap();
    (report, set)
}

fn appearance_count(set: &ContextSet) -> usize {
    set.context(0).unwrap().appearance_count()
}

#[test]
fn default_capacities_do_not_truncate() {
    let (report, set) = run(ScratchCapacities::default(), 16);
    assert!(!report.is_truncated());
    assert_eq!(report.marker_runs, 80);
    assert_eq!(report.marker_boxes, 4);
    assert_eq!(report.rail_pairs, 2);
    assert_eq!(report.sampled_candidates, 2);
    assert_eq!(appearance_count(&set), 2);
}

#[test]
fn scan_line_buffer_stops_the_scan() {
    let caps = ScratchCapacities {
        scan_lines: 4,
        ..ScratchCapacities::default()
    };
    let (report, set) = run(caps, 16);
    assert!(report.runs_truncated);
    assert!(report.is_truncated());
    assert_eq!(report.marker_runs, 4);
    assert!(appearance_count(&set) <= 1);
}

#[test]
fn box_buffer_drops_new_boxes() {
    let caps = ScratchCapacities {
        marker_boxes: 1,
        ..ScratchCapacities::default()
    };
    let (report, set) = run(caps, 16);
    assert!(report.boxes_truncated);
    assert_eq!(report.marker_boxes, 1);
    assert_eq!(report.dropped_box_runs, 60);
    assert_eq!(report.rail_pairs, 0);
    assert_eq!(appearance_count(&set), 0);
}

#[test]
fn temp_index_buffer_limits_pairs() {
    let caps = ScratchCapacities {
        temp_indices: 1,
        ..ScratchCapacities::default()
    };
    let (report, set) = run(caps, 16);
    assert!(report.pairs_truncated);
    assert_eq!(report.rail_pairs, 1);
    assert_eq!(appearance_count(&set), 1);
}

#[test]
fn staging_buffer_limits_candidates() {
    let caps = ScratchCapacities {
        appearance_staging: 1,
        ..ScratchCapacities::default()
    };
    let (report, set) = run(caps, 16);
    assert!(report.staging_truncated);
    assert_eq!(report.sampled_candidates, 1);
    assert_eq!(appearance_count(&set), 1);
}

#[test]
fn sort_buffer_limits_ranking() {
    let caps = ScratchCapacities {
        appearance_sort: 1,
        ..ScratchCapacities::default()
    };
    let (report, set) = run(caps, 16);
    assert!(report.sort_truncated);
    let ctx = set.context(0).unwrap();
    assert_eq!(ctx.appearance_count(), 1);
    assert_eq!(ctx.selection_stats().sort_dropped, 1);
    assert_eq!(ctx.appearance(0).unwrap().first_box().left, 20);
}

#[test]
fn context_capacity_caps_appearances() {
    let (report, set) = run(ScratchCapacities::default(), 1);
    assert!(!report.is_truncated());
    let ctx = set.context(0).unwrap();
    assert_eq!(ctx.appearance_count(), 1);
    assert_eq!(ctx.selection_stats().over_capacity, 1);
    assert!(ctx.selection_stats().truncated());
}

#[test]
fn fused_box_fragments_free_their_slots() {
    let caps = ScratchCapacities {
        marker_boxes: 2,
        ..ScratchCapacities::default()
    };
    let (report, set) = run_on(&forked_rail_scene(), caps, 0.99, 16);
    assert!(!report.boxes_truncated);
    assert_eq!(report.dropped_box_runs, 0);
    assert_eq!(report.marker_boxes, 2);

    let ctx = set.context(0).unwrap();
    assert_eq!(ctx.appearance_count(), 1);
    let found = ctx.appearance(0).unwrap();
    assert_eq!(found.score(), 1.0);
    assert_eq!(found.first_box().top, 10);
    assert_eq!(found.first_box().bottom, 19);
    assert_eq!(found.second_box().top, 50);
}

#[test]
fn full_sort_buffer_prefers_higher_scores() {
    let caps = ScratchCapacities {
        appearance_sort: 1,
        ..ScratchCapacities::default()
    };
    let (report, set) = run_on(&decoy_then_code_scene(), caps, 0.3, 2);
    assert_eq!(report.sampled_candidates, 2);
    assert!(report.sort_truncated);

    let ctx = set.context(0).unwrap();
    assert_eq!(ctx.appearance_count(), 1);
    let found = ctx.appearance(0).unwrap();
    assert_eq!(found.score(), 1.0);
    assert_eq!(found.first_box().left, 20);
    assert_eq!(ctx.selection_stats().sort_dropped, 1);
}
