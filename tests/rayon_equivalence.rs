#![cfg(feature = "rayon")]

use barcode_finder::{
    find_batch_par, Appearance, ContextSet, DetectionConfig, FindJob, Finder, OwnedRgbaImage,
    Pattern, ScratchCapacities,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PALETTE: [[u8; 3]; 5] = [
    [255, 230, 0],
    [220, 0, 0],
    [0, 200, 0],
    [0, 0, 200],
    [0, 0, 0],
];

fn make_scene(seed: u64) -> OwnedRgbaImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let (width, height) = (128usize, 96usize);
    let mut img = OwnedRgbaImage::filled(width, height, [0, 0, 0]).unwrap();
    for _ in 0..60 {
        let x0 = rng.random_range(0..width);
        let y0 = rng.random_range(0..height);
        let w = rng.random_range(2..16);
        let h = rng.random_range(2..16);
        let color = PALETTE[rng.random_range(0..PALETTE.len())];
        img.fill_rect(x0, y0, x0 + w, y0 + h, color);
    }
    img
}

fn make_set() -> ContextSet {
    let patterns: Vec<Pattern> = ["RGB", "BBR", "GRG"]
        .iter()
        .map(|p| p.parse().unwrap())
        .collect();
    ContextSet::new(&patterns, 0.6, 6, 8).unwrap()
}

fn snapshot(set: &ContextSet) -> Vec<Vec<Appearance>> {
    set.contexts()
        .unwrap()
        .map(|ctx| ctx.appearances().to_vec())
        .collect()
}

#[test]
fn parallel_batch_matches_sequential() {
    let images: Vec<OwnedRgbaImage> = (0..12).map(make_scene).collect();
    let cfg = DetectionConfig::default();
    let caps = ScratchCapacities::default();

    let mut finder = Finder::new(caps).unwrap();
    let mut sequential = Vec::with_capacity(images.len());
    for img in &images {
        let mut set = make_set();
        let report = finder.find(img.view(), &cfg, &mut set, 4).unwrap();
        sequential.push((report, snapshot(&set)));
    }

    let mut jobs: Vec<FindJob<'_>> = images
        .iter()
        .map(|img| FindJob::new(img.view(), make_set()))
        .collect();
    let reports = find_batch_par(&mut jobs, &cfg, 4, caps).unwrap();

    assert_eq!(reports.len(), images.len());
    for (i, (job, report)) in jobs.iter().zip(&reports).enumerate() {
        let (seq_report, seq_appearances) = &sequential[i];
        assert_eq!(report, seq_report, "image {i}");
        assert_eq!(&snapshot(&job.contexts), seq_appearances, "image {i}");
    }
}

#[test]
fn parallel_batch_propagates_released_sets() {
    let img = make_scene(99);
    let mut released = make_set();
    released.release();
    let mut jobs = vec![
        FindJob::new(img.view(), make_set()),
        FindJob::new(img.view(), released),
    ];
    let result = find_batch_par(
        &mut jobs,
        &DetectionConfig::default(),
        4,
        ScratchCapacities::default(),
    );
    assert!(result.is_err());
}
