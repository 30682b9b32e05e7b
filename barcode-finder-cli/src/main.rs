use barcode_finder::io::load_rgba_image;
use barcode_finder::{
    Appearance, ContextOptions, ContextSet, DetectionConfig, FindReport, Finder, MarkerBox,
    Pattern, ScratchCapacities, DEFAULT_MAX_YELLOW_SPACING,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Color bar code finder (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output (stage counts and truncation warnings).
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectionJson {
    max_red_green_separation: u8,
    min_red_blue_separation: u8,
    min_red: u8,
}

impl Default for DetectionJson {
    fn default() -> Self {
        let cfg = DetectionConfig::default();
        Self {
            max_red_green_separation: cfg.max_red_green_separation,
            min_red_blue_separation: cfg.min_red_blue_separation,
            min_red: cfg.min_red,
        }
    }
}

impl From<DetectionJson> for DetectionConfig {
    fn from(value: DetectionJson) -> Self {
        Self {
            max_red_green_separation: value.max_red_green_separation,
            min_red_blue_separation: value.min_red_blue_separation,
            min_red: value.min_red,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ContextJson {
    min_match_score: f32,
    min_line_distance: u32,
    appearance_capacity: usize,
    min_line_length: u32,
}

impl Default for ContextJson {
    fn default() -> Self {
        let opts = ContextOptions::default();
        Self {
            min_match_score: opts.min_match_score,
            min_line_distance: opts.min_line_distance,
            appearance_capacity: opts.appearance_capacity,
            min_line_length: opts.min_line_length,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScratchJson {
    scan_lines: usize,
    marker_boxes: usize,
    temp_indices: usize,
    appearance_staging: usize,
    appearance_sort: usize,
}

impl Default for ScratchJson {
    fn default() -> Self {
        let caps = ScratchCapacities::default();
        Self {
            scan_lines: caps.scan_lines,
            marker_boxes: caps.marker_boxes,
            temp_indices: caps.temp_indices,
            appearance_staging: caps.appearance_staging,
            appearance_sort: caps.appearance_sort,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    output_path: Option<String>,
    patterns: Vec<String>,
    max_yellow_spacing: u32,
    detection: DetectionJson,
    context: ContextJson,
    scratch: ScratchJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            output_path: None,
            patterns: Vec::new(),
            max_yellow_spacing: DEFAULT_MAX_YELLOW_SPACING,
            detection: DetectionJson::default(),
            context: ContextJson::default(),
            scratch: ScratchJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BoxRecord {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl From<MarkerBox> for BoxRecord {
    fn from(value: MarkerBox) -> Self {
        Self {
            left: value.left,
            top: value.top,
            right: value.right,
            bottom: value.bottom,
        }
    }
}

#[derive(Debug, Serialize)]
struct AppearanceRecord {
    score: f32,
    color_start: [i32; 2],
    color_end: [i32; 2],
    first_box: BoxRecord,
    second_box: BoxRecord,
    sampled: String,
}

impl From<&Appearance> for AppearanceRecord {
    fn from(value: &Appearance) -> Self {
        Self {
            score: value.score(),
            color_start: [value.color_start().x, value.color_start().y],
            color_end: [value.color_end().x, value.color_end().y],
            first_box: value.first_box().into(),
            second_box: value.second_box().into(),
            sampled: value.sampled().iter().map(|c| c.as_char()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PatternRecord {
    pattern: String,
    appearances: Vec<AppearanceRecord>,
}

#[derive(Debug, Serialize)]
struct ReportRecord {
    marker_runs: usize,
    marker_boxes: usize,
    rail_pairs: usize,
    sampled_candidates: usize,
    truncated: bool,
}

impl From<FindReport> for ReportRecord {
    fn from(value: FindReport) -> Self {
        Self {
            marker_runs: value.marker_runs,
            marker_boxes: value.marker_boxes,
            rail_pairs: value.rail_pairs,
            sampled_candidates: value.sampled_candidates,
            truncated: value.is_truncated(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    report: ReportRecord,
    patterns: Vec<PatternRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("barcode_finder=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }
    if config.patterns.is_empty() {
        return Err("patterns must list at least one pattern".into());
    }

    let patterns = config
        .patterns
        .iter()
        .map(|p| p.parse::<Pattern>())
        .collect::<Result<Vec<_>, _>>()?;
    let options = ContextOptions {
        min_match_score: config.context.min_match_score,
        min_line_distance: config.context.min_line_distance,
        appearance_capacity: config.context.appearance_capacity,
        min_line_length: config.context.min_line_length,
    };
    let mut contexts = ContextSet::with_options(&patterns, options)?;
    let mut finder = Finder::new(ScratchCapacities {
        scan_lines: config.scratch.scan_lines,
        marker_boxes: config.scratch.marker_boxes,
        temp_indices: config.scratch.temp_indices,
        appearance_staging: config.scratch.appearance_staging,
        appearance_sort: config.scratch.appearance_sort,
    })?;

    let image = load_rgba_image(&config.image_path)?;
    let detection: DetectionConfig = config.detection.into();
    let report = finder.find(
        image.view(),
        &detection,
        &mut contexts,
        config.max_yellow_spacing,
    )?;
    if report.is_truncated() {
        tracing::warn!(?report, "scratch capacity exhausted; results may be incomplete");
    }

    let mut records = Vec::with_capacity(patterns.len());
    for ctx in contexts.contexts()? {
        records.push(PatternRecord {
            pattern: ctx.pattern().to_string(),
            appearances: ctx.appearances().iter().map(AppearanceRecord::from).collect(),
        });
    }
    let output = Output {
        report: report.into(),
        patterns: records,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
