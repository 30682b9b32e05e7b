//! Locates color bar codes in RGBA images.
//!
//! A bar code is a row (or column) of up to [`MAX_PATTERN_LEN`] red, green
//! and blue sections framed by two yellow marker rails. A single [`find`] call
//! classifies marker pixels, groups them into runs and boxes, pairs boxes into
//! rails, samples the colors between each pair and scores the result against
//! every [`Pattern`] registered in a [`ContextSet`].
//!
//! All working memory lives in a [`TemporaryMemory`] reserved up front. When a
//! buffer fills, the call drops work instead of growing it and reports this in
//! the returned [`FindReport`].
//!
//! ```
//! use barcode_finder::{
//!     find, ContextSet, DetectionConfig, OwnedRgbaImage, Pattern, ScratchCapacities,
//!     TemporaryMemory,
//! };
//!
//! let image = OwnedRgbaImage::filled(64, 64, [0, 0, 0])?;
//! let pattern: Pattern = "RGB".parse()?;
//! let mut contexts = ContextSet::new(&[pattern], 0.9, 8, 16)?;
//! let mut scratch = TemporaryMemory::new(ScratchCapacities::default())?;
//!
//! find(image.view(), &DetectionConfig::default(), &mut contexts, 5, &mut scratch)?;
//! assert_eq!(contexts.context(0)?.appearance_count(), 0);
//! # Ok::<(), barcode_finder::BarCodeError>(())
//! ```
//!
//! Optional features: `simd` (8-pixel marker classification via `wide`),
//! `rayon` (parallel batch find), `image-io` (file loading via `image`) and
//! `tracing` (stage spans and events).

mod candidate;
pub mod context;
mod detect;
mod finder;
pub mod image;
pub mod lowlevel;
#[cfg(feature = "rayon")]
pub mod par;
pub mod pattern;
mod scratch;
mod trace;
pub mod util;

pub use context::{
    Appearance, ContextHandle, ContextOptions, ContextSet, ContextState, FindContext,
};
pub use detect::boxes::MarkerBox;
pub use detect::classify::DetectionConfig;
pub use detect::scanline::MarkerRun;
pub use finder::{find, FindReport, Finder, DEFAULT_MAX_YELLOW_SPACING};
pub use crate::image::{OwnedRgbaImage, RgbaView};
pub use pattern::{Color, Pattern, MAX_PATTERN_LEN};
pub use scratch::{ScratchCapacities, TemporaryMemory};
pub use util::{BarCodeError, BarCodeResult, ErrorKind, Point};

#[cfg(feature = "image-io")]
pub use crate::image::io;
#[cfg(feature = "rayon")]
pub use par::{find_batch_par, FindJob};
