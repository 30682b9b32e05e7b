//! Shared utility helpers.

pub mod error;
pub mod math;

pub use error::{BarCodeError, BarCodeResult, ErrorKind};
pub use math::{segment_distance, LineWalker, Point};
