//! Marker detection stages: pixel classification, scanline runs, boxes, rails.
//!
//! Each stage reads the previous stage's output from a scratch buffer and
//! writes its own into another, so a find call allocates nothing.

pub mod boxes;
pub mod classify;
pub mod rails;
pub mod scanline;
