//! Candidate scoring and selection.
//!
//! Includes the per-pattern match score and bounded best-K selection with
//! near-duplicate suppression.

pub mod score;
pub mod select;
