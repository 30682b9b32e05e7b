//! Error types for barcode-finder.

use thiserror::Error;

/// Result alias for barcode-finder operations.
pub type BarCodeResult<T> = std::result::Result<T, BarCodeError>;

/// Broad category of a [`BarCodeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An object could not be constructed; nothing was returned.
    Construction,
    /// An index or handle did not refer to live data.
    Access,
    /// Reading an image from disk failed.
    Io,
}

/// Errors that can occur when constructing or querying finder objects.
///
/// Running out of scratch capacity during a find call is not an error; it is
/// reported through [`crate::FindReport`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BarCodeError {
    /// A pattern was empty or longer than the supported maximum.
    #[error("pattern must hold between 1 and {max} colors, got {len}")]
    InvalidPatternLength { len: usize, max: usize },
    /// A character in a pattern string is not one of `R`, `G`, `B`.
    #[error("unrecognized color character {0:?}, expected 'R', 'G', or 'B'")]
    InvalidColorChar(char),
    /// Patterns registered in one context set differ in length.
    #[error("pattern {index} has {got} colors, expected {expected} like the first pattern")]
    MismatchedPatternLength {
        expected: usize,
        got: usize,
        index: usize,
    },
    /// A buffer capacity of zero was requested.
    #[error("capacity for {name} must be at least 1, got {requested}")]
    InvalidCapacity { name: &'static str, requested: usize },
    /// A buffer could not be reserved.
    #[error("failed to allocate {requested} entries for {name}")]
    AllocationFailed { name: &'static str, requested: usize },
    /// Image dimensions are zero or do not fit pixel coordinates.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride (in pixels) is smaller than the image width.
    #[error("invalid stride: width {width}, stride {stride}")]
    InvalidStride { width: usize, stride: usize },
    /// The pixel buffer is shorter than the dimensions require.
    #[error("buffer too small: needed {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A parameter is outside its valid range.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// An index is past the end of a collection.
    #[error("index {index} out of bounds for {context} (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// The object was released and can no longer be used.
    #[error("{0} has been released")]
    Released(&'static str),
    /// A context handle was issued by a different context set.
    #[error("context handle belongs to a different context set")]
    ForeignHandle,
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}

impl BarCodeError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexOutOfBounds { .. } | Self::Released(_) | Self::ForeignHandle => {
                ErrorKind::Access
            }
            #[cfg(feature = "image-io")]
            Self::ImageIo { .. } => ErrorKind::Io,
            _ => ErrorKind::Construction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BarCodeError, ErrorKind};

    #[test]
    fn kinds_follow_taxonomy() {
        let released = BarCodeError::Released("context set");
        assert_eq!(released.kind(), ErrorKind::Access);

        let oob = BarCodeError::IndexOutOfBounds {
            index: 3,
            len: 3,
            context: "appearance",
        };
        assert_eq!(oob.kind(), ErrorKind::Access);

        let bad = BarCodeError::MismatchedPatternLength {
            expected: 3,
            got: 4,
            index: 1,
        };
        assert_eq!(bad.kind(), ErrorKind::Construction);
    }

    #[test]
    fn messages_name_the_problem() {
        let err = BarCodeError::InvalidPatternLength { len: 26, max: 25 };
        assert_eq!(
            err.to_string(),
            "pattern must hold between 1 and 25 colors, got 26"
        );
    }
}
