//! Bar code colors and target patterns.
//!
//! A [`Pattern`] is the ordered color sequence a bar code carries between its
//! two marker rails. Patterns are immutable; equality and hashing compare the
//! color sequence element by element.

use crate::util::{BarCodeError, BarCodeResult};
use std::fmt;
use std::str::FromStr;

/// The maximum number of colors a pattern may hold.
pub const MAX_PATTERN_LEN: usize = 25;

/// A bar code section color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl Color {
    /// Parses `R`, `G` or `B` (case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'R' | 'r' => Some(Self::Red),
            'G' | 'g' => Some(Self::Green),
            'B' | 'b' => Some(Self::Blue),
            _ => None,
        }
    }

    /// Single-letter code of the color.
    pub fn as_char(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Green => 'G',
            Self::Blue => 'B',
        }
    }

    /// Returns the strongest channel of a pixel.
    ///
    /// Ties resolve in the order Red, Green, Blue, so a gray pixel reads as red.
    #[inline]
    pub fn dominant(r: u8, g: u8, b: u8) -> Self {
        if r >= g && r >= b {
            Self::Red
        } else if g >= b {
            Self::Green
        } else {
            Self::Blue
        }
    }
}

/// Ordered sequence of 1 to [`MAX_PATTERN_LEN`] colors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    colors: Box<[Color]>,
}

impl Pattern {
    /// Creates a pattern, rejecting empty or over-long sequences.
    pub fn new(colors: impl Into<Vec<Color>>) -> BarCodeResult<Self> {
        let colors = colors.into();
        if colors.is_empty() || colors.len() > MAX_PATTERN_LEN {
            return Err(BarCodeError::InvalidPatternLength {
                len: colors.len(),
                max: MAX_PATTERN_LEN,
            });
        }
        Ok(Self {
            colors: colors.into_boxed_slice(),
        })
    }

    /// Number of colors (sections).
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; patterns hold at least one color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The color sequence.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color at `index`.
    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    /// Iterates over the colors in order.
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.colors.iter().copied()
    }
}

impl FromStr for Pattern {
    type Err = BarCodeError;

    fn from_str(s: &str) -> BarCodeResult<Self> {
        let colors = s
            .chars()
            .map(|c| Color::from_char(c).ok_or(BarCodeError::InvalidColorChar(c)))
            .collect::<BarCodeResult<Vec<_>>>()?;
        Self::new(colors)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in self.iter() {
            write!(f, "{}", color.as_char())?;
        }
        Ok(())
    }
}

impl TryFrom<&[Color]> for Pattern {
    type Error = BarCodeError;

    fn try_from(colors: &[Color]) -> BarCodeResult<Self> {
        Self::new(colors.to_vec())
    }
}
