//! Marker ("yellow") pixel classification.
//!
//! A pixel is a marker pixel when its red channel is bright, its green channel
//! is close to red, and blue is clearly below red. The block helpers classify
//! eight RGBA pixels at once; with the `simd` feature they use `wide` lanes.

/// Number of pixels classified per block.
pub const BLOCK: usize = 8;

/// Thresholds defining the marker-pixel predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DetectionConfig {
    /// Largest allowed `|R - G|`.
    pub max_red_green_separation: u8,
    /// Smallest allowed `R - B`.
    pub min_red_blue_separation: u8,
    /// Smallest allowed red value.
    pub min_red: u8,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_red_green_separation: 45,
            min_red_blue_separation: 50,
            min_red: 170,
        }
    }
}

impl DetectionConfig {
    /// Returns true when `(r, g, b)` is a marker pixel.
    #[inline]
    pub fn is_marker(&self, r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        (r - g).abs() <= self.max_red_green_separation as i32
            && r - b >= self.min_red_blue_separation as i32
            && r >= self.min_red as i32
    }

    /// Classifies one RGBA pixel slice (at least 3 bytes).
    #[inline]
    pub(crate) fn is_marker_rgba(&self, px: &[u8]) -> bool {
        self.is_marker(px[0], px[1], px[2])
    }
}

/// Classifies `BLOCK` RGBA pixels; bit `i` is set when pixel `i` is a marker.
///
/// `px` must hold at least `BLOCK * 4` bytes.
#[cfg(not(feature = "simd"))]
#[inline]
pub(crate) fn marker_mask8(px: &[u8], cfg: &DetectionConfig) -> u8 {
    let mut mask = 0u8;
    for (i, chunk) in px.chunks_exact(4).take(BLOCK).enumerate() {
        if cfg.is_marker_rgba(chunk) {
            mask |= 1 << i;
        }
    }
    mask
}

#[cfg(feature = "simd")]
pub(crate) use simd::marker_mask8;

#[cfg(feature = "simd")]
mod simd {
    use super::{DetectionConfig, BLOCK};
    use wide::i32x8;

    #[inline]
    fn channel(px: &[u8], offset: usize) -> i32x8 {
        i32x8::from([
            px[offset] as i32,
            px[4 + offset] as i32,
            px[8 + offset] as i32,
            px[12 + offset] as i32,
            px[16 + offset] as i32,
            px[20 + offset] as i32,
            px[24 + offset] as i32,
            px[28 + offset] as i32,
        ])
    }

    /// Maps `v >= 1` to 1 and everything else to 0.
    #[inline]
    fn positive(v: i32x8) -> i32x8 {
        v.max(i32x8::splat(0)).min(i32x8::splat(1))
    }

    #[inline]
    pub(crate) fn marker_mask8(px: &[u8], cfg: &DetectionConfig) -> u8 {
        let r = channel(px, 0);
        let g = channel(px, 1);
        let b = channel(px, 2);
        let one = i32x8::splat(1);

        let red_green = (r - g).max(g - r);
        let close = positive(i32x8::splat(cfg.max_red_green_separation as i32) - red_green + one);
        let separated = positive(r - b - i32x8::splat(cfg.min_red_blue_separation as i32) + one);
        let bright = positive(r - i32x8::splat(cfg.min_red as i32) + one);

        let flags = (close & separated & bright).to_array();
        let mut mask = 0u8;
        for (i, flag) in flags.iter().enumerate().take(BLOCK) {
            if *flag != 0 {
                mask |= 1 << i;
            }
        }
        mask
    }
}
