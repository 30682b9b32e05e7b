//! RGBA8 image views.
//!
//! `RgbaView` borrows a packed RGBA8 buffer (4 bytes per pixel, red first).
//! The stride counts pixels between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. The finder never
//! writes to the buffer.

use crate::util::{BarCodeError, BarCodeResult, Point};

#[cfg(feature = "image-io")]
pub mod io;

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Borrowed RGBA8 image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct RgbaView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> RgbaView<'a> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> BarCodeResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride in pixels.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> BarCodeResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(BarCodeError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in pixels between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the RGBA bytes of row `y` (`width * 4` bytes).
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?.checked_mul(CHANNELS)?;
        let end = start.checked_add(self.width * CHANNELS)?;
        self.data.get(start..end)
    }

    /// Returns the `(r, g, b)` triplet at `(x, y)` if it is within bounds.
    pub fn rgb(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let px = row.get(x * CHANNELS..x * CHANNELS + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Returns the `(r, g, b)` triplet at `p`, or `None` outside the image.
    pub fn rgb_at(&self, p: Point) -> Option<[u8; 3]> {
        if p.x < 0 || p.y < 0 {
            return None;
        }
        self.rgb(p.x as usize, p.y as usize)
    }
}

/// Owned RGBA8 image, mainly for tests and the `image-io` helpers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedRgbaImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedRgbaImage {
    /// Wraps a packed RGBA8 buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> BarCodeResult<Self> {
        let needed = required_len(width, height, width)?;
        if data.len() != needed {
            return Err(BarCodeError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image filled with one opaque color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> BarCodeResult<Self> {
        let needed = required_len(width, height, width)?;
        let mut data = Vec::with_capacity(needed);
        for _ in 0..width * height {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Paints the inclusive rectangle `[x0, x1] x [y0, y1]`, clipped to the image.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, rgb: [u8; 3]) {
        let x1 = x1.min(self.width.saturating_sub(1));
        let y1 = y1.min(self.height.saturating_sub(1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let idx = (y * self.width + x) * CHANNELS;
                self.data[idx] = rgb[0];
                self.data[idx + 1] = rgb[1];
                self.data[idx + 2] = rgb[2];
                self.data[idx + 3] = 255;
            }
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the packed RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Borrows the image as a view.
    pub fn view(&self) -> RgbaView<'_> {
        RgbaView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> BarCodeResult<usize> {
    // Coordinates are carried as i32 through the pipeline.
    if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
        return Err(BarCodeError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(BarCodeError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(BarCodeError::InvalidDimensions { width, height })?;
    Ok(needed)
}

#[cfg(test)]
mod tests {
    use super::{OwnedRgbaImage, RgbaView};
    use crate::util::{BarCodeError, Point};

    #[test]
    fn strided_rows_skip_padding() {
        // 2x2 image with one pixel of padding per row.
        let data: Vec<u8> = (0u8..24).collect();
        let view = RgbaView::new(&data, 2, 2, 3).unwrap();
        assert_eq!(view.row(1).unwrap(), &data[12..20]);
        assert_eq!(view.rgb(1, 1), Some([16, 17, 18]));
        assert_eq!(view.rgb(2, 1), None);
        assert_eq!(view.rgb_at(Point::new(-1, 0)), None);
    }

    #[test]
    fn rejects_short_buffer() {
        let data = [0u8; 15];
        let err = RgbaView::from_slice(&data, 2, 2).unwrap_err();
        assert_eq!(err, BarCodeError::BufferTooSmall { needed: 16, got: 15 });
    }

    #[test]
    fn fill_rect_clips_to_image() {
        let mut img = OwnedRgbaImage::filled(4, 4, [0, 0, 0]).unwrap();
        img.fill_rect(2, 2, 10, 10, [9, 8, 7]);
        let view = img.view();
        assert_eq!(view.rgb(3, 3), Some([9, 8, 7]));
        assert_eq!(view.rgb(1, 1), Some([0, 0, 0]));
    }
}
