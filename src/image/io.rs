//! Convenience helpers for loading images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{OwnedRgbaImage, RgbaView};
use crate::util::{BarCodeError, BarCodeResult};
use std::path::Path;

/// Creates a borrowed view from an RGBA image buffer.
pub fn view_from_rgba_image(img: &image::RgbaImage) -> BarCodeResult<RgbaView<'_>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    RgbaView::from_slice(img.as_raw(), width, height)
}

/// Creates an owned RGBA image from a dynamic image of any pixel format.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> BarCodeResult<OwnedRgbaImage> {
    let rgba = img.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    OwnedRgbaImage::new(rgba.into_raw(), width, height)
}

/// Loads an image from disk and converts it to RGBA8.
pub fn load_rgba_image<P: AsRef<Path>>(path: P) -> BarCodeResult<OwnedRgbaImage> {
    let img = image::open(path).map_err(|err| BarCodeError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}
