//! Image to byte stream conversion.
//!
//! The stream carries one byte per channel, R, G, B for every pixel, pixels
//! in row-major order. It has no header: width and height are not stored.

use crate::{Error, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::path::Path;

/// Flattens an image into its RGB byte stream.
///
/// Grayscale images repeat their luma in all three channels; alpha is dropped.
pub fn serialize(image: &DynamicImage) -> Vec<u8> {
    image.to_rgb8().into_raw()
}

/// Opens and serializes the image at `path`.
pub fn serialize_path(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let image = image::open(path)?;
    debug!(
        "{}: {}x{} {:?}",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(serialize(&image))
}

/// Rebuilds an image from a byte stream of known dimensions.
pub fn deserialize(bytes: Vec<u8>, width: u32, height: u32) -> Result<RgbImage> {
    let len = bytes.len();
    let mismatch = Error::Dimensions { len, width, height };
    // from_raw accepts oversized buffers
    if len as u64 != width as u64 * height as u64 * 3 {
        return Err(mismatch);
    }
    RgbImage::from_raw(width, height, bytes).ok_or(mismatch)
}

/// Whether the file extension names an image format.
pub fn is_image(path: impl AsRef<Path>) -> bool {
    ImageFormat::from_path(path).is_ok()
}
