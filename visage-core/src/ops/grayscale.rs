//! Grayscale conversion.

use anyhow::Result;
use image::DynamicImage;
use visage_utils::{ColorSpace, Image, OpResult};

/// Convert an image to a single luminance channel.
pub fn convert_to_grayscale(image: &Image) -> Result<OpResult> {
    let gray = image.to_gray8();
    Ok(OpResult::from_image(Image::from_buffer(
        DynamicImage::ImageLuma8(gray),
        ColorSpace::Gray,
    ))
    .with_operation("convert_to_grayscale"))
}
