//! Geometric operations: crop, resize, and rotation.

use anyhow::Result;
use image::{DynamicImage, Rgb, imageops::FilterType};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};
use serde_json::json;
use visage_utils::{ColorSpace, Image, OpResult, VisageError};

use crate::validate::ensure_positive;

/// Default scale for the custom rotation.
pub const DEFAULT_ROTATE_SCALE: f64 = 1.0;

/// Crop an image using top-left and bottom-right corners.
///
/// The start point must lie strictly before the end point, and the whole
/// rectangle must sit inside the image bounds; anything else is
/// [`VisageError::InvalidInput`].
pub fn crop_image(image: &Image, start_point: (i64, i64), end_point: (i64, i64)) -> Result<OpResult> {
    let (x1, y1) = start_point;
    let (x2, y2) = end_point;
    if x1 < 0 || y1 < 0 || x2 <= x1 || y2 <= y1 {
        return Err(VisageError::invalid(
            "invalid crop coordinates: ensure (x1, y1) is top-left and (x2, y2) is bottom-right",
        )
        .into());
    }

    let (width, height) = image.dimensions();
    if x2 > width as i64 || y2 > height as i64 {
        return Err(VisageError::invalid(format!(
            "crop area exceeds image bounds ({width}x{height})"
        ))
        .into());
    }

    let cropped = image
        .as_dynamic()
        .crop_imm(x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32);

    Ok(
        OpResult::from_image(Image::from_buffer(cropped, image.colorspace()))
            .with_operation("crop_image")
            .with_param("start_point", json!([x1, y1]))
            .with_param("end_point", json!([x2, y2])),
    )
}

/// Resize an image to `(width, height)` with bilinear sampling.
pub fn resize_image(image: &Image, new_size: (u32, u32)) -> Result<OpResult> {
    if new_size.0 == 0 || new_size.1 == 0 {
        return Err(VisageError::invalid(
            "'new_size' must be a pair of positive integers",
        )
        .into());
    }

    let resized = image
        .as_dynamic()
        .resize_exact(new_size.0, new_size.1, FilterType::Triangle);
    Ok(
        OpResult::from_image(Image::from_buffer(resized, image.colorspace()))
            .with_operation("resize_image")
            .with_param("new_size", json!([new_size.0, new_size.1])),
    )
}

/// Rotate 90 degrees clockwise.
pub fn rotate_image_90(image: &Image) -> Result<OpResult> {
    Ok(
        OpResult::from_image(Image::from_buffer(
            image.as_dynamic().rotate90(),
            image.colorspace(),
        ))
        .with_operation("rotate_image_90"),
    )
}

/// Rotate 180 degrees.
pub fn rotate_image_180(image: &Image) -> Result<OpResult> {
    Ok(
        OpResult::from_image(Image::from_buffer(
            image.as_dynamic().rotate180(),
            image.colorspace(),
        ))
        .with_operation("rotate_image_180"),
    )
}

/// Rotate 270 degrees clockwise (90 counter-clockwise).
pub fn rotate_image_270(image: &Image) -> Result<OpResult> {
    Ok(
        OpResult::from_image(Image::from_buffer(
            image.as_dynamic().rotate270(),
            image.colorspace(),
        ))
        .with_operation("rotate_image_270"),
    )
}

/// Rotate by an arbitrary angle about the image center, with scaling.
///
/// `angle` is in degrees, positive counter-clockwise. `scale` must be
/// positive. Output dimensions match the input; uncovered corners fill
/// black.
pub fn rotate_image_custom(image: &Image, angle: f64, scale: f64) -> Result<OpResult> {
    if !angle.is_finite() {
        return Err(VisageError::invalid(format!("'angle' must be finite, got {angle}")).into());
    }
    ensure_positive("scale", scale)?;

    let src = image.to_rgb8();
    let (width, height) = src.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);

    // Screen coordinates have y pointing down, so a positive (counter-
    // clockwise) angle maps to a negative rotation here.
    let theta = -(angle as f32).to_radians();
    let projection = Projection::translate(cx, cy)
        * Projection::rotate(theta)
        * Projection::scale(scale as f32, scale as f32)
        * Projection::translate(-cx, -cy);

    let rotated = warp(&src, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]));

    Ok(OpResult::from_image(Image::from_buffer(
        DynamicImage::ImageRgb8(rotated),
        ColorSpace::Rgb,
    ))
    .with_operation("rotate_image_custom")
    .with_param("angle", angle)
    .with_param("scale", scale))
}
