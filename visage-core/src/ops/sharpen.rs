//! Sharpening operations: Laplacian enhancement and unsharp masking.

use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::filter::filter3x3;
use visage_utils::{ColorSpace, Image, OpResult};

use crate::ops::blur::box_blur;
use crate::validate::ensure_non_negative;

/// Default strength for the Laplacian sharpener.
pub const DEFAULT_LAPLACIAN_COEFFICIENT: f64 = 3.0;
/// Default strength for unsharp masking.
pub const DEFAULT_UNSHARP_COEFFICIENT: f64 = 1.0;

const LAPLACIAN_KERNEL: [i16; 9] = [0, 1, 0, 1, -4, 1, 0, 1, 0];

/// Sharpen by adding back the absolute Laplacian response.
///
/// `coefficient` scales the edge response and must be non-negative.
pub fn apply_laplacian_sharpening(image: &Image, coefficient: f64) -> Result<OpResult> {
    ensure_non_negative("coefficient", coefficient)?;

    let src = image.to_rgb8();
    let laplacian: image::ImageBuffer<Rgb<i16>, Vec<i16>> =
        filter3x3::<Rgb<u8>, i16, i16>(&src, &LAPLACIAN_KERNEL);

    let (width, height) = src.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in src.enumerate_pixels() {
        let edge = laplacian.get_pixel(x, y).0;
        let mut sharpened = [0u8; 3];
        for c in 0..3 {
            let value = pixel[c] as f64 + coefficient * (edge[c] as f64).abs();
            sharpened[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        out.put_pixel(x, y, Rgb(sharpened));
    }

    Ok(wrap(out)
        .with_operation("apply_laplacian_sharpening")
        .with_param("coefficient", coefficient))
}

/// Sharpen by unsharp masking: `(1 + c) * src - c * blurred`.
///
/// The mask uses the default average blur. `coefficient` must be
/// non-negative; zero returns the source unchanged.
pub fn apply_unsharp_masking(image: &Image, coefficient: f64) -> Result<OpResult> {
    ensure_non_negative("coefficient", coefficient)?;

    let src = image.to_rgb8();
    let blurred = box_blur(&src, super::blur::DEFAULT_KERNEL_SIZE);

    let (width, height) = src.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in src.enumerate_pixels() {
        let soft = blurred.get_pixel(x, y).0;
        let mut sharpened = [0u8; 3];
        for c in 0..3 {
            let value =
                (1.0 + coefficient) * pixel[c] as f64 - coefficient * soft[c] as f64;
            sharpened[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        out.put_pixel(x, y, Rgb(sharpened));
    }

    Ok(wrap(out)
        .with_operation("apply_unsharp_masking")
        .with_param("coefficient", coefficient))
}

fn wrap(buffer: RgbImage) -> OpResult {
    OpResult::from_image(Image::from_buffer(
        DynamicImage::ImageRgb8(buffer),
        ColorSpace::Rgb,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_utils::{VisageError, classify};

    fn edge_image() -> Image {
        let mut buf = RgbImage::from_pixel(10, 10, image::Rgb([50, 50, 50]));
        for y in 0..10 {
            for x in 5..10 {
                buf.put_pixel(x, y, image::Rgb([200, 200, 200]));
            }
        }
        Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
    }

    #[test]
    fn laplacian_preserves_shape_and_boosts_edges() {
        let image = edge_image();
        let result = apply_laplacian_sharpening(&image, 1.0).unwrap();
        let out = result.image().unwrap();
        assert_eq!(out.dimensions(), (10, 10));

        // The edge column picks up energy; flat interior stays put.
        let out = out.to_rgb8();
        assert!(out.get_pixel(4, 5)[0] > 50);
        assert_eq!(out.get_pixel(1, 1)[0], 50);
    }

    #[test]
    fn unsharp_zero_coefficient_is_identity() {
        let image = edge_image();
        let result = apply_unsharp_masking(&image, 0.0).unwrap();
        assert_eq!(
            result.image().unwrap().to_rgb8().as_raw(),
            image.to_rgb8().as_raw()
        );
    }

    #[test]
    fn unsharp_increases_edge_contrast() {
        let image = edge_image();
        let result = apply_unsharp_masking(&image, 1.5).unwrap();
        let out = result.image().unwrap().to_rgb8();
        // Dark side of the edge darkens, bright side brightens.
        assert!(out.get_pixel(4, 5)[0] < 50);
        assert!(out.get_pixel(5, 5)[0] > 200);
    }

    #[test]
    fn negative_coefficient_is_invalid() {
        let image = edge_image();
        let err = apply_laplacian_sharpening(&image, -1.0).unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
        let err = apply_unsharp_masking(&image, f64::NAN).unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
    }
}
