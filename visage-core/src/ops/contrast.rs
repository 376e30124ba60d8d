//! Contrast enhancement on the luminance plane.
//!
//! All three operations convert to grayscale first, matching the wrapped
//! pipeline's behavior: CLAHE (tiled, clip-limited equalization with
//! bilinear blending between tile lookup tables), global histogram
//! equalization, and linear stretching.

use anyhow::Result;
use image::{DynamicImage, GrayImage};
use serde_json::json;
use visage_utils::{ColorSpace, Image, OpResult, VisageError};

use crate::validate::{ensure_kernel_positive, ensure_positive};

/// Default CLAHE clip limit.
pub const DEFAULT_CLIP_LIMIT: f64 = 2.0;
/// Default CLAHE tile grid.
pub const DEFAULT_TILE_GRID_SIZE: (u32, u32) = (8, 8);

/// Contrast-limited adaptive histogram equalization.
///
/// `clip_limit` must be positive; `tile_grid_size` is the number of tiles
/// along (x, y), both positive.
pub fn apply_clahe_contrast(
    image: &Image,
    clip_limit: f64,
    tile_grid_size: (u32, u32),
) -> Result<OpResult> {
    ensure_positive("clip_limit", clip_limit)?;
    ensure_kernel_positive("tile_grid_size", tile_grid_size)?;

    let gray = image.to_gray8();
    let enhanced = clahe(&gray, clip_limit, tile_grid_size);
    Ok(wrap(enhanced)
        .with_operation("apply_clahe_contrast")
        .with_param("clip_limit", clip_limit)
        .with_param("tile_grid_size", json!([tile_grid_size.0, tile_grid_size.1])))
}

/// Global histogram equalization.
pub fn apply_histogram_equalization(image: &Image) -> Result<OpResult> {
    let gray = image.to_gray8();
    let (width, height) = gray.dimensions();

    let mut hist = [0u32; 256];
    for pixel in gray.pixels() {
        hist[pixel[0] as usize] += 1;
    }
    let lut = equalization_lut(&hist, width * height);

    let mut out = gray;
    for pixel in out.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }

    Ok(wrap(out).with_operation("apply_histogram_equalization"))
}

/// Linear contrast stretching: `alpha * pixel + beta`, clamped to `[0, 255]`.
///
/// `alpha` must be non-negative and `beta` must lie in `0..=255`.
pub fn apply_contrast_stretching(image: &Image, alpha: f64, beta: i32) -> Result<OpResult> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(VisageError::invalid(format!(
            "'alpha' must be a non-negative number, got {alpha}"
        ))
        .into());
    }
    if !(0..=255).contains(&beta) {
        return Err(VisageError::invalid(format!(
            "'beta' must be an integer between 0 and 255, got {beta}"
        ))
        .into());
    }

    let mut out = image.to_gray8();
    for pixel in out.pixels_mut() {
        pixel[0] = (alpha * pixel[0] as f64 + beta as f64)
            .round()
            .clamp(0.0, 255.0) as u8;
    }

    Ok(wrap(out)
        .with_operation("apply_contrast_stretching")
        .with_param("alpha", alpha)
        .with_param("beta", beta))
}

fn wrap(buffer: GrayImage) -> OpResult {
    OpResult::from_image(Image::from_buffer(
        DynamicImage::ImageLuma8(buffer),
        ColorSpace::Gray,
    ))
}

fn identity_lut() -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, item) in lut.iter_mut().enumerate() {
        *item = i as u8;
    }
    lut
}

/// Histogram-equalization lookup table for one histogram.
fn equalization_lut(hist: &[u32; 256], total: u32) -> [u8; 256] {
    if total == 0 {
        return identity_lut();
    }

    let mut cdf = [0u32; 256];
    let mut cumulative = 0u32;
    let mut cdf_min = None;
    for (idx, count) in hist.iter().enumerate() {
        cumulative += *count;
        cdf[idx] = cumulative;
        if cdf_min.is_none() && *count > 0 {
            cdf_min = Some(cumulative);
        }
    }

    let cdf_min = match cdf_min {
        Some(v) if v < total => v,
        _ => return identity_lut(),
    };

    let denom = (total - cdf_min) as f32;
    let mut lut = [0u8; 256];
    for i in 0..=255 {
        let numerator = cdf[i].saturating_sub(cdf_min) as f32;
        lut[i] = (numerator / denom * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Clip a histogram at `limit` and redistribute the excess uniformly.
fn clip_histogram(hist: &mut [u32; 256], limit: u32) {
    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }
    let share = excess / 256;
    let mut remainder = (excess % 256) as usize;
    for count in hist.iter_mut() {
        *count += share;
        if remainder > 0 {
            *count += 1;
            remainder -= 1;
        }
    }
}

fn clahe(gray: &GrayImage, clip_limit: f64, grid: (u32, u32)) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tiles_x = grid.0.min(width).max(1);
    let tiles_y = grid.1.min(height).max(1);
    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);

    // Per-tile clipped equalization LUTs.
    let mut luts = vec![identity_lut(); (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let pixels = (x1 - x0) * (y1 - y0);
            let limit = ((clip_limit * pixels as f64 / 256.0) as u32).max(1);
            clip_histogram(&mut hist, limit);
            luts[(ty * tiles_x + tx) as usize] = equalization_lut(&hist, pixels);
        }
    }

    // Bilinear blend between the four surrounding tile LUTs.
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = gray.get_pixel(x, y)[0] as usize;

            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
            let tx0 = fx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
            let ty0 = fy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let ty1 = (ty0 + 1).min(tiles_y - 1);
            let wx = (fx - tx0 as f32).clamp(0.0, 1.0);
            let wy = (fy - ty0 as f32).clamp(0.0, 1.0);

            let lut = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][value] as f32;
            let top = lut(tx0, ty0) * (1.0 - wx) + lut(tx1, ty0) * wx;
            let bottom = lut(tx0, ty1) * (1.0 - wx) + lut(tx1, ty1) * wx;
            let blended = top * (1.0 - wy) + bottom * wy;

            out.put_pixel(x, y, image::Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use visage_utils::classify;

    fn gradient_image() -> Image {
        let mut buf = RgbImage::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                let v = 96 + (x * 4) as u8;
                buf.put_pixel(x, y, image::Rgb([v, v, v]));
            }
        }
        Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
    }

    #[test]
    fn equalization_stretches_narrow_histograms() {
        let result = apply_histogram_equalization(&gradient_image()).unwrap();
        let out = result.image().unwrap().to_gray8();
        let (mut min, mut max) = (u8::MAX, 0u8);
        for pixel in out.pixels() {
            min = min.min(pixel[0]);
            max = max.max(pixel[0]);
        }
        assert_eq!(min, 0);
        assert_eq!(max, 255);
    }

    #[test]
    fn equalization_of_flat_image_is_identity() {
        let flat = Image::from_buffer(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([77, 77, 77]))),
            ColorSpace::Rgb,
        );
        let result = apply_histogram_equalization(&flat).unwrap();
        let out = result.image().unwrap().to_gray8();
        assert_eq!(out.get_pixel(3, 3)[0], 77);
    }

    #[test]
    fn clahe_output_is_grayscale_of_same_shape() {
        let result = apply_clahe_contrast(&gradient_image(), 2.0, (4, 4)).unwrap();
        let out = result.image().unwrap();
        assert_eq!(out.dimensions(), (16, 16));
        assert_eq!(out.colorspace(), ColorSpace::Gray);
    }

    #[test]
    fn clahe_rejects_bad_parameters() {
        let image = gradient_image();
        let err = apply_clahe_contrast(&image, 0.0, (8, 8)).unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
        let err = apply_clahe_contrast(&image, 2.0, (0, 8)).unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
    }

    #[test]
    fn stretching_applies_linear_map() {
        let flat = Image::from_buffer(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([100, 100, 100]))),
            ColorSpace::Rgb,
        );
        let result = apply_contrast_stretching(&flat, 1.5, 10).unwrap();
        let out = result.image().unwrap().to_gray8();
        assert_eq!(out.get_pixel(0, 0)[0], 160);
    }

    #[test]
    fn stretching_validates_alpha_and_beta() {
        let image = gradient_image();
        assert!(apply_contrast_stretching(&image, -1.0, 10).is_err());
        assert!(apply_contrast_stretching(&image, 1.0, 256).is_err());
        assert!(apply_contrast_stretching(&image, 1.0, -1).is_err());
    }
}
