//! Blur operations: average (box), Gaussian, median, and bilateral.

use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::filter::{median_filter, separable_filter};
use serde_json::json;
use visage_utils::{ColorSpace, Image, OpResult};

use crate::validate::{ensure_kernel_odd, ensure_kernel_positive, ensure_positive};

/// Default kernel for the average and Gaussian blurs.
pub const DEFAULT_KERNEL_SIZE: (u32, u32) = (5, 5);

/// Apply an average (box filter) blur.
///
/// Both kernel dimensions must be positive integers.
pub fn apply_average_blur(image: &Image, kernel_size: (u32, u32)) -> Result<OpResult> {
    ensure_kernel_positive("kernel_size", kernel_size)?;

    let blurred = box_blur(&image.to_rgb8(), kernel_size);
    Ok(wrap(blurred)
        .with_operation("apply_average_blur")
        .with_param("kernel_size", json!([kernel_size.0, kernel_size.1])))
}

/// Apply a Gaussian blur.
///
/// Both kernel dimensions must be odd positive integers; the per-axis sigma
/// is derived from the kernel size the way OpenCV derives it
/// (`0.3 * ((k - 1) * 0.5 - 1) + 0.8`).
pub fn apply_gaussian_blur(image: &Image, kernel_size: (u32, u32)) -> Result<OpResult> {
    ensure_kernel_odd("kernel_size", kernel_size)?;

    let h_kernel = gaussian_kernel(kernel_size.0);
    let v_kernel = gaussian_kernel(kernel_size.1);
    let blurred = separable_filter(&image.to_rgb8(), &h_kernel, &v_kernel);
    Ok(wrap(blurred)
        .with_operation("apply_gaussian_blur")
        .with_param("kernel_size", json!([kernel_size.0, kernel_size.1])))
}

/// Apply a median blur (salt-and-pepper noise removal).
///
/// `filter_size` must be an odd integer greater than 1.
pub fn apply_median_blur(image: &Image, filter_size: u32) -> Result<OpResult> {
    ensure_kernel_odd("filter_size", (filter_size, filter_size))?;
    if filter_size == 1 {
        return Err(visage_utils::VisageError::invalid(
            "'filter_size' must be an odd integer greater than 1",
        )
        .into());
    }

    let radius = (filter_size - 1) / 2;
    let blurred = median_filter(&image.to_rgb8(), radius, radius);
    Ok(wrap(blurred)
        .with_operation("apply_median_blur")
        .with_param("filter_size", filter_size))
}

/// Apply an edge-preserving bilateral blur.
///
/// `filter_size` is the pixel neighborhood diameter; both sigmas must be
/// positive.
pub fn apply_bilateral_blur(
    image: &Image,
    filter_size: u32,
    sigma_color: f64,
    sigma_space: f64,
) -> Result<OpResult> {
    ensure_kernel_positive("filter_size", (filter_size, filter_size))?;
    ensure_positive("sigma_color", sigma_color)?;
    ensure_positive("sigma_space", sigma_space)?;

    let blurred = bilateral(&image.to_rgb8(), filter_size, sigma_color, sigma_space);
    Ok(wrap(blurred)
        .with_operation("apply_bilateral_blur")
        .with_param("filter_size", filter_size)
        .with_param("sigma_color", sigma_color)
        .with_param("sigma_space", sigma_space))
}

fn wrap(buffer: RgbImage) -> OpResult {
    OpResult::from_image(Image::from_buffer(
        DynamicImage::ImageRgb8(buffer),
        ColorSpace::Rgb,
    ))
}

/// Separable box blur with replicated borders.
pub(crate) fn box_blur(src: &RgbImage, kernel: (u32, u32)) -> RgbImage {
    let h_kernel = vec![1.0f32 / kernel.0 as f32; kernel.0 as usize];
    let v_kernel = vec![1.0f32 / kernel.1 as f32; kernel.1 as usize];
    separable_filter(src, &h_kernel, &v_kernel)
}

/// Normalized 1-D Gaussian kernel of the given odd length.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-(i as f32).powi(2) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for value in &mut kernel {
        *value /= sum;
    }
    kernel
}

fn bilateral(src: &RgbImage, diameter: u32, sigma_color: f64, sigma_space: f64) -> RgbImage {
    let (width, height) = src.dimensions();
    let radius = (diameter / 2) as i64;
    let color_denom = 2.0 * sigma_color * sigma_color;
    let space_denom = 2.0 * sigma_space * sigma_space;

    let mut out = RgbImage::new(width, height);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let center = src.get_pixel(x as u32, y as u32).0;
            let mut weight_sum = 0.0f64;
            let mut acc = [0.0f64; 3];

            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = (x + dx).clamp(0, width as i64 - 1) as u32;
                    let ny = (y + dy).clamp(0, height as i64 - 1) as u32;
                    let neighbor = src.get_pixel(nx, ny).0;

                    let spatial = ((dx * dx + dy * dy) as f64) / space_denom;
                    let color: f64 = center
                        .iter()
                        .zip(neighbor.iter())
                        .map(|(&c, &n)| {
                            let diff = c as f64 - n as f64;
                            diff * diff
                        })
                        .sum::<f64>()
                        / color_denom;
                    let weight = (-(spatial + color)).exp();

                    weight_sum += weight;
                    for c in 0..3 {
                        acc[c] += neighbor[c] as f64 * weight;
                    }
                }
            }

            let mut pixel = [0u8; 3];
            for c in 0..3 {
                pixel[c] = (acc[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x as u32, y as u32, Rgb(pixel));
        }
    }
    out
}
