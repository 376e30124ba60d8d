//! End-to-end checks over the pipeline operations and result handling.

use image::{DynamicImage, RgbImage};
use tempfile::tempdir;
use visage_core::{
    apply_average_blur, apply_gaussian_blur, apply_median_blur, apply_unsharp_masking,
    convert_to_grayscale, crop_image, resize_image, rotate_image_180,
};
use visage_utils::{ColorSpace, Image, VisageError, classify};

fn checkerboard(width: u32, height: u32) -> Image {
    let mut buf = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if (x + y) % 2 == 0 { 40 } else { 220 };
            buf.put_pixel(x, y, image::Rgb([v, v, v]));
        }
    }
    Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
}

#[test]
fn blur_and_sharpen_preserve_input_shape() {
    let image = checkerboard(31, 17);
    for result in [
        apply_average_blur(&image, (3, 5)).unwrap(),
        apply_gaussian_blur(&image, (7, 3)).unwrap(),
        apply_median_blur(&image, 5).unwrap(),
        apply_unsharp_masking(&image, 1.0).unwrap(),
    ] {
        assert_eq!(result.image().unwrap().dimensions(), (31, 17));
    }
}

#[test]
fn noop_crop_returns_equal_pixels() {
    let image = checkerboard(24, 18);
    let result = crop_image(&image, (0, 0), (24, 18)).unwrap();
    assert_eq!(
        result.image().unwrap().to_rgb8().as_raw(),
        image.to_rgb8().as_raw()
    );
}

#[test]
fn chained_operations_compose_through_results() {
    let image = checkerboard(40, 30);

    let blurred = apply_gaussian_blur(&image, (5, 5)).unwrap().to_image().unwrap();
    let cropped = crop_image(&blurred, (5, 5), (35, 25)).unwrap().to_image().unwrap();
    let resized = resize_image(&cropped, (64, 64)).unwrap().to_image().unwrap();
    let rotated = rotate_image_180(&resized).unwrap().to_image().unwrap();
    let gray = convert_to_grayscale(&rotated).unwrap();

    let out = gray.image().unwrap();
    assert_eq!(out.dimensions(), (64, 64));
    assert_eq!(out.channels(), 1);
}

#[test]
fn results_save_and_reload_from_disk() {
    let td = tempdir().unwrap();
    let image = checkerboard(16, 16);

    let result = apply_average_blur(&image, (3, 3)).unwrap();
    let out_path = td.path().join("blurred.png");
    result.save_as_img(&out_path).unwrap();

    let reloaded = Image::from_path(&out_path).unwrap();
    assert_eq!(reloaded.dimensions(), (16, 16));
    assert_eq!(reloaded.source_kind(), visage_utils::SourceKind::Path);
}

#[test]
fn invalid_parameters_never_reach_the_filter() {
    let image = checkerboard(16, 16);

    for kernel in [(0, 3), (3, 0), (0, 0)] {
        let err = apply_average_blur(&image, kernel).unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
    }
    for kernel in [(2, 3), (3, 6), (4, 4)] {
        let err = apply_gaussian_blur(&image, kernel).unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
    }
}
