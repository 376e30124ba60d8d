//! Handlers for the image operation subcommands.
//!
//! The input may be a single image or a directory; directories are walked
//! recursively and the output path is treated as a directory receiving one
//! file per input, keeping the original file names.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use log::info;
use visage_core::{
    apply_average_blur, apply_bilateral_blur, apply_clahe_contrast, apply_contrast_stretching,
    apply_gaussian_blur, apply_histogram_equalization, apply_laplacian_sharpening,
    apply_median_blur, apply_unsharp_masking, convert_to_grayscale, crop_image, resize_image,
    rotate_image_90, rotate_image_180, rotate_image_270, rotate_image_custom,
};
use visage_utils::{AppSettings, Image, OpResult, OutputOptions};

use crate::args::{
    BlurArgs, BlurKind, ContrastArgs, ContrastKind, CropArgs, IoArgs, ResizeArgs, RotateArgs,
    SharpenArgs, SharpenKind,
};
use crate::input::collect_images;

pub fn run_blur(args: &BlurArgs, settings: &AppSettings) -> Result<()> {
    run_op(&args.io, settings, |image| match args.kind {
        BlurKind::Average => apply_average_blur(image, (args.kernel_width, args.kernel_height)),
        BlurKind::Gaussian => apply_gaussian_blur(image, (args.kernel_width, args.kernel_height)),
        BlurKind::Median => apply_median_blur(image, args.filter_size),
        BlurKind::Bilateral => {
            apply_bilateral_blur(image, args.filter_size, args.sigma_color, args.sigma_space)
        }
    })
}

pub fn run_sharpen(args: &SharpenArgs, settings: &AppSettings) -> Result<()> {
    run_op(&args.io, settings, |image| match args.kind {
        SharpenKind::Laplacian => apply_laplacian_sharpening(image, args.coefficient),
        SharpenKind::Unsharp => apply_unsharp_masking(image, args.coefficient),
    })
}

pub fn run_contrast(args: &ContrastArgs, settings: &AppSettings) -> Result<()> {
    run_op(&args.io, settings, |image| match args.kind {
        ContrastKind::Clahe => {
            apply_clahe_contrast(image, args.clip_limit, (args.tiles_x, args.tiles_y))
        }
        ContrastKind::Equalize => apply_histogram_equalization(image),
        ContrastKind::Stretch => apply_contrast_stretching(image, args.alpha, args.beta),
    })
}

pub fn run_crop(args: &CropArgs, settings: &AppSettings) -> Result<()> {
    run_op(&args.io, settings, |image| {
        crop_image(image, (args.x1, args.y1), (args.x2, args.y2))
    })
}

pub fn run_resize(args: &ResizeArgs, settings: &AppSettings) -> Result<()> {
    run_op(&args.io, settings, |image| {
        resize_image(image, (args.width, args.height))
    })
}

pub fn run_rotate(args: &RotateArgs, settings: &AppSettings) -> Result<()> {
    run_op(&args.io, settings, |image| {
        if args.scale == 1.0 && args.angle == 90.0 {
            rotate_image_90(image)
        } else if args.scale == 1.0 && args.angle == 180.0 {
            rotate_image_180(image)
        } else if args.scale == 1.0 && args.angle == 270.0 {
            rotate_image_270(image)
        } else {
            rotate_image_custom(image, args.angle, args.scale)
        }
    })
}

pub fn run_grayscale(args: &IoArgs, settings: &AppSettings) -> Result<()> {
    run_op(args, settings, convert_to_grayscale)
}

/// Apply `op` to every collected input and write the outputs.
fn run_op(
    io: &IoArgs,
    settings: &AppSettings,
    op: impl Fn(&Image) -> Result<OpResult>,
) -> Result<()> {
    let encoder: OutputOptions = settings.output.encoder_options();
    let batch = io.input.is_dir();
    let inputs = collect_images(&io.input)?;
    anyhow::ensure!(
        !inputs.is_empty(),
        "no images found at {} (supported extensions: jpg, jpeg, png, bmp, webp)",
        io.input.display()
    );

    if batch {
        fs::create_dir_all(&io.output)?;
    }

    for input in &inputs {
        let image = Image::from_path(input)?;
        let result = op(&image)?;
        let target: PathBuf = if batch {
            let name = input
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("out.png"));
            io.output.join(name)
        } else {
            io.output.clone()
        };
        result.save_as_img_with(&target, &encoder)?;
        info!("{} -> {}", input.display(), target.display());
    }
    Ok(())
}
