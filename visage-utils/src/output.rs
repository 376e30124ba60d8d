//! Helpers for exporting images with flexible encoding.
//!
//! Centralizes output-format selection and compression tuning so the result
//! object and the CLI share a single implementation.

use std::{
    fs,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Result;
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
        webp::WebPEncoder,
    },
};
use log::debug;

use crate::error::VisageError;

/// Canonical image formats supported by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormatHint {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormatHint {
    /// Determine format from a filesystem extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }
}

impl std::str::FromStr for ImageFormatHint {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// Encoding configuration for exported images.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Explicit format; `None` falls back to extension detection.
    pub format: Option<ImageFormatHint>,
    /// JPEG quality in 1..=100.
    pub jpeg_quality: u8,
    /// PNG compression strategy.
    pub png_fast: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: None,
            jpeg_quality: 90,
            png_fast: false,
        }
    }
}

/// Save an image using the provided options.
///
/// The format is taken from `options.format` when set, otherwise derived
/// from the destination extension, defaulting to PNG. Parent directories are
/// created as needed. Encoding and write failures surface as
/// [`VisageError::IoFailure`].
pub fn save_dynamic_image(
    image: &DynamicImage,
    destination: &Path,
    options: &OutputOptions,
) -> Result<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists())
    {
        fs::create_dir_all(parent).map_err(|e| VisageError::io(parent, e))?;
    }

    let format = determine_format(destination, options);
    debug!(
        "saving image to {} as {:?}",
        destination.display(),
        format
    );

    let encoded = match format {
        ImageFormatHint::Png => encode_png(image, destination, options.png_fast)?,
        ImageFormatHint::Jpeg => encode_jpeg(image, destination, options.jpeg_quality)?,
        ImageFormatHint::Webp => encode_webp(image, destination)?,
    };

    write_bytes(destination, &encoded)
}

fn determine_format(path: &Path, options: &OutputOptions) -> ImageFormatHint {
    if let Some(fmt) = options.format {
        return fmt;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormatHint::from_extension)
        .unwrap_or_default()
}

fn encode_png(image: &DynamicImage, path: &Path, fast: bool) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let mut buffer = Vec::new();
    let compression = if fast {
        CompressionType::Fast
    } else {
        CompressionType::Default
    };
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive);
    encoder
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| VisageError::io(path, format!("failed to encode PNG: {e}")))?;
    Ok(buffer)
}

fn encode_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| VisageError::io(path, format!("failed to encode JPEG: {e}")))?;
    Ok(buffer)
}

fn encode_webp(image: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let mut buffer = Vec::new();
    let encoder = WebPEncoder::new_lossless(&mut buffer);
    encoder
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| VisageError::io(path, format!("failed to encode WebP: {e}")))?;
    Ok(buffer)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|e| VisageError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .map_err(|e| VisageError::io(path, e))?;
    writer.flush().ok();
    Ok(())
}

/// Append a suffix to a filename, preserving the existing extension.
pub fn append_suffix_to_filename(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return name.to_string();
    }
    if let Some(idx) = name.rfind('.') {
        let (base, ext) = name.split_at(idx);
        format!("{base}{suffix}{ext}")
    } else {
        format!("{name}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use tempfile::tempdir;

    #[test]
    fn suffix_preserves_extension() {
        assert_eq!(append_suffix_to_filename("out.jpg", "_1"), "out_1.jpg");
        assert_eq!(append_suffix_to_filename("frame", "_2"), "frame_2");
        assert_eq!(
            append_suffix_to_filename("a/b/out.png", "_3"),
            "a/b/out_3.png"
        );
    }

    #[test]
    fn empty_suffix_is_identity() {
        assert_eq!(append_suffix_to_filename("out.jpg", ""), "out.jpg");
    }

    #[test]
    fn format_detection_prefers_explicit_option() {
        let options = OutputOptions {
            format: Some(ImageFormatHint::Jpeg),
            ..Default::default()
        };
        assert_eq!(
            determine_format(Path::new("image.png"), &options),
            ImageFormatHint::Jpeg
        );
    }

    #[test]
    fn format_detection_falls_back_to_extension() {
        let options = OutputOptions::default();
        assert_eq!(
            determine_format(Path::new("image.webp"), &options),
            ImageFormatHint::Webp
        );
        assert_eq!(
            determine_format(Path::new("no_extension"), &options),
            ImageFormatHint::Png
        );
    }

    #[test]
    fn save_roundtrip_writes_file() {
        let td = tempdir().unwrap();
        let path = td.path().join("nested/dir/out.png");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([10, 20, 30, 255]),
        ));
        save_dynamic_image(&img, &path, &OutputOptions::default()).unwrap();
        assert!(path.exists());
        assert!(path.metadata().unwrap().len() > 0);
    }
}
