//! The `Image` value object: pixel data plus provenance.
//!
//! An [`Image`] couples a decoded pixel buffer with how it came to be (loaded
//! from a path or wrapped from an in-memory buffer) and which color space the
//! channels are in. Instances are immutable after construction; pipeline
//! operations always return a fresh image inside a result rather than
//! mutating in place.

use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{DynamicImage, GrayImage, RgbImage, imageops::FilterType};
use ndarray::Array3;

use crate::error::VisageError;

/// Channel ordering of the wrapped buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Blue-green-red, the ordering used by OpenCV-derived tooling.
    Bgr,
    /// Red-green-blue, the native ordering of the `image` crate.
    Rgb,
    /// Single luminance channel.
    Gray,
}

impl ColorSpace {
    /// Number of channels implied by this color space.
    pub fn channels(self) -> u32 {
        match self {
            ColorSpace::Bgr | ColorSpace::Rgb => 3,
            ColorSpace::Gray => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorSpace::Bgr => "BGR",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Gray => "GRAY",
        }
    }
}

/// How the image's initial content was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Decoded from a file on disk.
    Path,
    /// Wrapped from an existing in-memory buffer (webcam frame, intermediate
    /// pipeline output).
    Buffer,
}

/// A single in-memory raster image.
#[derive(Debug, Clone)]
pub struct Image {
    data: DynamicImage,
    path: Option<PathBuf>,
    colorspace: ColorSpace,
    source: SourceKind,
}

impl Image {
    /// Decode an image from disk.
    ///
    /// An unreadable or undecodable file is a caller mistake and reported as
    /// [`VisageError::InvalidInput`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = image::open(path_ref).map_err(|e| {
            VisageError::invalid(format!(
                "failed to load image from {}: {e}",
                path_ref.display()
            ))
        })?;
        Ok(Self {
            data,
            path: Some(path_ref.to_path_buf()),
            colorspace: ColorSpace::Rgb,
            source: SourceKind::Path,
        })
    }

    /// Wrap an already-decoded buffer.
    pub fn from_buffer(data: DynamicImage, colorspace: ColorSpace) -> Self {
        Self {
            data,
            path: None,
            colorspace,
            source: SourceKind::Buffer,
        }
    }

    /// Build an image from raw interleaved bytes.
    ///
    /// The byte length must equal `width * height * channels` for the given
    /// color space; anything else is [`VisageError::InvalidInput`].
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>, colorspace: ColorSpace) -> Result<Self> {
        let expected = width as usize * height as usize * colorspace.channels() as usize;
        if bytes.len() != expected {
            return Err(VisageError::invalid(format!(
                "raw buffer length {} does not match {}x{} {} (expected {})",
                bytes.len(),
                width,
                height,
                colorspace.as_str(),
                expected
            ))
            .into());
        }
        let data = match colorspace {
            ColorSpace::Gray => GrayImage::from_raw(width, height, bytes)
                .map(DynamicImage::ImageLuma8),
            ColorSpace::Rgb | ColorSpace::Bgr => {
                RgbImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8)
            }
        }
        .ok_or_else(|| VisageError::invalid("raw buffer does not form a valid pixel grid"))?;
        Ok(Self {
            data,
            path: None,
            colorspace,
            source: SourceKind::Buffer,
        })
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// (width, height) of the pixel buffer.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.data.width(), self.data.height())
    }

    pub fn channels(&self) -> u32 {
        self.colorspace.channels()
    }

    pub fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source
    }

    /// The path this image was decoded from, when [`SourceKind::Path`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Borrow the underlying buffer.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.data
    }

    /// Consume the wrapper and return the underlying buffer.
    pub fn into_dynamic(self) -> DynamicImage {
        self.data
    }

    /// Convert to an 8-bit RGB buffer (cheap when already RGB).
    pub fn to_rgb8(&self) -> RgbImage {
        self.data.to_rgb8()
    }

    /// Convert to a single-channel luminance buffer.
    pub fn to_gray8(&self) -> GrayImage {
        self.data.to_luma8()
    }
}

/// Load an image from disk into memory.
///
/// Thin wrapper kept for call sites that want a bare `DynamicImage` instead
/// of the [`Image`] value object.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    Ok(Image::from_path(path)?.into_dynamic())
}

/// Resize an image to the requested resolution using the provided filter.
pub fn resize_image(image: &DynamicImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    image.resize_exact(width, height, filter).to_rgb8()
}

/// Convert an RGB image into a CHW float array normalized to `[0, 1]`.
///
/// Rearranges the memory layout from HWC (height, width, channels) to CHW
/// (channels, height, width), the layout the bundled landmark models expect.
pub fn rgb_to_chw(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        array[(0, yi, xi)] = pixel[0] as f32 / 255.0;
        array[(1, yi, xi)] = pixel[1] as f32 / 255.0;
        array[(2, yi, xi)] = pixel[2] as f32 / 255.0;
    }
    array
}
