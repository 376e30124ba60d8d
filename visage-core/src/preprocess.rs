//! Preprocessing utilities for preparing images for inference.
//!
//! The bundled landmark models all take a `[1, 3, H, W]` f32 tensor with
//! RGB channels normalized to `[0, 1]`. Helpers here resize an [`Image`]
//! into that layout and keep the original dimensions around so normalized
//! outputs can be mapped back to source pixels.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use tract_onnx::prelude::Tensor;
use visage_utils::{Image, resize_image, rgb_to_chw, timing_guard};

/// Desired model input resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Output of preprocessing: tensor plus the source dimensions.
#[derive(Debug)]
pub struct PreprocessOutput {
    /// The preprocessed image tensor, ready for inference.
    pub tensor: Tensor,
    /// The original dimensions of the input image.
    pub original_size: (u32, u32),
}

/// Resize and convert an image into a model-ready tensor.
pub fn preprocess_image(image: &Image, size: InputSize) -> Result<PreprocessOutput> {
    let _guard = timing_guard("visage_core::preprocess_image", log::Level::Trace);
    anyhow::ensure!(
        size.width > 0 && size.height > 0,
        "input dimensions must be greater than zero"
    );

    let original_size = image.dimensions();
    let resized = resize_image(image.as_dynamic(), size.width, size.height, FilterType::Triangle);
    let array = rgb_to_chw(&resized);
    let slice = array
        .as_slice()
        .context("CHW staging buffer is not contiguous")?;
    let tensor = Tensor::from_shape(
        &[1, 3, size.height as usize, size.width as usize],
        slice,
    )
    .map_err(|e| anyhow::anyhow!("failed to build input tensor: {e}"))?;

    Ok(PreprocessOutput {
        tensor,
        original_size,
    })
}
