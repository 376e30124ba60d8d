//! Webcam capture utilities for the live analysis modes.

use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, ImageBuffer, Rgb};
use log::{debug, info, warn};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
};

use crate::image::{ColorSpace, Image};

/// Represents a webcam device with capture capabilities.
pub struct WebcamCapture {
    camera: Camera,
    device_index: u32,
    resolution: (u32, u32),
}

impl WebcamCapture {
    /// Open the default camera.
    pub fn new(width: u32, height: u32, fps: u32) -> Result<Self> {
        Self::with_device_index(0, width, height, fps)
    }

    /// Open a specific camera device.
    ///
    /// The requested resolution and frame rate are best-effort; some drivers
    /// ignore them, so the actual values are read back after opening.
    pub fn with_device_index(device_index: u32, width: u32, height: u32, fps: u32) -> Result<Self> {
        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        debug!(
            "opening webcam device {} with requested resolution {}x{} @ {} fps",
            device_index, width, height, fps
        );

        let mut camera = Camera::new(index, requested)
            .with_context(|| format!("failed to open webcam device {}", device_index))?;

        camera
            .open_stream()
            .context("failed to open webcam stream")?;

        if let Err(e) = camera.set_resolution(Resolution::new(width, height)) {
            warn!(
                "could not set resolution {}x{}: {}. Using camera default.",
                width, height, e
            );
        }
        if let Err(e) = camera.set_frame_rate(fps) {
            warn!("could not set frame rate {} fps: {}. Using camera default.", fps, e);
        }

        let actual = camera.resolution();
        info!(
            "webcam device {} opened: {}x{} @ {} fps",
            device_index,
            actual.width(),
            actual.height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera,
            device_index,
            resolution: (actual.width(), actual.height()),
        })
    }

    /// Capture a single frame and wrap it as an [`Image`] value object.
    pub fn capture_frame(&mut self) -> Result<Image> {
        let frame = self
            .camera
            .frame()
            .context("failed to capture webcam frame")?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("failed to decode webcam frame")?;

        let (width, height) = self.resolution;
        let rgb_image: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, decoded.to_vec())
                .ok_or_else(|| anyhow!("failed to create image buffer from webcam data"))?;

        Ok(Image::from_buffer(
            DynamicImage::ImageRgb8(rgb_image),
            ColorSpace::Rgb,
        ))
    }

    /// The actual resolution being used by the webcam.
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    pub fn frame_rate(&self) -> u32 {
        self.camera.frame_rate()
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("failed to stop webcam stream in drop: {}", e);
        }
    }
}

/// Lists all available webcam devices as (device_index, device_name) pairs.
pub fn list_webcam_devices() -> Result<Vec<(u32, String)>> {
    let devices =
        query(nokhwa::utils::ApiBackend::Auto).context("failed to query webcam devices")?;

    Ok(devices
        .iter()
        .enumerate()
        .map(|(idx, info)| (idx as u32, info.human_name().to_string()))
        .collect())
}
