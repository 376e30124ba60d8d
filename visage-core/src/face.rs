//! Face detection and cropping via the mesh outline.
//!
//! The face region is derived from the mesh's outline landmarks rather
//! than a separate box detector: the outline points are projected to pixel
//! space and their bounding rectangle becomes the crop.

use anyhow::Result;
use visage_utils::{DataPayload, Image, OpResult, VisageError};

use crate::detector::LandmarkSource;
use crate::landmarks::{FACE_OUTLINE_INDICES, LandmarkRow, select_indices};
use crate::validate::{ensure_confidence, ensure_count};

/// Options for [`detect_faces`].
#[derive(Debug, Clone)]
pub struct FaceOptions {
    /// Maximum number of faces to report.
    pub max_faces: usize,
    /// Minimum detection confidence in `[0, 1]`.
    pub min_confidence: f32,
}

impl Default for FaceOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            min_confidence: 0.7,
        }
    }
}

/// Detect faces and crop each to its outline bounding rectangle.
///
/// The result carries one cropped image per face (in detection order) and
/// data rows `[face, index, x_px, y_px]` for the outline points in pixel
/// coordinates. No detected face yields a sentinel failure.
pub fn detect_faces<S: LandmarkSource>(
    image: &Image,
    detector: &S,
    options: &FaceOptions,
) -> Result<OpResult> {
    ensure_count("max_faces", options.max_faces)?;
    ensure_confidence("min_confidence", options.min_confidence)?;

    let faces = detector.landmarks(image, options.max_faces, options.min_confidence)?;
    if faces.is_empty() {
        return Ok(OpResult::failure(
            "detect_faces",
            VisageError::miss("no face landmarks detected").to_string(),
        )
        .with_param("max_faces", options.max_faces)
        .with_param("min_confidence", options.min_confidence));
    }

    let (width, height) = image.dimensions();
    let mut crops = Vec::with_capacity(faces.len());
    let mut rows = Vec::new();

    for face in &faces {
        let Some(outline) = select_indices(face, &FACE_OUTLINE_INDICES) else {
            return Ok(OpResult::failure(
                "detect_faces",
                "face outline landmarks missing from detection",
            ));
        };

        let (x, y, w, h) = outline_bounds(&outline, width, height);
        let crop = image.as_dynamic().crop_imm(x, y, w, h);
        crops.push(Image::from_buffer(crop, image.colorspace()));

        for row in &outline {
            let (px, py) = row.pixel(width, height);
            rows.push(vec![
                row.entity as f64,
                row.index as f64,
                px.floor() as f64,
                py.floor() as f64,
            ]);
        }
    }

    Ok(OpResult::from_images(crops)
        .with_data(DataPayload::Rows(rows))
        .with_operation("detect_faces")
        .with_param("max_faces", options.max_faces)
        .with_param("min_confidence", options.min_confidence))
}

/// Clamped pixel-space bounding rectangle of the outline points.
fn outline_bounds(outline: &[LandmarkRow], width: u32, height: u32) -> (u32, u32, u32, u32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;

    for row in outline {
        let (px, py) = row.pixel(width, height);
        min_x = min_x.min(px);
        min_y = min_y.min(py);
        max_x = max_x.max(px);
        max_y = max_y.max(py);
    }

    let x = min_x.clamp(0.0, (width.saturating_sub(1)) as f32) as u32;
    let y = min_y.clamp(0.0, (height.saturating_sub(1)) as f32) as u32;
    let w = (max_x.clamp(0.0, width as f32) as u32).saturating_sub(x).max(1);
    let h = (max_y.clamp(0.0, height as f32) as u32).saturating_sub(y).max(1);
    (x, y, w.min(width - x), h.min(height - y))
}
