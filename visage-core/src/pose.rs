//! Body pose landmark extraction (33-point set, single subject).

use anyhow::Result;
use serde_json::json;
use visage_utils::{DataPayload, Image, OpResult, VisageError};

use crate::detector::LandmarkSource;
use crate::draw::draw_landmark_rows;
use crate::landmarks::{BODY_POSE_POINTS, LandmarkRow, select_indices};
use crate::validate::ensure_confidence;

/// Options for [`detect_body_pose`].
#[derive(Debug, Clone)]
pub struct PoseOptions {
    /// Minimum detection confidence in `[0, 1]`.
    pub min_confidence: f32,
    /// Specific landmark indices to extract. `None` means all 33.
    pub landmark_indices: Option<Vec<usize>>,
}

impl Default for PoseOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            landmark_indices: None,
        }
    }
}

/// Detect body landmarks for the most prominent subject in an image.
///
/// Data rows are `[index, x, y, z]` in normalized coordinates (the pose
/// model tracks a single subject, so no entity column is needed). A frame
/// with no subject yields a sentinel failure.
pub fn detect_body_pose<S: LandmarkSource>(
    image: &Image,
    detector: &S,
    options: &PoseOptions,
) -> Result<OpResult> {
    ensure_confidence("min_confidence", options.min_confidence)?;
    if let Some(indices) = &options.landmark_indices {
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= BODY_POSE_POINTS) {
            return Err(VisageError::invalid(format!(
                "landmark index {bad} is out of range (pose has {BODY_POSE_POINTS} points)"
            ))
            .into());
        }
    }

    let subjects = detector.landmarks(image, 1, options.min_confidence)?;
    let Some(subject) = subjects.first() else {
        return Ok(OpResult::failure(
            "detect_body_pose",
            VisageError::miss("no body landmarks detected").to_string(),
        )
        .with_param("min_confidence", options.min_confidence));
    };

    let selected: Vec<LandmarkRow> = match &options.landmark_indices {
        Some(indices) => match select_indices(subject, indices) {
            Some(rows) => rows,
            None => {
                return Ok(OpResult::failure(
                    "detect_body_pose",
                    "requested landmark indices missing from detection",
                ));
            }
        },
        None => subject.clone(),
    };

    let annotated = draw_landmark_rows(image, &selected);
    let rows: Vec<Vec<f64>> = selected
        .iter()
        .map(|row| vec![row.index as f64, row.x as f64, row.y as f64, row.z as f64])
        .collect();

    Ok(OpResult::from_image(annotated)
        .with_data(DataPayload::Rows(rows))
        .with_operation("detect_body_pose")
        .with_param("min_confidence", options.min_confidence)
        .with_param(
            "landmark_indices",
            match &options.landmark_indices {
                Some(indices) => json!(indices),
                None => json!(null),
            },
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::stubs::StubSource;
    use image::{DynamicImage, RgbImage};
    use visage_utils::ColorSpace;

    fn test_image() -> Image {
        let buf = RgbImage::from_pixel(16, 16, image::Rgb([0, 0, 0]));
        Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
    }

    #[test]
    fn pose_rows_have_four_columns() {
        let source = StubSource::uniform(BODY_POSE_POINTS, 1);
        let result = detect_body_pose(&test_image(), &source, &PoseOptions::default()).unwrap();
        match result.data() {
            Some(DataPayload::Rows(rows)) => {
                assert_eq!(rows.len(), BODY_POSE_POINTS);
                assert_eq!(rows[0].len(), 4);
            }
            other => panic!("expected rows payload, got {other:?}"),
        }
    }

    #[test]
    fn subset_restricts_to_requested_indices() {
        let source = StubSource::uniform(BODY_POSE_POINTS, 1);
        let result = detect_body_pose(
            &test_image(),
            &source,
            &PoseOptions {
                landmark_indices: Some(vec![11, 12]),
                ..Default::default()
            },
        )
        .unwrap();
        match result.data() {
            Some(DataPayload::Rows(rows)) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0][0], 11.0);
            }
            other => panic!("expected rows payload, got {other:?}"),
        }
    }

    #[test]
    fn empty_detection_is_sentinel() {
        let source = StubSource::empty();
        let result = detect_body_pose(&test_image(), &source, &PoseOptions::default()).unwrap();
        assert!(result.is_failure());
        assert_eq!(result.error(), Some("no body landmarks detected"));
    }
}
