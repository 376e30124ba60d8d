//! Hand landmark extraction (21-point set per hand).

use anyhow::Result;
use serde_json::json;
use visage_utils::{DataPayload, Image, OpResult, VisageError};

use crate::detector::LandmarkSource;
use crate::draw::draw_landmark_rows;
use crate::landmarks::{HAND_POINTS, LandmarkRow, select_indices};
use crate::validate::{ensure_confidence, ensure_count};

/// Options for [`detect_hands`].
#[derive(Debug, Clone)]
pub struct HandOptions {
    /// Maximum number of hands to report.
    pub max_hands: usize,
    /// Minimum detection confidence in `[0, 1]`.
    pub min_confidence: f32,
    /// Specific landmark indices to extract. `None` means all 21.
    pub landmark_indices: Option<Vec<usize>>,
}

impl Default for HandOptions {
    fn default() -> Self {
        Self {
            max_hands: 2,
            min_confidence: 0.7,
            landmark_indices: None,
        }
    }
}

/// Detect hand landmarks in an image.
///
/// Data rows are `[hand, index, x, y, z]` in normalized coordinates. When
/// no hand is detected the result is a sentinel failure.
pub fn detect_hands<S: LandmarkSource>(
    image: &Image,
    detector: &S,
    options: &HandOptions,
) -> Result<OpResult> {
    ensure_count("max_hands", options.max_hands)?;
    ensure_confidence("min_confidence", options.min_confidence)?;
    if let Some(indices) = &options.landmark_indices {
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= HAND_POINTS) {
            return Err(VisageError::invalid(format!(
                "landmark index {bad} is out of range (hands have {HAND_POINTS} points)"
            ))
            .into());
        }
    }

    let hands = detector.landmarks(image, options.max_hands, options.min_confidence)?;
    if hands.is_empty() {
        return Ok(OpResult::failure(
            "detect_hands",
            VisageError::miss("no hand landmarks detected").to_string(),
        )
        .with_param("max_hands", options.max_hands)
        .with_param("min_confidence", options.min_confidence));
    }

    let mut flat: Vec<LandmarkRow> = Vec::new();
    for hand in &hands {
        match &options.landmark_indices {
            Some(indices) => match select_indices(hand, indices) {
                Some(rows) => flat.extend(rows),
                None => {
                    return Ok(OpResult::failure(
                        "detect_hands",
                        "requested landmark indices missing from detection",
                    ));
                }
            },
            None => flat.extend(hand.iter().copied()),
        }
    }

    let annotated = draw_landmark_rows(image, &flat);
    let rows: Vec<Vec<f64>> = flat.iter().map(LandmarkRow::to_row).collect();

    Ok(OpResult::from_image(annotated)
        .with_data(DataPayload::Rows(rows))
        .with_operation("detect_hands")
        .with_param("max_hands", options.max_hands)
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
    use visage_utils::{ColorSpace, classify};

    fn test_image() -> Image {
        let buf = RgbImage::from_pixel(16, 16, image::Rgb([0, 0, 0]));
        Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
    }

    #[test]
    fn two_hands_produce_forty_two_rows() {
        let source = StubSource::uniform(HAND_POINTS, 2);
        let result = detect_hands(&test_image(), &source, &HandOptions::default()).unwrap();
        match result.data() {
            Some(DataPayload::Rows(rows)) => assert_eq!(rows.len(), HAND_POINTS * 2),
            other => panic!("expected rows payload, got {other:?}"),
        }
    }

    #[test]
    fn max_hands_caps_reported_entities() {
        let source = StubSource::uniform(HAND_POINTS, 2);
        let result = detect_hands(
            &test_image(),
            &source,
            &HandOptions {
                max_hands: 1,
                ..Default::default()
            },
        )
        .unwrap();
        match result.data() {
            Some(DataPayload::Rows(rows)) => assert_eq!(rows.len(), HAND_POINTS),
            other => panic!("expected rows payload, got {other:?}"),
        }
    }

    #[test]
    fn miss_is_sentinel_and_invalid_confidence_raises() {
        let empty = StubSource::empty();
        let result = detect_hands(&test_image(), &empty, &HandOptions::default()).unwrap();
        assert!(result.is_failure());

        let err = detect_hands(
            &test_image(),
            &empty,
            &HandOptions {
                min_confidence: -0.1,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
    }
}
