//! Eye open/closed status via the Eye Aspect Ratio (EAR).
//!
//! EAR is the ratio of the eyelid's vertical gap to the eye corners'
//! horizontal span, measured in pixels after de-normalizing the landmark
//! coordinates. The eye is reported open iff the ratio strictly exceeds a
//! configurable threshold.

use anyhow::Result;
use visage_utils::{DataPayload, Image, OpResult, VisageError};

use crate::detector::LandmarkSource;
use crate::landmarks::{LandmarkRow, RIGHT_EYE_INDICES, select_indices};
use crate::validate::{ensure_confidence, ensure_positive};

/// EAR threshold below which (or at which) the eye is considered closed.
pub const DEFAULT_EAR_THRESHOLD: f32 = 0.2;

/// Computed eye metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeMetrics {
    /// The eye aspect ratio; 0.0 when the horizontal span degenerates.
    pub ear: f32,
    /// True iff `ear` strictly exceeds the threshold.
    pub open: bool,
}

/// Options for [`analyze_eye_status`].
#[derive(Debug, Clone)]
pub struct EyeOptions {
    /// Minimum detection confidence in `[0, 1]`.
    pub min_confidence: f32,
    /// EAR threshold for the open/closed decision.
    pub threshold: f32,
}

impl Default for EyeOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            threshold: DEFAULT_EAR_THRESHOLD,
        }
    }
}

/// Compute eye metrics from the four right-eye landmark rows.
///
/// Expects the rows to contain mesh indices 386 (top lid), 374 (bottom
/// lid), 263 (outer corner), and 362 (inner corner); a missing index is a
/// [`VisageError::MissingLandmark`]; no defaults are substituted. A zero
/// horizontal span reports the eye closed rather than dividing by zero.
pub fn eye_metrics(
    rows: &[LandmarkRow],
    image_size: (u32, u32),
    threshold: f32,
) -> Result<EyeMetrics, VisageError> {
    let [top, bottom, outer, inner] = RIGHT_EYE_INDICES;
    let find = |index: usize| {
        rows.iter()
            .find(|row| row.index == index)
            .copied()
            .ok_or(VisageError::MissingLandmark(index))
    };

    let (width, height) = image_size;
    let top_y = find(top)?.y * height as f32;
    let bottom_y = find(bottom)?.y * height as f32;
    let outer_x = find(outer)?.x * width as f32;
    let inner_x = find(inner)?.x * width as f32;

    let vertical = (bottom_y - top_y).abs();
    let horizontal = (inner_x - outer_x).abs();

    if horizontal == 0.0 {
        return Ok(EyeMetrics { ear: 0.0, open: false });
    }

    let ear = vertical / horizontal;
    Ok(EyeMetrics {
        ear,
        open: ear > threshold,
    })
}

/// Analyze right-eye open/closed status on a single image.
///
/// The result's data is a flag: true when the eye is open. No detected face
/// or a missing landmark yields a sentinel failure so live callers can skip
/// the frame.
pub fn analyze_eye_status<S: LandmarkSource>(
    image: &Image,
    detector: &S,
    options: &EyeOptions,
) -> Result<OpResult> {
    ensure_confidence("min_confidence", options.min_confidence)?;
    ensure_positive("threshold", options.threshold as f64)?;

    let faces = detector.landmarks(image, 1, options.min_confidence)?;
    let Some(face) = faces.first() else {
        return Ok(OpResult::failure(
            "analyze_eye_status",
            VisageError::miss("no face landmarks detected").to_string(),
        )
        .with_param("min_confidence", options.min_confidence)
        .with_param("threshold", options.threshold));
    };

    let rows = match select_indices(face, &RIGHT_EYE_INDICES) {
        Some(rows) => rows,
        None => face.clone(),
    };

    let metrics = match eye_metrics(&rows, image.dimensions(), options.threshold) {
        Ok(metrics) => metrics,
        Err(err @ VisageError::MissingLandmark(_)) => {
            return Ok(OpResult::failure("analyze_eye_status", err.to_string())
                .with_param("min_confidence", options.min_confidence)
                .with_param("threshold", options.threshold));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(OpResult::from_data(DataPayload::Flag(metrics.open))
        .with_operation("analyze_eye_status")
        .with_param("min_confidence", options.min_confidence)
        .with_param("threshold", options.threshold)
        .with_param("ear", metrics.ear))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::stubs::StubSource;
    use image::{DynamicImage, RgbImage};
    use visage_utils::ColorSpace;

    fn eye_rows(top_y: f32, bottom_y: f32, outer_x: f32, inner_x: f32) -> Vec<LandmarkRow> {
        let [top, bottom, outer, inner] = RIGHT_EYE_INDICES;
        vec![
            LandmarkRow { entity: 0, index: top, x: 0.5, y: top_y, z: 0.0 },
            LandmarkRow { entity: 0, index: bottom, x: 0.5, y: bottom_y, z: 0.0 },
            LandmarkRow { entity: 0, index: outer, x: outer_x, y: 0.32, z: 0.0 },
            LandmarkRow { entity: 0, index: inner, x: inner_x, y: 0.32, z: 0.0 },
        ]
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let rows = eye_rows(0.30, 0.34, 0.40, 0.60);

        // vertical = 4px, horizontal = 20px on a 100x100 image: EAR = 0.2.
        let at_threshold = eye_metrics(&rows, (100, 100), 0.2).unwrap();
        assert!((at_threshold.ear - 0.2).abs() < 1e-6);
        assert!(!at_threshold.open);

        let below_threshold = eye_metrics(&rows, (100, 100), 0.19).unwrap();
        assert!(below_threshold.open);
    }

    #[test]
    fn zero_horizontal_span_reports_closed() {
        let rows = eye_rows(0.30, 0.34, 0.50, 0.50);
        let metrics = eye_metrics(&rows, (100, 100), 0.2).unwrap();
        assert_eq!(metrics.ear, 0.0);
        assert!(!metrics.open);
    }

    #[test]
    fn missing_landmark_is_reported_not_defaulted() {
        let mut rows = eye_rows(0.30, 0.34, 0.40, 0.60);
        rows.retain(|row| row.index != 374);
        let err = eye_metrics(&rows, (100, 100), 0.2).unwrap_err();
        assert!(matches!(err, VisageError::MissingLandmark(374)));
    }

    #[test]
    fn pipeline_reports_flag_and_sentinel() {
        let image = Image::from_buffer(
            DynamicImage::ImageRgb8(RgbImage::new(100, 100)),
            ColorSpace::Rgb,
        );

        let open_source = StubSource {
            entities: vec![eye_rows(0.30, 0.40, 0.40, 0.60)],
        };
        let result = analyze_eye_status(&image, &open_source, &EyeOptions::default()).unwrap();
        assert_eq!(result.data(), Some(&DataPayload::Flag(true)));

        let missing = StubSource {
            entities: vec![eye_rows(0.30, 0.40, 0.40, 0.60)
                .into_iter()
                .filter(|row| row.index != 386)
                .collect()],
        };
        let result = analyze_eye_status(&image, &missing, &EyeOptions::default()).unwrap();
        assert!(result.is_failure());
        assert!(result.error().unwrap().contains("386"));

        let empty = StubSource::empty();
        let result = analyze_eye_status(&image, &empty, &EyeOptions::default()).unwrap();
        assert!(result.is_failure());
        assert_eq!(result.error(), Some("no face landmarks detected"));
    }
}
