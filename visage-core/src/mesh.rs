//! Facial landmark extraction (468-point mesh).

use anyhow::Result;
use serde_json::json;
use visage_utils::{DataPayload, Image, OpResult, VisageError};

use crate::detector::LandmarkSource;
use crate::draw::draw_landmark_rows;
use crate::landmarks::{FACE_MESH_POINTS, LandmarkRow, select_indices};
use crate::validate::{ensure_confidence, ensure_count};

/// Options for [`analyze_face_mesh`].
#[derive(Debug, Clone)]
pub struct MeshOptions {
    /// Maximum number of faces to report.
    pub max_faces: usize,
    /// Minimum detection confidence in `[0, 1]`.
    pub min_confidence: f32,
    /// Specific landmark indices to extract. `None` means the full mesh.
    pub landmark_indices: Option<Vec<usize>>,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            min_confidence: 0.7,
            landmark_indices: None,
        }
    }
}

/// Detect facial landmarks on a single image.
///
/// The result's data is one row `[face, index, x, y, z]` per requested
/// landmark per face (normalized coordinates), and its image is a copy of
/// the input with the landmarks marked. When no face is detected the result
/// is a sentinel failure, not an error, so batch and live callers can
/// continue past the frame.
pub fn analyze_face_mesh<S: LandmarkSource>(
    image: &Image,
    detector: &S,
    options: &MeshOptions,
) -> Result<OpResult> {
    ensure_count("max_faces", options.max_faces)?;
    ensure_confidence("min_confidence", options.min_confidence)?;
    if let Some(indices) = &options.landmark_indices {
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= FACE_MESH_POINTS) {
            return Err(VisageError::invalid(format!(
                "landmark index {bad} is out of range (mesh has {FACE_MESH_POINTS} points)"
            ))
            .into());
        }
    }

    let faces = detector.landmarks(image, options.max_faces, options.min_confidence)?;
    if faces.is_empty() {
        return Ok(OpResult::failure(
            "analyze_face_mesh",
            VisageError::miss("no face landmarks detected").to_string(),
        )
        .with_param("max_faces", options.max_faces)
        .with_param("min_confidence", options.min_confidence));
    }

    let mut flat: Vec<LandmarkRow> = Vec::new();
    for face in &faces {
        match &options.landmark_indices {
            Some(indices) => match select_indices(face, indices) {
                Some(rows) => flat.extend(rows),
                None => {
                    return Ok(OpResult::failure(
                        "analyze_face_mesh",
                        "requested landmark indices missing from detection",
                    ));
                }
            },
            None => flat.extend(face.iter().copied()),
        }
    }

    let annotated = draw_landmark_rows(image, &flat);
    let rows: Vec<Vec<f64>> = flat.iter().map(LandmarkRow::to_row).collect();

    Ok(OpResult::from_image(annotated)
        .with_data(DataPayload::Rows(rows))
        .with_operation("analyze_face_mesh")
        .with_param("max_faces", options.max_faces)
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
        let buf = RgbImage::from_pixel(32, 32, image::Rgb([40, 40, 40]));
        Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
    }

    #[test]
    fn rejects_invalid_parameters_before_inference() {
        let source = StubSource::uniform(FACE_MESH_POINTS, 1);
        let image = test_image();

        let err = analyze_face_mesh(
            &image,
            &source,
            &MeshOptions {
                max_faces: 0,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));

        let err = analyze_face_mesh(
            &image,
            &source,
            &MeshOptions {
                min_confidence: 1.5,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));

        let err = analyze_face_mesh(
            &image,
            &source,
            &MeshOptions {
                landmark_indices: Some(vec![468]),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::InvalidInput(_))));
    }

    #[test]
    fn no_face_returns_sentinel_not_error() {
        let source = StubSource::empty();
        let result = analyze_face_mesh(&test_image(), &source, &MeshOptions::default()).unwrap();
        assert!(result.is_failure());
        assert_eq!(result.error(), Some("no face landmarks detected"));
        assert!(result.images().is_empty());
        assert!(result.data().is_none());
    }

    #[test]
    fn full_mesh_yields_one_row_per_landmark() {
        let source = StubSource::uniform(FACE_MESH_POINTS, 2);
        let result = analyze_face_mesh(
            &test_image(),
            &source,
            &MeshOptions {
                max_faces: 2,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!result.is_failure());
        match result.data() {
            Some(DataPayload::Rows(rows)) => {
                assert_eq!(rows.len(), FACE_MESH_POINTS * 2);
                assert_eq!(rows[0].len(), 5);
                assert_eq!(rows[FACE_MESH_POINTS][0], 1.0); // second face id
            }
            other => panic!("expected rows payload, got {other:?}"),
        }
        assert_eq!(result.images().len(), 1);
    }

    #[test]
    fn subset_selection_limits_rows() {
        let source = StubSource::uniform(FACE_MESH_POINTS, 1);
        let result = analyze_face_mesh(
            &test_image(),
            &source,
            &MeshOptions {
                landmark_indices: Some(vec![1, 152, 33]),
                ..Default::default()
            },
        )
        .unwrap();

        match result.data() {
            Some(DataPayload::Rows(rows)) => {
                assert_eq!(rows.len(), 3);
                assert_eq!(rows[1][1], 152.0);
            }
            other => panic!("expected rows payload, got {other:?}"),
        }
    }
}
