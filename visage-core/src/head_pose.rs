//! Head pose (yaw/pitch) from facial landmark geometry.
//!
//! This is deliberately a coarse proxy, not a 3-D pose solve: it measures
//! the asymmetry of the nasion relative to the eye corners (yaw) and
//! relative to the nose tip and chin (pitch). Magnitude and sign are
//! comparative values, not calibrated degrees. The formulas are part of
//! the output contract: downstream consumers compare recordings produced
//! by different versions.

use anyhow::Result;
use visage_utils::{DataPayload, Image, OpResult, VisageError};

use crate::detector::LandmarkSource;
use crate::landmarks::{HEAD_POSE_INDICES, LandmarkRow};
use crate::validate::{ensure_confidence, ensure_count};

/// Yaw and pitch for one detected face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub yaw: f32,
    pub pitch: f32,
}

/// Options for [`estimate_head_pose`].
#[derive(Debug, Clone)]
pub struct HeadPoseOptions {
    /// Maximum number of faces to report.
    pub max_faces: usize,
    /// Minimum detection confidence in `[0, 1]`.
    pub min_confidence: f32,
}

impl Default for HeadPoseOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            min_confidence: 0.7,
        }
    }
}

/// Compute the yaw/pitch proxy from one face's landmark rows.
///
/// Requires mesh indices 1 (nose tip), 152 (chin), 33 (left eye outer),
/// 263 (right eye outer), and 168 (nasion); a missing index is a
/// [`VisageError::MissingLandmark`].
pub fn head_pose_angles(face: &[LandmarkRow]) -> Result<HeadPose, VisageError> {
    let [nose, chin, left_eye, right_eye, nasion] = HEAD_POSE_INDICES;
    let find = |index: usize| {
        face.iter()
            .find(|row| row.index == index)
            .copied()
            .ok_or(VisageError::MissingLandmark(index))
    };

    let nose = find(nose)?;
    let chin_y = find(chin)?.y;
    let left_x = find(left_eye)?.x;
    let right_x = find(right_eye)?.x;
    let nasion = find(nasion)?;

    let yaw = 100.0 * ((right_x - nasion.x) - (nasion.x - left_x));
    let pitch = 100.0 * ((chin_y - nose.y) - (nose.y - nasion.y));
    Ok(HeadPose { yaw, pitch })
}

/// Estimate head pose for each detected face.
///
/// The result's data is one row `[face, yaw, pitch]` per face. No detected
/// face, or a face with a required landmark absent, yields a sentinel
/// failure.
pub fn estimate_head_pose<S: LandmarkSource>(
    image: &Image,
    detector: &S,
    options: &HeadPoseOptions,
) -> Result<OpResult> {
    ensure_count("max_faces", options.max_faces)?;
    ensure_confidence("min_confidence", options.min_confidence)?;

    let faces = detector.landmarks(image, options.max_faces, options.min_confidence)?;
    if faces.is_empty() {
        return Ok(OpResult::failure(
            "estimate_head_pose",
            VisageError::miss("no face landmarks detected").to_string(),
        )
        .with_param("max_faces", options.max_faces)
        .with_param("min_confidence", options.min_confidence));
    }

    let mut rows = Vec::with_capacity(faces.len());
    for face in &faces {
        match head_pose_angles(face) {
            Ok(pose) => {
                let face_id = face.first().map(|row| row.entity).unwrap_or(0);
                rows.push(vec![face_id as f64, pose.yaw as f64, pose.pitch as f64]);
            }
            Err(err @ VisageError::MissingLandmark(_)) => {
                return Ok(OpResult::failure("estimate_head_pose", err.to_string())
                    .with_param("max_faces", options.max_faces)
                    .with_param("min_confidence", options.min_confidence));
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(OpResult::from_data(DataPayload::Rows(rows))
        .with_operation("estimate_head_pose")
        .with_param("max_faces", options.max_faces)
        .with_param("min_confidence", options.min_confidence))
}
