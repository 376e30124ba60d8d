//! Landmark row representation and tensor decoding.
//!
//! The detectors translate their models' native outputs into a single row
//! format: `(entity, index, x, y, z)` with coordinates normalized to
//! `[0, 1]` in image space. The heuristic functions and the CSV export both
//! consume this shape.

use anyhow::Result;
use tract_onnx::prelude::Tensor;

/// Number of points in the face mesh model's fixed output set.
pub const FACE_MESH_POINTS: usize = 468;
/// Number of points per hand in the hand landmark model.
pub const HAND_POINTS: usize = 21;
/// Number of points in the body pose model.
pub const BODY_POSE_POINTS: usize = 33;

/// Mesh indices used by the eye-status heuristic: top lid, bottom lid,
/// outer corner, inner corner of the right eye.
pub const RIGHT_EYE_INDICES: [usize; 4] = [386, 374, 263, 362];

/// Mesh indices used by the head-pose heuristic: nose tip, chin, left eye
/// outer corner, right eye outer corner, nasion.
pub const HEAD_POSE_INDICES: [usize; 5] = [1, 152, 33, 263, 168];

/// Mesh indices tracing the face outline, used to derive face crops.
pub const FACE_OUTLINE_INDICES: [usize; 28] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 164, 163, 153, 157,
];

/// One detected landmark: entity id (face/hand), landmark index, and
/// normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkRow {
    pub entity: usize,
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkRow {
    /// Pixel position of this landmark for the given image dimensions.
    pub fn pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }

    /// CSV row form: `[entity, index, x, y, z]`.
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.entity as f64,
            self.index as f64,
            self.x as f64,
            self.y as f64,
            self.z as f64,
        ]
    }
}

/// Decode a landmark tensor of shape `[E, P, 3]` (or `[1, E, P, 3]`) plus a
/// score tensor of shape `[E]` (or `[1, E]`) into per-entity landmark rows.
///
/// Entities scoring below `min_confidence` are dropped; at most
/// `max_entities` survivors are returned, in model order.
pub fn decode_entities(
    landmarks: &Tensor,
    scores: &Tensor,
    points: usize,
    min_confidence: f32,
    max_entities: usize,
) -> Result<Vec<Vec<LandmarkRow>>> {
    let shape = landmarks.shape();
    let entities = match shape {
        [e, p, 3] if *p == points => *e,
        [1, e, p, 3] if *p == points => *e,
        other => anyhow::bail!(
            "landmark output must have shape [E, {points}, 3] or [1, E, {points}, 3] (got {other:?})"
        ),
    };

    let score_values = score_slice(scores, entities)?;
    let data = landmarks
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("landmark output is not f32: {e}"))?;

    let mut decoded = Vec::new();
    for entity in 0..entities {
        let score = score_values[entity];
        if !score.is_finite() || score < min_confidence {
            continue;
        }
        if decoded.len() >= max_entities {
            break;
        }

        let base = entity * points * 3;
        let mut rows = Vec::with_capacity(points);
        for index in 0..points {
            let offset = base + index * 3;
            rows.push(LandmarkRow {
                entity,
                index,
                x: data[offset],
                y: data[offset + 1],
                z: data[offset + 2],
            });
        }
        decoded.push(rows);
    }
    Ok(decoded)
}

fn score_slice(scores: &Tensor, entities: usize) -> Result<Vec<f32>> {
    let values = scores
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("score output is not f32: {e}"))?;
    anyhow::ensure!(
        values.len() == entities,
        "score output length {} does not match {} entities",
        values.len(),
        entities
    );
    Ok(values.to_vec())
}

/// Restrict per-entity rows to a subset of landmark indices, preserving the
/// requested order. Returns `None` when any index is absent.
pub fn select_indices(rows: &[LandmarkRow], indices: &[usize]) -> Option<Vec<LandmarkRow>> {
    indices
        .iter()
        .map(|&idx| rows.iter().find(|row| row.index == idx).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmark_tensor(entities: usize, points: usize) -> Tensor {
        let mut data = Vec::with_capacity(entities * points * 3);
        for e in 0..entities {
            for p in 0..points {
                data.push(e as f32 * 0.1 + p as f32 * 0.01);
                data.push(0.5);
                data.push(-0.02);
            }
        }
        Tensor::from_shape(&[entities, points, 3], &data).unwrap()
    }

    #[test]
    fn decodes_flat_and_batched_shapes() {
        let points = 4;
        let landmarks = landmark_tensor(2, points);
        let scores = Tensor::from_shape(&[2], &[0.9f32, 0.8]).unwrap();
        let decoded = decode_entities(&landmarks, &scores, points, 0.5, 10).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].len(), points);
        assert_eq!(decoded[1][0].entity, 1);

        let batched = Tensor::from_shape(
            &[1, 2, points, 3],
            landmarks.as_slice::<f32>().unwrap(),
        )
        .unwrap();
        let decoded_batched = decode_entities(&batched, &scores, points, 0.5, 10).unwrap();
        assert_eq!(decoded_batched.len(), 2);
    }

    #[test]
    fn filters_by_confidence_and_truncates() {
        let points = 2;
        let landmarks = landmark_tensor(3, points);
        let scores = Tensor::from_shape(&[3], &[0.9f32, 0.2, 0.95]).unwrap();

        let decoded = decode_entities(&landmarks, &scores, points, 0.5, 10).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1][0].entity, 2);

        let truncated = decode_entities(&landmarks, &scores, points, 0.5, 1).unwrap();
        assert_eq!(truncated.len(), 1);
        assert_eq!(truncated[0][0].entity, 0);
    }

    #[test]
    fn rejects_mismatched_point_count() {
        let landmarks = landmark_tensor(1, 5);
        let scores = Tensor::from_shape(&[1], &[0.9f32]).unwrap();
        assert!(decode_entities(&landmarks, &scores, 4, 0.5, 10).is_err());
    }

    #[test]
    fn select_indices_preserves_order_and_detects_gaps() {
        let rows = vec![
            LandmarkRow { entity: 0, index: 10, x: 0.1, y: 0.2, z: 0.0 },
            LandmarkRow { entity: 0, index: 20, x: 0.3, y: 0.4, z: 0.0 },
        ];
        let picked = select_indices(&rows, &[20, 10]).unwrap();
        assert_eq!(picked[0].index, 20);
        assert_eq!(picked[1].index, 10);
        assert!(select_indices(&rows, &[10, 30]).is_none());
    }

    #[test]
    fn pixel_projection_scales_normalized_coordinates() {
        let row = LandmarkRow { entity: 0, index: 1, x: 0.25, y: 0.5, z: 0.0 };
        assert_eq!(row.pixel(200, 100), (50.0, 50.0));
    }
}
