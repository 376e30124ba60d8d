//! Generic object detection.
//!
//! The object model emits `[N, 6]` rows `[x1, y1, x2, y2, score, class]` in
//! normalized coordinates. Decoding filters by score, sorts by confidence,
//! keeps the strongest `top_k`, and applies greedy IoU non-maximum
//! suppression.

use std::cmp::Ordering;
use std::path::Path;

use anyhow::Result;
use tract_onnx::prelude::Tensor;
use visage_utils::{DataPayload, Image, OpResult, VisageError, timing_guard};

use crate::draw::draw_object_boxes;
use crate::model::InferenceModel;
use crate::preprocess::{InputSize, preprocess_image};
use crate::validate::ensure_confidence;

/// Default object model input resolution.
pub const OBJECT_INPUT_SIZE: InputSize = InputSize::new(640, 640);

/// Axis-aligned bounding box in normalized `[0, 1]` coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// The x-coordinate of the top-left corner.
    pub x: f32,
    /// The y-coordinate of the top-left corner.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Build a box from corner coordinates, clamping into `[0, 1]`.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let x1 = x1.clamp(0.0, 1.0);
        let y1 = y1.clamp(0.0, 1.0);
        let x2 = x2.clamp(0.0, 1.0);
        let y2 = y2.clamp(0.0, 1.0);
        Self {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0.0),
            height: (y2 - y1).max(0.0),
        }
    }

    /// Corner form `(x1, y1, x2, y2)`.
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &Self) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if intersection <= 0.0 {
            return 0.0;
        }

        let union = self.area() + other.area() - intersection;
        if union <= 0.0 { 0.0 } else { intersection / union }
    }
}

/// A single object detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDetection {
    pub class_id: u32,
    pub bbox: BoundingBox,
    pub score: f32,
}

impl ObjectDetection {
    /// CSV row form: `[class, x1, y1, x2, y2, confidence]`.
    pub fn to_row(&self) -> Vec<f64> {
        let (x1, y1, x2, y2) = self.bbox.corners();
        vec![
            self.class_id as f64,
            x1 as f64,
            y1 as f64,
            x2 as f64,
            y2 as f64,
            self.score as f64,
        ]
    }
}

/// Options for [`detect_objects`].
#[derive(Debug, Clone)]
pub struct ObjectOptions {
    /// Minimum confidence score for a detection to be kept.
    pub min_confidence: f32,
    /// IoU threshold for non-maximum suppression (0 disables NMS).
    pub nms_threshold: f32,
    /// Maximum number of detections to return (0 means unlimited).
    pub top_k: usize,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            nms_threshold: 0.3,
            top_k: 100,
        }
    }
}

/// Anything that can produce object detections for an image.
pub trait ObjectSource {
    fn objects(&self, image: &Image, options: &ObjectOptions) -> Result<Vec<ObjectDetection>>;
}

/// Reusable object detector wrapping an ONNX model.
#[derive(Debug)]
pub struct ObjectDetector {
    model: InferenceModel,
}

impl ObjectDetector {
    pub fn from_path<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::with_input_size(model_path, OBJECT_INPUT_SIZE)
    }

    pub fn with_input_size<P: AsRef<Path>>(model_path: P, input_size: InputSize) -> Result<Self> {
        Ok(Self {
            model: InferenceModel::load(model_path, input_size)?,
        })
    }
}

impl ObjectSource for ObjectDetector {
    fn objects(&self, image: &Image, options: &ObjectOptions) -> Result<Vec<ObjectDetection>> {
        let _guard = timing_guard("visage_core::object_detect", log::Level::Debug);
        let prep = preprocess_image(image, self.model.input_size())?;
        let outputs = self.model.run(prep.tensor)?;
        decode_objects(&outputs[0], options)
    }
}

/// Decode the raw object tensor into filtered, suppressed detections.
pub fn decode_objects(output: &Tensor, options: &ObjectOptions) -> Result<Vec<ObjectDetection>> {
    let shape = output.shape();
    let rows = match shape {
        [rows, 6] => *rows,
        [1, rows, 6] => *rows,
        other => anyhow::bail!(
            "object output must have shape [N, 6] or [1, N, 6] (got {other:?})"
        ),
    };
    let data = output
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("object output is not f32: {e}"))?;

    let mut detections = Vec::with_capacity(rows);
    for row in 0..rows {
        let offset = row * 6;
        let score = data[offset + 4];
        if !score.is_finite() || score < options.min_confidence {
            continue;
        }
        let bbox = BoundingBox::from_corners(
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        );
        if bbox.width <= 0.0 || bbox.height <= 0.0 {
            continue;
        }
        detections.push(ObjectDetection {
            class_id: data[offset + 5].max(0.0) as u32,
            bbox,
            score,
        });
    }

    detections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    if options.top_k > 0 && detections.len() > options.top_k {
        detections.truncate(options.top_k);
    }

    if options.nms_threshold > 0.0 && detections.len() > 1 {
        detections = non_max_suppression(detections, options.nms_threshold);
    }

    Ok(detections)
}

/// Greedy non-maximum suppression over score-sorted detections.
fn non_max_suppression(mut detections: Vec<ObjectDetection>, threshold: f32) -> Vec<ObjectDetection> {
    let mut result: Vec<ObjectDetection> = Vec::with_capacity(detections.len());
    for detection in detections.drain(..) {
        let suppressed = result
            .iter()
            .any(|kept| detection.bbox.iou(&kept.bbox) > threshold);
        if !suppressed {
            result.push(detection);
        }
    }
    result
}

/// Run object detection on a single image.
///
/// The result's data is one row `[class, x1, y1, x2, y2, confidence]` per
/// object and its image is a copy of the input with boxes drawn. No object
/// above threshold yields a sentinel failure.
pub fn detect_objects<S: ObjectSource>(
    image: &Image,
    detector: &S,
    options: &ObjectOptions,
) -> Result<OpResult> {
    ensure_confidence("min_confidence", options.min_confidence)?;
    ensure_confidence("nms_threshold", options.nms_threshold)?;

    let detections = detector.objects(image, options)?;
    if detections.is_empty() {
        return Ok(OpResult::failure(
            "detect_objects",
            VisageError::miss("no objects detected").to_string(),
        )
        .with_param("min_confidence", options.min_confidence)
        .with_param("nms_threshold", options.nms_threshold));
    }

    let annotated = draw_object_boxes(image, &detections);
    let rows: Vec<Vec<f64>> = detections.iter().map(ObjectDetection::to_row).collect();

    Ok(OpResult::from_image(annotated)
        .with_data(DataPayload::Rows(rows))
        .with_operation("detect_objects")
        .with_param("min_confidence", options.min_confidence)
        .with_param("nms_threshold", options.nms_threshold)
        .with_param("top_k", options.top_k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor_from_rows(rows: &[[f32; 6]]) -> Tensor {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        Tensor::from_shape(&[rows.len(), 6], &flat).unwrap()
    }

    #[test]
    fn filters_by_score_and_clamps_coordinates() {
        let tensor = tensor_from_rows(&[
            [0.1, 0.1, 0.5, 0.5, 0.9, 2.0],
            [0.6, 0.6, 0.8, 0.8, 0.2, 1.0],
            [-0.2, 0.0, 1.4, 0.5, 0.8, 0.0],
        ]);

        let detections = decode_objects(&tensor, &ObjectOptions::default()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_id, 2);
        let (x1, _, x2, _) = detections[1].bbox.corners();
        assert_eq!(x1, 0.0);
        assert_eq!(x2, 1.0);
    }

    #[test]
    fn applies_non_max_suppression() {
        let tensor = tensor_from_rows(&[
            [0.0, 0.0, 0.5, 0.5, 0.99, 0.0],
            [0.02, 0.02, 0.52, 0.52, 0.95, 0.0],
            [0.6, 0.6, 0.9, 0.9, 0.90, 1.0],
        ]);

        let detections = decode_objects(&tensor, &ObjectOptions::default()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].score, 0.99);
        assert_eq!(detections[1].class_id, 1);
    }

    #[test]
    fn top_k_truncates_after_sorting() {
        let tensor = tensor_from_rows(&[
            [0.0, 0.0, 0.2, 0.2, 0.6, 0.0],
            [0.4, 0.4, 0.6, 0.6, 0.9, 1.0],
            [0.7, 0.7, 0.9, 0.9, 0.8, 2.0],
        ]);

        let detections = decode_objects(
            &tensor,
            &ObjectOptions {
                top_k: 2,
                nms_threshold: 0.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_id, 1);
        assert_eq!(detections[1].class_id, 2);
    }

    #[test]
    fn handles_batched_output_shape() {
        let tensor = Tensor::from_shape(
            &[1, 1, 6],
            &[0.1f32, 0.1, 0.3, 0.3, 0.9, 4.0],
        )
        .unwrap();
        let detections = decode_objects(&tensor, &ObjectOptions::default()).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 4);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox::from_corners(0.0, 0.0, 0.2, 0.2);
        let b = BoundingBox::from_corners(0.5, 0.5, 0.7, 0.7);
        assert_eq!(a.iou(&b), 0.0);
        assert!(a.iou(&a) > 0.99);
    }
}
