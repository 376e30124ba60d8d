//! Reusable landmark detector objects.
//!
//! Each detector couples one ONNX model with its decode parameters and is
//! intended to be constructed once and reused across calls (model loading
//! dominates per-call cost on live video). Instances are caller-owned and
//! not reentrant: do not share one across concurrently running threads.
//!
//! The pipeline functions accept any [`LandmarkSource`] rather than a
//! concrete detector, which keeps them testable without model files on disk.

use std::path::Path;

use anyhow::Result;
use visage_utils::{Image, timing_guard};

use crate::landmarks::{
    BODY_POSE_POINTS, FACE_MESH_POINTS, HAND_POINTS, LandmarkRow, decode_entities,
};
use crate::model::InferenceModel;
use crate::preprocess::{InputSize, preprocess_image};

/// Default face mesh model input resolution.
pub const MESH_INPUT_SIZE: InputSize = InputSize::new(192, 192);
/// Default hand landmark model input resolution.
pub const HAND_INPUT_SIZE: InputSize = InputSize::new(224, 224);
/// Default body pose model input resolution.
pub const POSE_INPUT_SIZE: InputSize = InputSize::new(256, 256);

/// Anything that can produce per-entity landmark rows for an image.
///
/// Implemented by the concrete detectors below; tests substitute canned
/// sources.
pub trait LandmarkSource {
    /// Run one inference call and decode per-entity landmark rows.
    ///
    /// Returns an empty vector when nothing clears `min_confidence`.
    fn landmarks(
        &self,
        image: &Image,
        max_entities: usize,
        min_confidence: f32,
    ) -> Result<Vec<Vec<LandmarkRow>>>;
}

macro_rules! landmark_detector {
    ($name:ident, $points:expr, $input:expr, $label:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug)]
        pub struct $name {
            model: InferenceModel,
        }

        impl $name {
            /// Load the model from an ONNX file at its default input size.
            pub fn from_path<P: AsRef<Path>>(model_path: P) -> Result<Self> {
                Self::with_input_size(model_path, $input)
            }

            /// Load the model with an explicit input resolution.
            pub fn with_input_size<P: AsRef<Path>>(
                model_path: P,
                input_size: InputSize,
            ) -> Result<Self> {
                Ok(Self {
                    model: InferenceModel::load(model_path, input_size)?,
                })
            }
        }

        impl LandmarkSource for $name {
            fn landmarks(
                &self,
                image: &Image,
                max_entities: usize,
                min_confidence: f32,
            ) -> Result<Vec<Vec<LandmarkRow>>> {
                let _guard = timing_guard($label, log::Level::Debug);
                let prep = preprocess_image(image, self.model.input_size())?;
                let outputs = self.model.run(prep.tensor)?;
                anyhow::ensure!(
                    outputs.len() >= 2,
                    "landmark model must output landmarks and scores (got {} tensors)",
                    outputs.len()
                );
                decode_entities(
                    &outputs[0],
                    &outputs[1],
                    $points,
                    min_confidence,
                    max_entities,
                )
            }
        }
    };
}

landmark_detector!(
    FaceMeshDetector,
    FACE_MESH_POINTS,
    MESH_INPUT_SIZE,
    "visage_core::mesh_detect",
    "Face mesh detector producing a fixed 468-point set per face."
);

landmark_detector!(
    HandDetector,
    HAND_POINTS,
    HAND_INPUT_SIZE,
    "visage_core::hand_detect",
    "Hand landmark detector producing a fixed 21-point set per hand."
);

landmark_detector!(
    PoseDetector,
    BODY_POSE_POINTS,
    POSE_INPUT_SIZE,
    "visage_core::pose_detect",
    "Body pose detector producing a fixed 33-point set for one subject."
);

#[cfg(test)]
pub(crate) mod stubs {
    use super::*;

    /// Canned landmark source for pipeline tests.
    pub struct StubSource {
        pub entities: Vec<Vec<LandmarkRow>>,
    }

    impl StubSource {
        /// A source with `entities` copies of a uniform grid of `points`
        /// landmarks, every coordinate set to (0.5, 0.5, 0.0).
        pub fn uniform(points: usize, entities: usize) -> Self {
            let entities = (0..entities)
                .map(|entity| {
                    (0..points)
                        .map(|index| LandmarkRow {
                            entity,
                            index,
                            x: 0.5,
                            y: 0.5,
                            z: 0.0,
                        })
                        .collect()
                })
                .collect();
            Self { entities }
        }

        /// A source that detects nothing.
        pub fn empty() -> Self {
            Self {
                entities: Vec::new(),
            }
        }
    }

    impl LandmarkSource for StubSource {
        fn landmarks(
            &self,
            _image: &Image,
            max_entities: usize,
            _min_confidence: f32,
        ) -> Result<Vec<Vec<LandmarkRow>>> {
            Ok(self
                .entities
                .iter()
                .take(max_entities)
                .cloned()
                .collect())
        }
    }
}
