//! Face identity comparison via embedding vectors.

use std::path::Path;

use anyhow::Result;
use visage_utils::{DataPayload, Image, OpResult, VisageError, timing_guard};

use crate::model::InferenceModel;
use crate::preprocess::{InputSize, preprocess_image};
use crate::validate::ensure_confidence;

/// Default embedding model input resolution.
pub const EMBEDDING_INPUT_SIZE: InputSize = InputSize::new(112, 112);

/// Cosine similarity above which two embeddings count as the same identity.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Options for [`compare_faces`].
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Similarity threshold for the same/different decision.
    pub threshold: f32,
    /// Minimum face-presence score for an embedding to count.
    pub min_confidence: f32,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_confidence: 0.5,
        }
    }
}

/// Anything that can produce a face embedding for an image.
///
/// Returns `None` when no face is present in the image.
pub trait EmbeddingSource {
    fn embedding(&self, image: &Image, min_confidence: f32) -> Result<Option<Vec<f32>>>;
}

/// Reusable face embedding model.
///
/// The model outputs a fixed-length embedding `[1, D]` and a face-presence
/// score `[1]`; a score below the requested confidence means no usable face.
#[derive(Debug)]
pub struct FaceEmbedder {
    model: InferenceModel,
}

impl FaceEmbedder {
    pub fn from_path<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Ok(Self {
            model: InferenceModel::load(model_path, EMBEDDING_INPUT_SIZE)?,
        })
    }
}

impl EmbeddingSource for FaceEmbedder {
    fn embedding(&self, image: &Image, min_confidence: f32) -> Result<Option<Vec<f32>>> {
        let _guard = timing_guard("visage_core::face_embed", log::Level::Debug);
        let prep = preprocess_image(image, self.model.input_size())?;
        let outputs = self.model.run(prep.tensor)?;

        if outputs.len() >= 2 {
            let scores = outputs[1]
                .as_slice::<f32>()
                .map_err(|e| anyhow::anyhow!("presence output is not f32: {e}"))?;
            if scores.first().copied().unwrap_or(0.0) < min_confidence {
                return Ok(None);
            }
        }

        let embedding = outputs[0]
            .as_slice::<f32>()
            .map_err(|e| anyhow::anyhow!("embedding output is not f32: {e}"))?;
        anyhow::ensure!(!embedding.is_empty(), "embedding output is empty");
        Ok(Some(embedding.to_vec()))
    }
}

/// Cosine similarity of two embedding vectors.
///
/// Zero-norm inputs yield 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Decide whether two images show the same identity.
///
/// The result's data is a flag (true = same identity above threshold) and
/// metadata records the raw similarity. A face absent from either image
/// yields a sentinel failure.
pub fn compare_faces<S: EmbeddingSource>(
    image_1: &Image,
    image_2: &Image,
    embedder: &S,
    options: &CompareOptions,
) -> Result<OpResult> {
    ensure_confidence("threshold", options.threshold)?;
    ensure_confidence("min_confidence", options.min_confidence)?;

    let first = embedder.embedding(image_1, options.min_confidence)?;
    let second = embedder.embedding(image_2, options.min_confidence)?;

    let (Some(first), Some(second)) = (first, second) else {
        return Ok(OpResult::failure(
            "compare_faces",
            VisageError::miss("no face detected in one or both images").to_string(),
        )
        .with_param("threshold", options.threshold));
    };

    let similarity = cosine_similarity(&first, &second);
    Ok(
        OpResult::from_data(DataPayload::Flag(similarity > options.threshold))
            .with_operation("compare_faces")
            .with_param("similarity", similarity)
            .with_param("threshold", options.threshold),
    )
}
