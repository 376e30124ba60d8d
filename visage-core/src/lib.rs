//! Landmark inference, geometric heuristics, and image pipeline operations.
//!
//! This crate loads the bundled ONNX models with `tract-onnx`, translates
//! their outputs into a common landmark row format, derives eye-status and
//! head-pose measurements from the landmark geometry, and provides the
//! canonical image operations (blur, sharpen, contrast, crop, resize,
//! rotate, grayscale).

/// Reusable detector objects and the detection seam.
pub mod detector;
/// Drawing helpers for annotated output.
pub mod draw;
/// Face identity comparison via embeddings.
pub mod embedding;
/// Eye open/closed status via the Eye Aspect Ratio.
pub mod eye;
/// Face detection and cropping via the mesh outline.
pub mod face;
/// Hand landmark extraction.
pub mod hands;
/// Head pose (yaw/pitch) from landmark geometry.
pub mod head_pose;
/// Landmark row representation and tensor decoding.
pub mod landmarks;
/// Facial landmark extraction (468-point mesh).
pub mod mesh;
/// ONNX model loading and execution.
pub mod model;
/// Object detection.
pub mod objects;
/// Canonical image pipeline operations.
pub mod ops;
/// Body pose landmark extraction.
pub mod pose;
/// Image-to-tensor preprocessing.
pub mod preprocess;

pub(crate) mod validate;

pub use detector::{
    FaceMeshDetector, HAND_INPUT_SIZE, HandDetector, LandmarkSource, MESH_INPUT_SIZE,
    POSE_INPUT_SIZE, PoseDetector,
};
pub use draw::{draw_landmark_rows, draw_object_boxes};
pub use embedding::{
    CompareOptions, DEFAULT_SIMILARITY_THRESHOLD, EMBEDDING_INPUT_SIZE, EmbeddingSource,
    FaceEmbedder, compare_faces, cosine_similarity,
};
pub use eye::{DEFAULT_EAR_THRESHOLD, EyeMetrics, EyeOptions, analyze_eye_status, eye_metrics};
pub use face::{FaceOptions, detect_faces};
pub use hands::{HandOptions, detect_hands};
pub use head_pose::{HeadPose, HeadPoseOptions, estimate_head_pose, head_pose_angles};
pub use landmarks::{
    BODY_POSE_POINTS, FACE_MESH_POINTS, FACE_OUTLINE_INDICES, HAND_POINTS, HEAD_POSE_INDICES,
    LandmarkRow, RIGHT_EYE_INDICES,
};
pub use mesh::{MeshOptions, analyze_face_mesh};
pub use model::InferenceModel;
pub use objects::{
    BoundingBox, OBJECT_INPUT_SIZE, ObjectDetection, ObjectDetector, ObjectOptions, ObjectSource,
    detect_objects,
};
pub use ops::{
    apply_average_blur, apply_bilateral_blur, apply_clahe_contrast, apply_contrast_stretching,
    apply_gaussian_blur, apply_histogram_equalization, apply_laplacian_sharpening,
    apply_median_blur, apply_unsharp_masking, convert_to_grayscale, crop_image, resize_image,
    rotate_image_90, rotate_image_180, rotate_image_270, rotate_image_custom,
};
pub use pose::{PoseOptions, detect_body_pose};
pub use preprocess::{InputSize, PreprocessOutput, preprocess_image};

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
