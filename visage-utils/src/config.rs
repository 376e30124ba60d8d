//! Shared configuration types consumed across the visage workspace.
//!
//! These structures provide a common representation for detector, operation,
//! and output settings that can be serialized to disk and reused by the CLI
//! and embedding callers.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Shared detection parameters for the landmark detectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionSettings {
    /// Maximum number of faces to report per image.
    pub max_faces: usize,
    /// Maximum number of hands to report per image.
    pub max_hands: usize,
    /// Minimum confidence score for a detection to be considered valid.
    pub min_confidence: f32,
    /// Threshold for non-maximum suppression when merging object boxes.
    pub nms_threshold: f32,
    /// Maximum number of object detections to return after sorting by score.
    pub top_k: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            max_faces: 1,
            max_hands: 2,
            min_confidence: 0.7,
            nms_threshold: 0.3,
            top_k: 100,
        }
    }
}

impl DetectionSettings {
    /// Clamp values to sensible ranges.
    pub fn clamped(mut self) -> Self {
        self.max_faces = self.max_faces.max(1);
        self.max_hands = self.max_hands.max(1);
        self.min_confidence = self.min_confidence.clamp(0.0, 1.0);
        self.nms_threshold = self.nms_threshold.clamp(0.0, 1.0);
        self
    }
}

/// Filesystem locations of the bundled ONNX models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub face_mesh: PathBuf,
    pub hands: PathBuf,
    pub pose: PathBuf,
    pub objects: PathBuf,
    pub embedding: PathBuf,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            face_mesh: PathBuf::from("models/face_mesh_468.onnx"),
            hands: PathBuf::from("models/hand_landmarks_21.onnx"),
            pose: PathBuf::from("models/body_pose_33.onnx"),
            objects: PathBuf::from("models/object_detector.onnx"),
            embedding: PathBuf::from("models/face_embedding_512.onnx"),
        }
    }
}

/// Settings for exported images. The output format itself follows the
/// destination extension; these tune the encoders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Prefer fast PNG compression over smaller files.
    pub png_fast: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            png_fast: false,
        }
    }
}

impl OutputSettings {
    pub fn clamped(mut self) -> Self {
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self
    }

    /// Encoder options derived from these settings.
    pub fn encoder_options(&self) -> crate::output::OutputOptions {
        crate::output::OutputOptions {
            format: None,
            jpeg_quality: self.jpeg_quality,
            png_fast: self.png_fast,
        }
    }
}

/// Telemetry preferences persisted alongside the rest of the settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Enable timing logs for detector and operation stages.
    pub enabled: bool,
    /// Maximum level at which timing logs are emitted.
    pub level: String,
}

impl TelemetrySettings {
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_ascii_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }
}

/// Top-level application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppSettings {
    pub detection: DetectionSettings,
    pub models: ModelSettings,
    pub output: OutputSettings,
    pub telemetry: TelemetrySettings,
}

impl AppSettings {
    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON {}", path.display()))?;
        Ok(settings.clamped())
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("failed to encode settings")?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Normalize all nested values to their documented ranges.
    pub fn clamped(mut self) -> Self {
        self.detection = self.detection.clamped();
        self.output = self.output.clamped();
        self
    }
}
