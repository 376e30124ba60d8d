//! Handlers for the detection and heuristic subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use visage_core::{
    CompareOptions, EyeOptions, FaceEmbedder, FaceMeshDetector, FaceOptions, HandDetector,
    HandOptions, HeadPoseOptions, MeshOptions, ObjectDetector, ObjectOptions, PoseDetector,
    PoseOptions, analyze_eye_status, analyze_face_mesh, compare_faces, detect_body_pose,
    detect_faces, detect_hands, detect_objects, estimate_head_pose,
};
use visage_utils::{AppSettings, DataPayload, Image, OpResult};

use crate::args::{
    CompareArgs, DetectArgs, EyeStatusArgs, FacesArgs, HandsArgs, HeadPoseArgs, MeshArgs,
    ObjectsArgs, PoseArgs,
};
use crate::types::AnalysisRecord;

pub fn run_mesh(args: &MeshArgs, settings: &AppSettings) -> Result<()> {
    let image = Image::from_path(&args.detect.input)?;
    let detector =
        FaceMeshDetector::from_path(model_path(&args.detect.model, &settings.models.face_mesh))?;
    let options = MeshOptions {
        max_faces: args.max_faces.unwrap_or(settings.detection.max_faces),
        min_confidence: confidence(&args.detect, settings),
        landmark_indices: args.indices.clone(),
    };
    let result = analyze_face_mesh(&image, &detector, &options)?;
    report(&args.detect, &result)
}

pub fn run_hands(args: &HandsArgs, settings: &AppSettings) -> Result<()> {
    let image = Image::from_path(&args.detect.input)?;
    let detector = HandDetector::from_path(model_path(&args.detect.model, &settings.models.hands))?;
    let options = HandOptions {
        max_hands: args.max_hands.unwrap_or(settings.detection.max_hands),
        min_confidence: confidence(&args.detect, settings),
        landmark_indices: args.indices.clone(),
    };
    let result = detect_hands(&image, &detector, &options)?;
    report(&args.detect, &result)
}

pub fn run_pose(args: &PoseArgs, settings: &AppSettings) -> Result<()> {
    let image = Image::from_path(&args.detect.input)?;
    let detector = PoseDetector::from_path(model_path(&args.detect.model, &settings.models.pose))?;
    let options = PoseOptions {
        min_confidence: confidence(&args.detect, settings),
        landmark_indices: args.indices.clone(),
    };
    let result = detect_body_pose(&image, &detector, &options)?;
    report(&args.detect, &result)
}

pub fn run_faces(args: &FacesArgs, settings: &AppSettings) -> Result<()> {
    let image = Image::from_path(&args.detect.input)?;
    let detector =
        FaceMeshDetector::from_path(model_path(&args.detect.model, &settings.models.face_mesh))?;
    let options = FaceOptions {
        max_faces: args.max_faces.unwrap_or(settings.detection.max_faces),
        min_confidence: confidence(&args.detect, settings),
    };
    let result = detect_faces(&image, &detector, &options)?;

    if result.is_failure() {
        warn!(
            "{}: {}",
            args.detect.input.display(),
            result.error().unwrap_or("detection failed")
        );
    } else {
        result.save_as_img_with(&args.output, &settings.output.encoder_options())?;
        info!(
            "{} -> {} face crop(s) at {}",
            args.detect.input.display(),
            result.images().len(),
            args.output.display()
        );
    }
    report(&args.detect, &result)
}

pub fn run_objects(args: &ObjectsArgs, settings: &AppSettings) -> Result<()> {
    let image = Image::from_path(&args.detect.input)?;
    let detector =
        ObjectDetector::from_path(model_path(&args.detect.model, &settings.models.objects))?;
    let options = ObjectOptions {
        min_confidence: confidence(&args.detect, settings),
        nms_threshold: args.nms_threshold.unwrap_or(settings.detection.nms_threshold),
        top_k: args.top_k.unwrap_or(settings.detection.top_k),
    };
    let result = detect_objects(&image, &detector, &options)?;
    report(&args.detect, &result)
}

pub fn run_compare(args: &CompareArgs, settings: &AppSettings) -> Result<()> {
    let first = Image::from_path(&args.first)?;
    let second = Image::from_path(&args.second)?;
    let embedder = FaceEmbedder::from_path(model_path(&args.model, &settings.models.embedding))?;
    let options = CompareOptions {
        threshold: args.threshold,
        min_confidence: args.min_confidence,
    };
    let result = compare_faces(&first, &second, &embedder, &options)?;

    match result.data() {
        Some(DataPayload::Flag(same)) => {
            let similarity = result
                .meta()
                .get("similarity")
                .and_then(|v| v.as_f64())
                .unwrap_or(f64::NAN);
            info!(
                "{} vs {}: {} (similarity {:.4})",
                args.first.display(),
                args.second.display(),
                if *same { "same identity" } else { "different identity" },
                similarity
            );
        }
        _ => warn!("{}", result.error().unwrap_or("comparison failed")),
    }
    print_record(&AnalysisRecord::from_result(&args.first, &result), None)
}

pub fn run_eye_status(args: &EyeStatusArgs, settings: &AppSettings) -> Result<()> {
    let image = Image::from_path(&args.detect.input)?;
    let detector =
        FaceMeshDetector::from_path(model_path(&args.detect.model, &settings.models.face_mesh))?;
    let options = EyeOptions {
        min_confidence: confidence(&args.detect, settings),
        threshold: args.threshold,
    };
    let result = analyze_eye_status(&image, &detector, &options)?;

    match result.data() {
        Some(DataPayload::Flag(open)) => {
            info!(
                "{}: eye {}",
                args.detect.input.display(),
                if *open { "open" } else { "closed" }
            );
        }
        _ => warn!(
            "{}: {}",
            args.detect.input.display(),
            result.error().unwrap_or("analysis failed")
        ),
    }
    report(&args.detect, &result)
}

pub fn run_head_pose(args: &HeadPoseArgs, settings: &AppSettings) -> Result<()> {
    let image = Image::from_path(&args.detect.input)?;
    let detector =
        FaceMeshDetector::from_path(model_path(&args.detect.model, &settings.models.face_mesh))?;
    let options = HeadPoseOptions {
        max_faces: args.max_faces.unwrap_or(settings.detection.max_faces),
        min_confidence: confidence(&args.detect, settings),
    };
    let result = estimate_head_pose(&image, &detector, &options)?;

    if let Some(DataPayload::Rows(rows)) = result.data() {
        for row in rows {
            if let [face, yaw, pitch] = row.as_slice() {
                info!("face {}: yaw={:.2}, pitch={:.2}", face, yaw, pitch);
            }
        }
    }
    report(&args.detect, &result)
}

/// Resolve the model path: explicit flag wins over the configured default.
fn model_path<'a>(explicit: &'a Option<PathBuf>, configured: &'a Path) -> &'a Path {
    explicit.as_deref().unwrap_or(configured)
}

/// Resolve the confidence threshold the same way.
fn confidence(args: &DetectArgs, settings: &AppSettings) -> f32 {
    args.min_confidence
        .unwrap_or(settings.detection.min_confidence)
}

/// Shared output handling: CSV rows, annotated image, and the JSON record.
fn report(args: &DetectArgs, result: &OpResult) -> Result<()> {
    if result.is_failure() {
        warn!(
            "{}: {}",
            args.input.display(),
            result.error().unwrap_or("detection failed")
        );
    }

    if let Some(csv_path) = &args.csv {
        if result.data().is_some() {
            result.save_as_csv(csv_path, None)?;
            info!("landmark rows written to {}", csv_path.display());
        } else {
            warn!("no data to write to {}", csv_path.display());
        }
    }

    if let Some(annotate_path) = &args.annotate {
        if result.images().is_empty() {
            warn!("no annotated image to write to {}", annotate_path.display());
        } else {
            result.save_as_img(annotate_path)?;
            info!("annotated image written to {}", annotate_path.display());
        }
    }

    print_record(
        &AnalysisRecord::from_result(&args.input, result),
        args.json.as_deref(),
    )
}

fn print_record(record: &AnalysisRecord, json_path: Option<&Path>) -> Result<()> {
    let serialized = serde_json::to_string_pretty(record).context("failed to encode record")?;
    match json_path {
        Some(path) => {
            std::fs::write(path, &serialized)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("record written to {}", path.display());
        }
        None => println!("{serialized}"),
    }
    Ok(())
}
