//! Live webcam analysis loops.
//!
//! Each loop owns one detector for its whole lifetime, processes frames on
//! the calling thread, and skips frames where nothing was detected. The
//! loop ends after `--frames N` frames, or on interrupt when running
//! continuously.

use std::fs;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use visage_core::{
    EyeOptions, FaceMeshDetector, HandDetector, HandOptions, HeadPoseOptions, MeshOptions,
    PoseDetector, PoseOptions, analyze_eye_status, analyze_face_mesh, detect_body_pose,
    detect_hands, estimate_head_pose,
};
use visage_utils::{
    AppSettings, DataPayload, Image, OpResult, WebcamCapture, list_webcam_devices, normalize_path,
};

use crate::args::{LiveArgs, LiveTask};

/// One frame analysis, bound to a long-lived detector.
enum FrameAnalyzer {
    Mesh(FaceMeshDetector, MeshOptions),
    EyeStatus(FaceMeshDetector, EyeOptions),
    HeadPose(FaceMeshDetector, HeadPoseOptions),
    Hands(HandDetector, HandOptions),
    Pose(PoseDetector, PoseOptions),
}

impl FrameAnalyzer {
    fn new(args: &LiveArgs, settings: &AppSettings) -> Result<Self> {
        let min_confidence = args
            .min_confidence
            .unwrap_or(settings.detection.min_confidence);
        let mesh_model = args
            .model
            .clone()
            .unwrap_or_else(|| settings.models.face_mesh.clone());

        Ok(match args.task {
            LiveTask::Mesh => Self::Mesh(
                FaceMeshDetector::from_path(&mesh_model)?,
                MeshOptions {
                    min_confidence,
                    ..Default::default()
                },
            ),
            LiveTask::EyeStatus => Self::EyeStatus(
                FaceMeshDetector::from_path(&mesh_model)?,
                EyeOptions {
                    min_confidence,
                    threshold: args.threshold,
                },
            ),
            LiveTask::HeadPose => Self::HeadPose(
                FaceMeshDetector::from_path(&mesh_model)?,
                HeadPoseOptions {
                    min_confidence,
                    ..Default::default()
                },
            ),
            LiveTask::Hands => Self::Hands(
                HandDetector::from_path(
                    args.model
                        .clone()
                        .unwrap_or_else(|| settings.models.hands.clone()),
                )?,
                HandOptions {
                    min_confidence,
                    ..Default::default()
                },
            ),
            LiveTask::Pose => Self::Pose(
                PoseDetector::from_path(
                    args.model
                        .clone()
                        .unwrap_or_else(|| settings.models.pose.clone()),
                )?,
                PoseOptions {
                    min_confidence,
                    ..Default::default()
                },
            ),
        })
    }

    fn analyze(&self, frame: &Image) -> Result<OpResult> {
        match self {
            Self::Mesh(detector, options) => analyze_face_mesh(frame, detector, options),
            Self::EyeStatus(detector, options) => analyze_eye_status(frame, detector, options),
            Self::HeadPose(detector, options) => estimate_head_pose(frame, detector, options),
            Self::Hands(detector, options) => detect_hands(frame, detector, options),
            Self::Pose(detector, options) => detect_body_pose(frame, detector, options),
        }
    }
}

/// Run the blocking capture-process loop.
pub fn run_live(args: &LiveArgs, settings: &AppSettings) -> Result<()> {
    match list_webcam_devices() {
        Ok(devices) => {
            info!("available webcam devices:");
            for (idx, name) in devices {
                info!("  [{}] {}", idx, name);
            }
        }
        Err(e) => warn!("could not enumerate webcam devices: {}", e),
    }

    let analyzer = FrameAnalyzer::new(args, settings)?;

    let mut webcam = WebcamCapture::with_device_index(args.device, args.width, args.height, args.fps)
        .context("failed to open webcam")?;
    let (actual_width, actual_height) = webcam.resolution();
    info!(
        "webcam opened: {}x{} @ {} fps",
        actual_width,
        actual_height,
        webcam.frame_rate()
    );

    let output_dir = match args.output_dir.as_ref() {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output dir {}", dir.display()))?;
            Some(normalize_path(dir)?)
        }
        None => None,
    };

    let continuous = args.frames == 0;
    if continuous {
        info!("starting live loop (continuous mode - press Ctrl+C to stop)");
    } else {
        info!("starting live loop ({} frames)", args.frames);
    }

    let mut frame_count = 0u32;
    let mut hits = 0u32;
    loop {
        if !continuous && frame_count >= args.frames {
            break;
        }

        let frame = match webcam.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("skipping frame: {}", e);
                continue;
            }
        };
        frame_count += 1;

        let result = analyzer.analyze(&frame)?;
        if result.is_failure() {
            // Expected misses just skip the frame.
            debug!(
                "frame {}: {}",
                frame_count,
                result.error().unwrap_or("nothing detected")
            );
            continue;
        }
        hits += 1;

        log_frame_status(args.task, frame_count, &result);

        if let Some(dir) = output_dir.as_ref() {
            if !result.images().is_empty() {
                let path = dir.join(format!("frame_{frame_count:05}.png"));
                result.save_as_img(&path)?;
            }
        }
    }

    info!(
        "live loop finished: {} of {} frame(s) had detections",
        hits, frame_count
    );
    Ok(())
}

fn log_frame_status(task: LiveTask, frame: u32, result: &OpResult) {
    match (task, result.data()) {
        (LiveTask::EyeStatus, Some(DataPayload::Flag(open))) => {
            info!("frame {}: eye {}", frame, if *open { "open" } else { "closed" });
        }
        (LiveTask::HeadPose, Some(DataPayload::Rows(rows))) => {
            for row in rows {
                if let [face, yaw, pitch] = row.as_slice() {
                    info!(
                        "frame {}: face {} yaw={:.2} pitch={:.2}",
                        frame, face, yaw, pitch
                    );
                }
            }
        }
        (_, Some(DataPayload::Rows(rows))) => {
            debug!("frame {}: {} landmark row(s)", frame, rows.len());
        }
        _ => {}
    }
}

/// Print the available webcam devices.
pub fn run_devices() -> Result<()> {
    let devices = list_webcam_devices()?;
    if devices.is_empty() {
        println!("no webcam devices found");
    }
    for (idx, name) in devices {
        println!("[{idx}] {name}");
    }
    Ok(())
}
