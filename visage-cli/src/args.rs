//! Command-line argument definitions for visage-cli.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Image processing and landmark analysis toolkit.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional settings JSON (defaults to built-in parameters).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable telemetry timing logs.
    #[arg(long, global = true)]
    pub telemetry: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Blur an image (average, Gaussian, median, or bilateral).
    Blur(BlurArgs),
    /// Sharpen an image (Laplacian or unsharp masking).
    Sharpen(SharpenArgs),
    /// Enhance contrast (CLAHE, global equalization, or linear stretch).
    Contrast(ContrastArgs),
    /// Crop a rectangle out of an image.
    Crop(CropArgs),
    /// Resize an image to exact dimensions.
    Resize(ResizeArgs),
    /// Rotate an image by a quarter turn or an arbitrary angle.
    Rotate(RotateArgs),
    /// Convert an image to grayscale.
    Grayscale(IoArgs),
    /// Extract facial landmarks (468-point mesh).
    Mesh(MeshArgs),
    /// Extract hand landmarks (21 points per hand).
    Hands(HandsArgs),
    /// Extract body pose landmarks (33 points).
    Pose(PoseArgs),
    /// Detect faces and save one crop per face.
    Faces(FacesArgs),
    /// Detect objects and report class, box, and confidence.
    Objects(ObjectsArgs),
    /// Compare the identity of faces in two images.
    Compare(CompareArgs),
    /// Report whether the (right) eye is open or closed.
    EyeStatus(EyeStatusArgs),
    /// Estimate head pose (yaw/pitch) per face.
    HeadPose(HeadPoseArgs),
    /// Run a live webcam analysis loop.
    Live(LiveArgs),
    /// List available webcam devices.
    Devices,
}

/// Plain input/output pair shared by the simple operations.
#[derive(Debug, Args)]
pub struct IoArgs {
    /// Path to the input image.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path for the output image.
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BlurKind {
    Average,
    Gaussian,
    Median,
    Bilateral,
}

#[derive(Debug, Args)]
pub struct BlurArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Blur variant to apply.
    #[arg(long, value_enum, default_value_t = BlurKind::Gaussian)]
    pub kind: BlurKind,

    /// Kernel width (average/Gaussian; odd for Gaussian).
    #[arg(long, default_value_t = 5)]
    pub kernel_width: u32,

    /// Kernel height (average/Gaussian; odd for Gaussian).
    #[arg(long, default_value_t = 5)]
    pub kernel_height: u32,

    /// Neighborhood size (median/bilateral).
    #[arg(long, default_value_t = 5)]
    pub filter_size: u32,

    /// Color sigma (bilateral only).
    #[arg(long, default_value_t = 75.0)]
    pub sigma_color: f64,

    /// Space sigma (bilateral only).
    #[arg(long, default_value_t = 75.0)]
    pub sigma_space: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SharpenKind {
    Laplacian,
    Unsharp,
}

#[derive(Debug, Args)]
pub struct SharpenArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Sharpening variant to apply.
    #[arg(long, value_enum, default_value_t = SharpenKind::Unsharp)]
    pub kind: SharpenKind,

    /// Sharpening strength (non-negative).
    #[arg(long, default_value_t = 1.0)]
    pub coefficient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContrastKind {
    Clahe,
    Equalize,
    Stretch,
}

#[derive(Debug, Args)]
pub struct ContrastArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Contrast variant to apply.
    #[arg(long, value_enum, default_value_t = ContrastKind::Clahe)]
    pub kind: ContrastKind,

    /// CLAHE clip limit (positive).
    #[arg(long, default_value_t = 2.0)]
    pub clip_limit: f64,

    /// CLAHE tiles along x.
    #[arg(long, default_value_t = 8)]
    pub tiles_x: u32,

    /// CLAHE tiles along y.
    #[arg(long, default_value_t = 8)]
    pub tiles_y: u32,

    /// Stretch gain (non-negative).
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Stretch offset (0-255).
    #[arg(long, default_value_t = 130)]
    pub beta: i32,
}

#[derive(Debug, Args)]
pub struct CropArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Top-left x coordinate.
    #[arg(long)]
    pub x1: i64,

    /// Top-left y coordinate.
    #[arg(long)]
    pub y1: i64,

    /// Bottom-right x coordinate (exclusive).
    #[arg(long)]
    pub x2: i64,

    /// Bottom-right y coordinate (exclusive).
    #[arg(long)]
    pub y2: i64,
}

#[derive(Debug, Args)]
pub struct ResizeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Target width in pixels.
    #[arg(long)]
    pub width: u32,

    /// Target height in pixels.
    #[arg(long)]
    pub height: u32,
}

#[derive(Debug, Args)]
pub struct RotateArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Rotation angle in degrees. 90/180/270 rotate losslessly; any other
    /// value rotates about the center with bilinear resampling.
    #[arg(long, default_value_t = 90.0)]
    pub angle: f64,

    /// Scale factor for arbitrary-angle rotation (positive).
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
}

/// Arguments shared by the landmark analysis commands.
#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Path to the input image.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to the ONNX model (defaults to the configured model path).
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Minimum detection confidence in [0, 1] (defaults to the configured
    /// value).
    #[arg(long)]
    pub min_confidence: Option<f32>,

    /// Write landmark rows to this CSV file.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write the annotated image to this path.
    #[arg(long)]
    pub annotate: Option<PathBuf>,

    /// Write the JSON record to a file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MeshArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// Maximum number of faces to report (defaults to the configured value).
    #[arg(long)]
    pub max_faces: Option<usize>,

    /// Restrict output to these landmark indices.
    #[arg(long, value_delimiter = ',')]
    pub indices: Option<Vec<usize>>,
}

#[derive(Debug, Args)]
pub struct HandsArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// Maximum number of hands to report (defaults to the configured value).
    #[arg(long)]
    pub max_hands: Option<usize>,

    /// Restrict output to these landmark indices.
    #[arg(long, value_delimiter = ',')]
    pub indices: Option<Vec<usize>>,
}

#[derive(Debug, Args)]
pub struct PoseArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// Restrict output to these landmark indices.
    #[arg(long, value_delimiter = ',')]
    pub indices: Option<Vec<usize>>,
}

#[derive(Debug, Args)]
pub struct FacesArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// Maximum number of faces to crop (defaults to the configured value).
    #[arg(long)]
    pub max_faces: Option<usize>,

    /// Path for the face crops; crop i > 0 gets an `_i` suffix.
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ObjectsArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// IoU threshold for non-maximum suppression (defaults to the
    /// configured value).
    #[arg(long)]
    pub nms_threshold: Option<f32>,

    /// Maximum number of detections to keep (defaults to the configured
    /// value).
    #[arg(long)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First image.
    #[arg(long)]
    pub first: PathBuf,

    /// Second image.
    #[arg(long)]
    pub second: PathBuf,

    /// Path to the embedding ONNX model.
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Cosine similarity threshold for the same/different decision.
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f32,

    /// Minimum face-presence score.
    #[arg(long, default_value_t = 0.5)]
    pub min_confidence: f32,
}

#[derive(Debug, Args)]
pub struct EyeStatusArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// EAR threshold; the eye counts as open strictly above it.
    #[arg(long, default_value_t = 0.2)]
    pub threshold: f32,
}

#[derive(Debug, Args)]
pub struct HeadPoseArgs {
    #[command(flatten)]
    pub detect: DetectArgs,

    /// Maximum number of faces to report (defaults to the configured value).
    #[arg(long)]
    pub max_faces: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LiveTask {
    Mesh,
    EyeStatus,
    HeadPose,
    Hands,
    Pose,
}

#[derive(Debug, Args)]
pub struct LiveArgs {
    /// Analysis to run on each frame.
    #[arg(long, value_enum, default_value_t = LiveTask::Mesh)]
    pub task: LiveTask,

    /// Path to the ONNX model (defaults to the configured model path).
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Webcam device index.
    #[arg(long, default_value_t = 0)]
    pub device: u32,

    /// Requested capture width.
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Requested capture height.
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Requested frame rate.
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Number of frames to process (0 = run until interrupted).
    #[arg(long, default_value_t = 0)]
    pub frames: u32,

    /// Minimum detection confidence in [0, 1] (defaults to the configured
    /// value).
    #[arg(long)]
    pub min_confidence: Option<f32>,

    /// EAR threshold for the eye-status task.
    #[arg(long, default_value_t = 0.2)]
    pub threshold: f32,

    /// Save annotated frames into this directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}
