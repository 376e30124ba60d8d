//! Common value objects and helpers shared across the visage crates.

/// Application configuration and settings management.
pub mod config;
/// The shared error taxonomy.
pub mod error;
/// Test fixture loading and path resolution.
pub mod fixtures;
/// The `Image` value object plus loading and tensor-staging helpers.
pub mod image;
/// Image output helpers (encoding, filename suffixing).
pub mod output;
/// The operation result value object and its save helpers.
pub mod result;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;
/// Webcam capture for live analysis modes.
pub mod webcam;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use config::{AppSettings, DetectionSettings, ModelSettings, OutputSettings};
pub use error::{VisageError, classify};
pub use fixtures::{fixture_path, fixtures_dir, load_fixture_image};
pub use image::{ColorSpace, Image, SourceKind, load_image, resize_image, rgb_to_chw};
pub use output::{ImageFormatHint, OutputOptions, append_suffix_to_filename, save_dynamic_image};
pub use result::{DataPayload, Meta, OpResult};
pub use telemetry::{
    TimingGuard, configure as configure_telemetry, telemetry_allows, telemetry_enabled,
    telemetry_level, timing_guard, timing_guard_if,
};
pub use webcam::{WebcamCapture, list_webcam_devices};

/// Initialize logging once for CLI and embedding environments.
///
/// Respects the `RUST_LOG` environment variable if it is set; otherwise
/// falls back to the provided default filter level.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module("visage::telemetry", LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
