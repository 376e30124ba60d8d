//! Test fixture loading and path resolution.

use anyhow::{Context, Result};
use image::DynamicImage;
use std::{
    env,
    path::{Path, PathBuf},
};

const FIXTURE_ENV: &str = "VISAGE_FIXTURE_ROOT";

/// Resolve the root directory that stores project fixtures.
///
/// Searches for a `fixtures` directory in the following order:
/// 1. The path specified by the `VISAGE_FIXTURE_ROOT` environment variable.
/// 2. Ancestor directories of the current crate's manifest directory.
pub fn fixtures_dir() -> Result<PathBuf> {
    if let Ok(value) = env::var(FIXTURE_ENV) {
        return Ok(PathBuf::from(value));
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join("fixtures");
        if candidate.is_dir() {
            return Ok(candidate.to_path_buf());
        }
    }

    anyhow::bail!(
        "fixtures directory not found starting from {}",
        manifest_dir.display()
    );
}

/// Resolve a path inside the fixture folder, ensuring the file exists.
pub fn fixture_path<P: AsRef<Path>>(relative: P) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let root = fixtures_dir()?;
    let full = root.join(relative);
    anyhow::ensure!(
        full.exists(),
        "fixture {} not found under {}",
        relative.display(),
        root.display()
    );
    Ok(full)
}

/// Load a fixture image into memory.
pub fn load_fixture_image<P: AsRef<Path>>(relative: P) -> Result<DynamicImage> {
    let path = fixture_path(relative)?;
    image::open(&path).with_context(|| format!("failed to decode fixture {}", path.display()))
}
