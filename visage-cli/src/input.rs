//! Input collection helpers.

use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

/// Collect all image paths from a file or directory.
pub fn collect_images(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!(
            "input path is neither file nor directory: {}",
            path.display()
        );
    }

    let exts = ["jpg", "jpeg", "png", "bmp", "webp"];
    let mut images = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| exts.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if matches {
            images.push(entry.path().to_path_buf());
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collects_images_recursively_and_sorted() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("sub")).unwrap();
        for name in ["b.png", "a.jpg", "sub/c.webp", "notes.txt"] {
            fs::write(td.path().join(name), b"x").unwrap();
        }

        let images = collect_images(td.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.strip_prefix(td.path()).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.jpg", "b.png", "sub/c.webp"]);
    }

    #[test]
    fn single_file_passes_through() {
        let td = tempdir().unwrap();
        let file = td.path().join("one.png");
        fs::write(&file, b"x").unwrap();
        assert_eq!(collect_images(&file).unwrap(), vec![file]);
    }
}
