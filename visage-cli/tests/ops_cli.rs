//! Integration tests for the model-free operation subcommands.

use std::path::Path;
use std::process::Command;

use image::{Rgb, RgbImage};
use tempfile::tempdir;

fn visage() -> Command {
    Command::new(env!("CARGO_BIN_EXE_visage"))
}

fn write_test_image(path: &Path, width: u32, height: u32) {
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 17 + y * 31) % 256) as u8;
            img.put_pixel(x, y, Rgb([v, 255 - v, 128]));
        }
    }
    img.save(path).expect("write test image");
}

#[test]
fn blur_writes_output_of_same_size() {
    let td = tempdir().unwrap();
    let input = td.path().join("in.png");
    let output = td.path().join("out.png");
    write_test_image(&input, 32, 24);

    let status = visage()
        .args(["blur", "--kind", "gaussian", "--kernel-width", "5", "--kernel-height", "5"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .expect("run visage blur");

    assert!(status.success());
    let out = image::open(&output).unwrap();
    assert_eq!((out.width(), out.height()), (32, 24));
}

#[test]
fn even_gaussian_kernel_fails_with_error() {
    let td = tempdir().unwrap();
    let input = td.path().join("in.png");
    write_test_image(&input, 16, 16);

    let output = visage()
        .args(["blur", "--kind", "gaussian", "--kernel-width", "4"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(td.path().join("out.png"))
        .output()
        .expect("run visage blur");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid input"), "stderr: {stderr}");
}

#[test]
fn crop_resize_rotate_chain() {
    let td = tempdir().unwrap();
    let input = td.path().join("in.png");
    write_test_image(&input, 40, 30);

    let cropped = td.path().join("cropped.png");
    let status = visage()
        .args(["crop", "--x1", "5", "--y1", "5", "--x2", "25", "--y2", "20"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&cropped)
        .status()
        .unwrap();
    assert!(status.success());
    let out = image::open(&cropped).unwrap();
    assert_eq!((out.width(), out.height()), (20, 15));

    let resized = td.path().join("resized.png");
    let status = visage()
        .args(["resize", "--width", "10", "--height", "10"])
        .arg("--input")
        .arg(&cropped)
        .arg("--output")
        .arg(&resized)
        .status()
        .unwrap();
    assert!(status.success());

    let rotated = td.path().join("rotated.png");
    let status = visage()
        .args(["rotate", "--angle", "90"])
        .arg("--input")
        .arg(&resized)
        .arg("--output")
        .arg(&rotated)
        .status()
        .unwrap();
    assert!(status.success());
    let out = image::open(&rotated).unwrap();
    assert_eq!((out.width(), out.height()), (10, 10));
}

#[test]
fn out_of_bounds_crop_is_rejected() {
    let td = tempdir().unwrap();
    let input = td.path().join("in.png");
    write_test_image(&input, 10, 10);

    let output = visage()
        .args(["crop", "--x1", "0", "--y1", "0", "--x2", "20", "--y2", "20"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(td.path().join("out.png"))
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn grayscale_writes_an_output_file() {
    let td = tempdir().unwrap();
    let input = td.path().join("in.png");
    let output = td.path().join("gray.png");
    write_test_image(&input, 12, 12);

    let status = visage()
        .arg("grayscale")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(output.exists());
}

#[test]
fn contrast_stretch_runs_on_jpeg_input() {
    let td = tempdir().unwrap();
    let input = td.path().join("in.jpg");
    let output = td.path().join("out.jpg");
    write_test_image(&input, 20, 20);

    let status = visage()
        .args(["contrast", "--kind", "stretch", "--alpha", "1.2", "--beta", "5"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(output.metadata().unwrap().len() > 0);
}

#[test]
fn directory_input_processes_every_image() {
    let td = tempdir().unwrap();
    let in_dir = td.path().join("in");
    let out_dir = td.path().join("out");
    std::fs::create_dir(&in_dir).unwrap();
    write_test_image(&in_dir.join("one.png"), 8, 8);
    write_test_image(&in_dir.join("two.png"), 8, 8);

    let status = visage()
        .arg("grayscale")
        .arg("--input")
        .arg(&in_dir)
        .arg("--output")
        .arg(&out_dir)
        .status()
        .unwrap();

    assert!(status.success());
    assert!(out_dir.join("one.png").exists());
    assert!(out_dir.join("two.png").exists());
}

#[test]
fn missing_input_is_rejected() {
    let td = tempdir().unwrap();

    let output = visage()
        .arg("grayscale")
        .arg("--input")
        .arg(td.path().join("nope.png"))
        .arg("--output")
        .arg(td.path().join("out.png"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("neither file nor directory"),
        "stderr: {stderr}"
    );
}
