//! The operation result value object.
//!
//! Every pipeline operation returns an [`OpResult`]: zero or more output
//! images, an optional structured data payload, and a metadata map recording
//! which operation produced it and with which parameters.
//!
//! Expected misses (no face found, required landmark absent) are encoded as
//! *sentinel failures*: an empty result whose metadata carries an `error`
//! key. Invalid parameters, by contrast, are raised as errors before any
//! work happens. The two tiers are deliberate and must not be collapsed.

use std::path::Path;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::{
    error::VisageError,
    image::Image,
    output::{OutputOptions, append_suffix_to_filename, save_dynamic_image},
};

/// Metadata map attached to every result.
pub type Meta = Map<String, Value>;

/// Structured (non-image) payload of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    /// A single yes/no outcome (e.g. eye open, same identity).
    Flag(bool),
    /// A single numeric value.
    Scalar(f64),
    /// One row of numbers.
    Row(Vec<f64>),
    /// A table of rows (landmark rows, detection boxes, pose angles).
    Rows(Vec<Vec<f64>>),
}

impl DataPayload {
    /// JSON view of the payload, used by the CLI's serialized records.
    pub fn to_json(&self) -> Value {
        match self {
            DataPayload::Flag(flag) => Value::Bool(*flag),
            DataPayload::Scalar(value) => serde_json::json!(value),
            DataPayload::Row(row) => serde_json::json!(row),
            DataPayload::Rows(rows) => serde_json::json!(rows),
        }
    }
}

/// Output of one pipeline operation.
#[derive(Debug, Clone, Default)]
pub struct OpResult {
    images: Vec<Image>,
    data: Option<DataPayload>,
    meta: Meta,
}

impl OpResult {
    /// Result carrying a single image.
    pub fn from_image(image: Image) -> Self {
        Self {
            images: vec![image],
            data: None,
            meta: Meta::new(),
        }
    }

    /// Result carrying several images (e.g. one crop per detected face).
    pub fn from_images(images: Vec<Image>) -> Self {
        Self {
            images,
            data: None,
            meta: Meta::new(),
        }
    }

    /// Result carrying only structured data.
    pub fn from_data(data: DataPayload) -> Self {
        Self {
            images: Vec::new(),
            data: Some(data),
            meta: Meta::new(),
        }
    }

    /// Sentinel failure: empty image and data, `error` key populated.
    ///
    /// Used for expected misses (nothing detected, landmark absent) so that
    /// batch and live callers can continue past a single bad frame.
    pub fn failure(operation: &str, error: impl Into<String>) -> Self {
        let mut result = Self::default();
        result
            .meta
            .insert("operation".into(), Value::String(operation.into()));
        result
            .meta
            .insert("error".into(), Value::String(error.into()));
        result
    }

    /// Record the operation name in metadata.
    pub fn with_operation(mut self, operation: &str) -> Self {
        self.meta
            .insert("operation".into(), Value::String(operation.into()));
        self
    }

    /// Record an input parameter in metadata.
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Attach a data payload.
    pub fn with_data(mut self, data: DataPayload) -> Self {
        self.data = Some(data);
        self
    }

    /// Borrow the first image; [`VisageError::EmptyResult`] when none.
    pub fn image(&self) -> Result<&Image> {
        self.images
            .first()
            .ok_or_else(|| VisageError::EmptyResult("this result does not contain an image").into())
    }

    /// Defensive copy of the first image.
    pub fn to_image(&self) -> Result<Image> {
        self.image().cloned()
    }

    /// All images carried by this result (possibly empty).
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn data(&self) -> Option<&DataPayload> {
        self.data.as_ref()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// The sentinel error message, when this result encodes a miss.
    pub fn error(&self) -> Option<&str> {
        self.meta.get("error").and_then(Value::as_str)
    }

    /// True when this result encodes a sentinel failure.
    pub fn is_failure(&self) -> bool {
        self.meta.contains_key("error")
    }

    /// Save the carried image(s) to disk.
    ///
    /// The first image keeps the given path; image *i* (i > 0) is written to
    /// `<stem>_<i><suffix>`, preserving the extension. Fails with
    /// [`VisageError::EmptyResult`] when no image is present,
    /// [`VisageError::InvalidInput`] for a malformed path, and
    /// [`VisageError::IoFailure`] when the encoder rejects the write.
    pub fn save_as_img<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_as_img_with(path, &OutputOptions::default())
    }

    /// [`OpResult::save_as_img`] with explicit encoder options.
    pub fn save_as_img_with<P: AsRef<Path>>(&self, path: P, options: &OutputOptions) -> Result<()> {
        let path = path.as_ref();
        if self.images.is_empty() {
            return Err(VisageError::EmptyResult("no image to save in this result").into());
        }
        let name = path
            .to_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VisageError::invalid("output path must be valid non-empty UTF-8"))?;
        if path.file_name().is_none() {
            return Err(
                VisageError::invalid(format!("output path '{name}' has no file name")).into(),
            );
        }

        for (idx, img) in self.images.iter().enumerate() {
            let target = if idx == 0 {
                name.to_string()
            } else {
                append_suffix_to_filename(name, &format!("_{idx}"))
            };
            save_dynamic_image(img.as_dynamic(), Path::new(&target), options)?;
        }
        Ok(())
    }

    /// Serialize the data payload (or explicit `rows`) to CSV.
    ///
    /// A `Rows` payload serializes verbatim, a `Row` as one record, and a
    /// `Flag`/`Scalar` as a one-field record. Fails with
    /// [`VisageError::EmptyResult`] when neither rows nor a payload exist.
    pub fn save_as_csv<P: AsRef<Path>>(&self, path: P, rows: Option<&[Vec<f64>]>) -> Result<()> {
        let path = path.as_ref();
        let payload = match rows {
            Some(rows) => DataPayload::Rows(rows.to_vec()),
            None => self
                .data
                .clone()
                .ok_or(VisageError::EmptyResult("no data available to save as CSV"))?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
            std::fs::create_dir_all(parent).map_err(|e| VisageError::io(parent, e))?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(|e| VisageError::io(path, e))?;
        match payload {
            DataPayload::Rows(rows) => {
                for row in rows {
                    write_row(&mut writer, path, &row)?;
                }
            }
            DataPayload::Row(row) => write_row(&mut writer, path, &row)?,
            DataPayload::Scalar(value) => write_row(&mut writer, path, &[value])?,
            DataPayload::Flag(flag) => {
                writer
                    .write_record([flag.to_string()])
                    .map_err(|e| VisageError::io(path, e))?;
            }
        }
        writer.flush().map_err(|e| VisageError::io(path, e))?;
        Ok(())
    }
}

fn write_row(writer: &mut csv::Writer<std::fs::File>, path: &Path, row: &[f64]) -> Result<()> {
    let record: Vec<String> = row.iter().map(|v| format_number(*v)).collect();
    writer
        .write_record(&record)
        .map_err(|e| VisageError::io(path, e))?;
    Ok(())
}

/// Render integers without a trailing `.0` so CSV ids stay readable.
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::classify;
    use crate::image::ColorSpace;
    use image::{DynamicImage, RgbImage};
    use tempfile::tempdir;

    fn solid(width: u32, height: u32) -> Image {
        let buf = RgbImage::from_pixel(width, height, image::Rgb([9, 9, 9]));
        Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
    }

    #[test]
    fn image_accessor_fails_on_empty_result() {
        let result = OpResult::from_data(DataPayload::Flag(true));
        let err = result.image().unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::EmptyResult(_))));
    }

    #[test]
    fn sentinel_failure_carries_error_key() {
        let result = OpResult::failure("analyze_face_mesh", "no face landmarks detected");
        assert!(result.is_failure());
        assert_eq!(result.error(), Some("no face landmarks detected"));
        assert!(result.images().is_empty());
        assert!(result.data().is_none());
    }

    #[test]
    fn save_as_img_numbers_list_outputs() {
        let td = tempdir().unwrap();
        let base = td.path().join("out.jpg");
        let result = OpResult::from_images(vec![solid(4, 4), solid(4, 4), solid(4, 4)]);
        result.save_as_img(&base).unwrap();

        assert!(td.path().join("out.jpg").exists());
        assert!(td.path().join("out_1.jpg").exists());
        assert!(td.path().join("out_2.jpg").exists());
        assert!(!td.path().join("out_3.jpg").exists());
    }

    #[test]
    fn save_as_img_preserves_non_jpg_extensions() {
        let td = tempdir().unwrap();
        let base = td.path().join("mesh.png");
        let result = OpResult::from_images(vec![solid(4, 4), solid(4, 4)]);
        result.save_as_img(&base).unwrap();
        assert!(td.path().join("mesh_1.png").exists());
    }

    #[test]
    fn save_as_img_requires_an_image() {
        let td = tempdir().unwrap();
        let result = OpResult::from_data(DataPayload::Scalar(1.0));
        let err = result.save_as_img(td.path().join("x.png")).unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::EmptyResult(_))));
    }

    #[test]
    fn save_as_csv_serializes_rows_row_and_scalar() {
        let td = tempdir().unwrap();

        let rows = OpResult::from_data(DataPayload::Rows(vec![
            vec![0.0, 1.0, 0.25, 0.5, 0.0],
            vec![0.0, 2.0, 0.75, 0.5, 0.0],
        ]));
        let rows_path = td.path().join("rows.csv");
        rows.save_as_csv(&rows_path, None).unwrap();
        let contents = std::fs::read_to_string(&rows_path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("0,1,0.25,0.5,0"));

        let row = OpResult::from_data(DataPayload::Row(vec![1.0, 2.5]));
        let row_path = td.path().join("row.csv");
        row.save_as_csv(&row_path, None).unwrap();
        assert_eq!(std::fs::read_to_string(&row_path).unwrap().trim(), "1,2.5");

        let flag = OpResult::from_data(DataPayload::Flag(true));
        let flag_path = td.path().join("flag.csv");
        flag.save_as_csv(&flag_path, None).unwrap();
        assert_eq!(std::fs::read_to_string(&flag_path).unwrap().trim(), "true");
    }

    #[test]
    fn save_as_csv_explicit_rows_override_payload() {
        let td = tempdir().unwrap();
        let result = OpResult::from_data(DataPayload::Flag(false));
        let path = td.path().join("override.csv");
        result
            .save_as_csv(&path, Some(&[vec![3.0, 4.0]]))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "3,4");
    }

    #[test]
    fn save_as_csv_without_data_fails() {
        let td = tempdir().unwrap();
        let result = OpResult::from_image(solid(2, 2));
        let err = result
            .save_as_csv(td.path().join("none.csv"), None)
            .unwrap_err();
        assert!(matches!(classify(&err), Some(VisageError::EmptyResult(_))));
    }

    #[test]
    fn metadata_builder_records_operation_and_params() {
        let result = OpResult::from_image(solid(2, 2))
            .with_operation("apply_gaussian_blur")
            .with_param("kernel_size", serde_json::json!([5, 5]));
        assert_eq!(
            result.meta().get("operation").and_then(Value::as_str),
            Some("apply_gaussian_blur")
        );
        assert!(!result.is_failure());
    }
}
