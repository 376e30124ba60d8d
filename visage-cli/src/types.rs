//! Shared serializable record types for visage-cli.

use std::path::Path;

use serde::Serialize;
use visage_utils::OpResult;

/// A serializable record of one analysis result for one image.
#[derive(Debug, Serialize)]
pub struct AnalysisRecord {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl AnalysisRecord {
    /// Build a record from an operation result.
    pub fn from_result(image: &Path, result: &OpResult) -> Self {
        Self {
            image: image.display().to_string(),
            operation: result
                .meta()
                .get("operation")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            error: result.error().map(str::to_string),
            data: result.data().map(|payload| payload.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_utils::{DataPayload, OpResult};

    #[test]
    fn record_captures_error_and_data() {
        let miss = OpResult::failure("detect_faces", "no face landmarks detected");
        let record = AnalysisRecord::from_result(Path::new("a.jpg"), &miss);
        assert_eq!(record.error.as_deref(), Some("no face landmarks detected"));
        assert!(record.data.is_none());

        let hit = OpResult::from_data(DataPayload::Flag(true)).with_operation("analyze_eye_status");
        let record = AnalysisRecord::from_result(Path::new("a.jpg"), &hit);
        assert_eq!(record.operation.as_deref(), Some("analyze_eye_status"));
        assert_eq!(record.data, Some(serde_json::Value::Bool(true)));
    }
}
