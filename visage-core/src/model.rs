//! ONNX model loading and execution.
//!
//! All detectors share one wrapper around a `tract-onnx` runnable model.
//! Loading prefers the optimized graph and falls back to the decluttered
//! form when optimization fails (some exported graphs carry ops the
//! optimizer cannot fuse).

use std::{fmt::Write, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};
use tract_onnx::prelude::{
    Framework, Graph, InferenceModelExt, IntoTensor, SimplePlan, Tensor, TypedFact, TypedOp, tvec,
};

use crate::preprocess::InputSize;

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Wrapper around a runnable ONNX graph.
///
/// Instances are expensive to construct and intended to be reused across
/// calls. They are not reentrant: callers must not share one instance
/// across concurrently running threads.
#[derive(Debug)]
pub struct InferenceModel {
    runnable: RunnableModel,
    input_size: InputSize,
}

impl InferenceModel {
    /// Load and optimize an ONNX graph for a specific input size.
    pub fn load<P: AsRef<Path>>(model_path: P, input_size: InputSize) -> Result<Self> {
        let path = model_path.as_ref();
        anyhow::ensure!(path.exists(), "model file not found: {}", path.display());

        let runnable = match load_runnable_model(path, true) {
            Ok(model) => {
                debug!(
                    "model {} optimized successfully ({}x{})",
                    path.display(),
                    input_size.width,
                    input_size.height
                );
                model
            }
            Err(opt_err) => {
                let optimize_msg = format!("{opt_err}");
                let mut chain_msg = String::new();
                for cause in opt_err.chain() {
                    let _ = writeln!(&mut chain_msg, "  - {cause}");
                }
                warn!(
                    "model {} failed optimized load ({}); falling back to decluttered graph.\nError chain:\n{}",
                    path.display(),
                    optimize_msg,
                    chain_msg.trim_end()
                );
                load_runnable_model(path, false).with_context(|| {
                    format!(
                        "fallback to decluttered graph failed after optimize error: {optimize_msg}"
                    )
                })?
            }
        };

        Ok(Self {
            runnable,
            input_size,
        })
    }

    /// Execute the model with a preprocessed tensor.
    ///
    /// Returns every output tensor in graph order; each detector knows the
    /// shapes it expects and validates them during decoding.
    pub fn run(&self, input: Tensor) -> Result<Vec<Tensor>> {
        let outputs = self
            .runnable
            .run(tvec![input.into()])
            .map_err(|e| anyhow::anyhow!("model execution failed: {e}"))?;

        let tensors: Vec<Tensor> = outputs
            .into_iter()
            .map(|value| value.into_tensor())
            .collect();
        anyhow::ensure!(!tensors.is_empty(), "model produced no outputs");
        Ok(tensors)
    }

    pub fn input_size(&self) -> InputSize {
        self.input_size
    }
}

fn load_runnable_model(path: &Path, optimized: bool) -> Result<RunnableModel> {
    let model = tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("failed to parse ONNX graph from {}", path.display()))?;

    if optimized {
        model
            .into_optimized()
            .map_err(|e| anyhow::anyhow!("unable to optimize graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make graph runnable: {e}"))
    } else {
        model
            .into_typed()
            .map_err(|e| anyhow::anyhow!("unable to type-check graph: {e}"))?
            .into_decluttered()
            .map_err(|e| anyhow::anyhow!("unable to declutter graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make graph runnable: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loading_missing_model_fails() {
        let result = InferenceModel::load("missing.onnx", InputSize::new(192, 192));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_model_produces_useful_error() {
        let mut temp = NamedTempFile::new().expect("temp file");
        temp.write_all(b"not a real onnx file")
            .expect("write mock model");

        let err = InferenceModel::load(temp.path(), InputSize::new(192, 192))
            .expect_err("invalid ONNX should fail");
        let message = format!("{err}");
        assert!(
            message.contains("failed to parse ONNX") || message.contains("unable to optimize"),
            "unexpected error message: {message}"
        );
    }
}
