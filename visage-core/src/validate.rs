//! Fail-fast parameter validation shared by the pipeline functions.
//!
//! Every check raises [`VisageError::InvalidInput`] before any inference or
//! pixel work happens. Nothing here is ever retried.

use anyhow::Result;
use visage_utils::VisageError;

/// Confidence thresholds must lie in `[0, 1]`.
pub(crate) fn ensure_confidence(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(
            VisageError::invalid(format!("'{name}' must be between 0 and 1, got {value}")).into(),
        );
    }
    Ok(())
}

/// Entity counts (max faces, max hands) must be at least one.
pub(crate) fn ensure_count(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(VisageError::invalid(format!("'{name}' must be a positive integer")).into());
    }
    Ok(())
}

/// Kernel dimensions must both be positive.
pub(crate) fn ensure_kernel_positive(name: &str, kernel: (u32, u32)) -> Result<()> {
    if kernel.0 == 0 || kernel.1 == 0 {
        return Err(VisageError::invalid(format!(
            "'{name}' must be a pair of positive integers, got ({}, {})",
            kernel.0, kernel.1
        ))
        .into());
    }
    Ok(())
}

/// Kernel dimensions must both be odd positive integers.
pub(crate) fn ensure_kernel_odd(name: &str, kernel: (u32, u32)) -> Result<()> {
    ensure_kernel_positive(name, kernel)?;
    if kernel.0 % 2 == 0 || kernel.1 % 2 == 0 {
        return Err(VisageError::invalid(format!(
            "'{name}' must be a pair of odd integers, got ({}, {})",
            kernel.0, kernel.1
        ))
        .into());
    }
    Ok(())
}

/// Scalars that must be strictly positive (sigma, clip limit, scale).
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(
            VisageError::invalid(format!("'{name}' must be a positive number, got {value}")).into(),
        );
    }
    Ok(())
}

/// Scalars that must be zero or greater (sharpening coefficients).
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(VisageError::invalid(format!(
            "'{name}' must be a non-negative number, got {value}"
        ))
        .into());
    }
    Ok(())
}
