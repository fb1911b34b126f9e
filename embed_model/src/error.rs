// SPDX-License-Identifier: MIT OR Apache-2.0
use thiserror::Error;

/// Errors from target-distribution construction and inference.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// No active feature indices were supplied.
    #[error("no active input features")]
    EmptyInput,

    /// Target counts are empty or sum to zero.
    #[error("degenerate target distribution: counts are empty or all zero")]
    DegenerateDistribution,

    /// The count vector does not cover the output vocabulary.
    #[error("target count mismatch: expected {expected} counts, got {got}")]
    CountMismatch { expected: usize, got: usize },

    /// Hierarchical prediction requested before the tree was built.
    #[error("hierarchical targets not built; call set_target_counts first")]
    TreeNotBuilt,

    /// A buffer length does not match the model dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(ModelError::EmptyInput.to_string(), "no active input features");
        assert_eq!(
            ModelError::CountMismatch { expected: 4, got: 2 }.to_string(),
            "target count mismatch: expected 4 counts, got 2"
        );
    }
}
