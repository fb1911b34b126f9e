// SPDX-License-Identifier: MIT OR Apache-2.0
use std::io;

use thiserror::Error;

/// Errors from matrix storage and the dense wire layout.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File body is shorter than the header-declared shape requires.
    #[error("matrix file truncated: expected {expected} data bytes, found {found}")]
    Truncated { expected: u64, found: u64 },

    /// Header declares a negative or overflowing shape.
    #[error("invalid matrix shape: {rows} x {cols}")]
    InvalidShape { rows: i64, cols: i64 },

    /// Row or vector length does not match the matrix geometry.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result type for matrix storage operations.
pub type Result<T> = std::result::Result<T, MatrixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = MatrixError::Truncated {
            expected: 400,
            found: 128,
        };
        assert_eq!(
            e.to_string(),
            "matrix file truncated: expected 400 data bytes, found 128"
        );

        let e = MatrixError::InvalidShape { rows: -1, cols: 10 };
        assert_eq!(e.to_string(), "invalid matrix shape: -1 x 10");

        let e = MatrixError::DimensionMismatch {
            expected: 100,
            got: 64,
        };
        assert_eq!(e.to_string(), "dimension mismatch: expected 100, got 64");
    }
}
