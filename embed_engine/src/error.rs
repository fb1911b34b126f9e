// SPDX-License-Identifier: MIT OR Apache-2.0
use std::io;

use thiserror::Error;

/// Errors from model loading, saving, and the text-model facade.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Underlying I/O failure (missing file, short read, ...).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream does not start with the expected magic number.
    #[error("not a recognized model file: bad magic {0}")]
    BadMagic(i32),

    /// The stream declares a format version newer than this loader.
    #[error("unsupported model format version {0}")]
    UnsupportedVersion(i32),

    /// Unknown loss code in the hyperparameter block.
    #[error("unknown loss code {0}")]
    UnknownLoss(i32),

    /// Unknown model-kind code in the hyperparameter block.
    #[error("unknown model kind code {0}")]
    UnknownModelKind(i32),

    /// A pruned lexicon was paired with an unquantized input matrix.
    #[error(
        "pruned lexicon requires a quantized input matrix; \
         re-save the model with quantization or restore the full lexicon"
    )]
    PrunedWithoutQuant,

    /// Matrix storage error.
    #[error(transparent)]
    Matrix(#[from] embed_store::MatrixError),

    /// Model construction or inference error.
    #[error(transparent)]
    Model(#[from] embed_model::ModelError),

    /// Lexicon implementation rejected its block.
    #[error("lexicon error: {0}")]
    Lexicon(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
