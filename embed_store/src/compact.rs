// SPDX-License-Identifier: MIT OR Apache-2.0
//! Opaque compact (quantized) matrix capability.
//!
//! Quantization codecs live outside this workspace. The storage layer only
//! needs three things from a compact matrix: its shape, a row dot product,
//! and a row accumulate. Codecs are injected as trait objects; nothing here
//! inspects the encoding.

use std::io::{self, Read, Write};

use crate::mapped::DenseMatrix;

/// Read-only quantized matrix exposing per-row operations.
///
/// Implementations decode on the fly; callers treat rows exactly like dense
/// rows and never see codebooks or subquantizer layout.
pub trait CompactMatrix: Send + Sync {
    /// Number of rows.
    fn rows(&self) -> usize;

    /// Number of columns (decoded width).
    fn cols(&self) -> usize;

    /// Dot product of `v` with the decoded row `r`.
    fn dot_row(&self, v: &[f32], r: usize) -> f32;

    /// Accumulate the decoded row `r` into `target`.
    fn add_row_into(&self, target: &mut [f32], r: usize);

    /// Serialize the compact block, prefixed with whatever the paired
    /// [`CompactCodec`] expects to read back.
    fn save(&self, w: &mut dyn Write) -> io::Result<()>;
}

/// Decoder for compact matrix blocks, injected into model loaders.
pub trait CompactCodec: Send + Sync {
    /// Read one compact matrix block from the stream.
    fn read(&self, r: &mut dyn Read) -> io::Result<Box<dyn CompactMatrix>>;
}

/// Codec used when no quantization support is wired in.
///
/// Loading a model with compact blocks through this codec fails with
/// `InvalidData` instead of misreading the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedCompact;

impl CompactCodec for UnsupportedCompact {
    fn read(&self, _r: &mut dyn Read) -> io::Result<Box<dyn CompactMatrix>> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "model contains a quantized matrix but no compact codec is configured",
        ))
    }
}

/// A weight matrix that is either dense or compact.
///
/// Every consumer pattern-matches here; there is no blanket trait unifying
/// the two, so the dense fast path stays monomorphic.
pub enum WeightMatrix {
    Dense(DenseMatrix),
    Compact(Box<dyn CompactMatrix>),
}

impl WeightMatrix {
    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        match self {
            Self::Dense(m) => m.rows(),
            Self::Compact(m) => m.rows(),
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        match self {
            Self::Dense(m) => m.cols(),
            Self::Compact(m) => m.cols(),
        }
    }

    /// Dot product of `v` with row `r`.
    #[inline]
    #[must_use]
    pub fn dot_row(&self, v: &[f32], r: usize) -> f32 {
        match self {
            Self::Dense(m) => crate::vector::dot(v, m.row(r)),
            Self::Compact(m) => m.dot_row(v, r),
        }
    }

    /// Accumulate row `r` into `target`.
    #[inline]
    pub fn add_row_into(&self, target: &mut [f32], r: usize) {
        match self {
            Self::Dense(m) => crate::vector::add_assign(target, m.row(r)),
            Self::Compact(m) => m.add_row_into(target, r),
        }
    }

    /// Whether this is a compact (quantized) matrix.
    #[must_use]
    pub fn is_compact(&self) -> bool {
        matches!(self, Self::Compact(_))
    }
}

impl std::fmt::Debug for WeightMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dense(m) => f.debug_tuple("Dense").field(m).finish(),
            Self::Compact(m) => f
                .debug_struct("Compact")
                .field("rows", &m.rows())
                .field("cols", &m.cols())
                .finish(),
        }
    }
}
