// SPDX-License-Identifier: MIT OR Apache-2.0
//! Float vector and matrix storage for embedding models.
//!
//! Three interchangeable dense backings sit behind one row interface:
//! eager in-memory arrays, a single whole-file memory map, and a
//! multi-region map for matrices too large for one contiguous mapping.
//! Quantized matrices enter through the opaque [`CompactMatrix`] capability
//! and are dispatched alongside dense ones via [`WeightMatrix`].
//!
//! All arithmetic is single precision end to end; see [`vector`].

pub mod compact;
pub mod error;
pub mod mapped;
pub mod matrix;
pub mod vector;

pub use compact::{CompactCodec, CompactMatrix, UnsupportedCompact, WeightMatrix};
pub use error::{MatrixError, Result};
pub use mapped::{DenseMatrix, MappedMatrix, MatrixBacking, RegionConfig, RegionalMatrix};
pub use matrix::{ArrayMatrix, MATRIX_HEADER_BYTES};
pub use vector::DenseVector;
