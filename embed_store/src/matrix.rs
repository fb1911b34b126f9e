// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory row-major float matrix.
//!
//! # Wire layout
//!
//! Every dense matrix file or stream block uses the same layout:
//!
//! ```text
//! rows: 4 bytes (little-endian i32)
//! cols: 4 bytes (little-endian i32)
//! data: rows * cols f32 values (little-endian), row-major
//! ```

use std::io::{Read, Write};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{MatrixError, Result};

/// Size in bytes of the `rows`/`cols` wire header.
pub const MATRIX_HEADER_BYTES: usize = 8;

pub(crate) fn read_i32<R: Read>(r: &mut R) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Parse and validate a `rows`/`cols` header.
pub(crate) fn read_shape<R: Read>(r: &mut R) -> Result<(usize, usize)> {
    let rows = read_i32(r)?;
    let cols = read_i32(r)?;
    if rows < 0 || cols < 0 {
        return Err(MatrixError::InvalidShape {
            rows: i64::from(rows),
            cols: i64::from(cols),
        });
    }
    Ok((rows as usize, cols as usize))
}

/// Mutable row-major matrix backed by a flat `Vec<f32>`.
///
/// This is the backing used for moderate models loaded eagerly and the only
/// backing a trainer may write into.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl ArrayMatrix {
    /// Zero-filled matrix.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(MatrixError::DimensionMismatch {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Matrix initialized uniformly in `[-1/cols, 1/cols)` from a seed.
    ///
    /// Deterministic for a fixed seed; used for fresh embedding matrices.
    #[must_use]
    pub fn uniform(rows: usize, cols: usize, seed: u64) -> Self {
        if cols == 0 {
            return Self::zeros(rows, 0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bound = 1.0 / cols as f32;
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(-bound..bound))
            .collect();
        Self { rows, cols, data }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Read-only row view.
    #[inline]
    #[must_use]
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Mutable row view.
    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [f32] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Single element.
    #[inline]
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    /// Set a single element.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    /// Fill the whole matrix with `v`.
    pub fn fill(&mut self, v: f32) {
        self.data.fill(v);
    }

    /// Flat row-major data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Read a matrix block (header + data) from a byte stream.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` for a negative header, `Io` for a short read.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let (rows, cols) = read_shape(r)?;
        let mut data = vec![0.0f32; rows * cols];
        let mut buf = [0u8; 4];
        for slot in &mut data {
            r.read_exact(&mut buf)?;
            *slot = f32::from_le_bytes(buf);
        }
        Ok(Self { rows, cols, data })
    }

    /// Write a matrix block (header + data) to a byte stream.
    ///
    /// # Errors
    ///
    /// Returns any underlying I/O error.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&(self.rows as i32).to_le_bytes())?;
        w.write_all(&(self.cols as i32).to_le_bytes())?;
        for &v in &self.data {
            w.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }
}
