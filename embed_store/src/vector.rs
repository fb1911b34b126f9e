// SPDX-License-Identifier: MIT OR Apache-2.0
//! Single-precision vector views and scratch buffers.
//!
//! Every operation accumulates in `f32`. Widening to `f64` would change
//! low-order bits relative to the reference models, so it is deliberately
//! avoided throughout.

use std::ops::{Deref, DerefMut};

/// Dot product of two equal-length slices.
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");
    let mut sum = 0.0f32;
    for i in 0..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

/// Euclidean (L2) norm.
#[inline]
#[must_use]
pub fn norm2(a: &[f32]) -> f32 {
    norm2_sq(a).sqrt()
}

/// Squared Euclidean norm.
#[inline]
#[must_use]
pub fn norm2_sq(a: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for &x in a {
        sum += x * x;
    }
    sum
}

/// Elementwise `a += b`.
#[inline]
pub fn add_assign(a: &mut [f32], b: &[f32]) {
    assert_eq!(a.len(), b.len(), "add_assign: length mismatch");
    for i in 0..a.len() {
        a[i] += b[i];
    }
}

/// Elementwise `a += s * b`.
#[inline]
pub fn add_scaled(a: &mut [f32], s: f32, b: &[f32]) {
    assert_eq!(a.len(), b.len(), "add_scaled: length mismatch");
    for i in 0..a.len() {
        a[i] += s * b[i];
    }
}

/// Elementwise `a -= b`.
#[inline]
pub fn sub_assign(a: &mut [f32], b: &[f32]) {
    assert_eq!(a.len(), b.len(), "sub_assign: length mismatch");
    for i in 0..a.len() {
        a[i] -= b[i];
    }
}

/// Elementwise `a -= s * b`.
#[inline]
pub fn sub_scaled(a: &mut [f32], s: f32, b: &[f32]) {
    assert_eq!(a.len(), b.len(), "sub_scaled: length mismatch");
    for i in 0..a.len() {
        a[i] -= s * b[i];
    }
}

/// In-place scalar multiply.
#[inline]
pub fn scale(a: &mut [f32], s: f32) {
    for x in a {
        *x *= s;
    }
}

/// Owned fixed-length `f32` vector.
///
/// Used for per-call scratch buffers (hidden representation, output
/// distribution) and for composed query vectors. Derefs to `[f32]`, so the
/// free functions above apply directly.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseVector {
    data: Vec<f32>,
}

impl DenseVector {
    /// Zero-filled vector of the given length.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    /// Wrap an existing buffer.
    #[must_use]
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Reset every element to zero.
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Fill every element with `v`.
    pub fn fill(&mut self, v: f32) {
        self.data.fill(v);
    }

    /// Overwrite this vector with the contents of `src`.
    ///
    /// # Panics
    ///
    /// Panics if `src` has a different length.
    pub fn assign(&mut self, src: &[f32]) {
        assert_eq!(self.data.len(), src.len(), "assign: length mismatch");
        self.data.copy_from_slice(src);
    }

    /// Read-only window of `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the vector length.
    #[must_use]
    pub fn subvector(&self, offset: usize, len: usize) -> &[f32] {
        &self.data[offset..offset + len]
    }

    /// Underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Underlying mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume into the backing `Vec`.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl Deref for DenseVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl DerefMut for DenseVector {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
