// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hyperparameter block and its fixed positional wire layout.
//!
//! The block is twelve little-endian `i32` fields followed by one `f64`,
//! in the exact order reference models write them. Field order is the
//! format; there are no tags.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Magic number opening a reference model stream.
pub const MODEL_MAGIC: i32 = 793_712_314;

/// Newest format version this loader accepts.
pub const MODEL_VERSION: i32 = 12;

pub(crate) fn read_i32<R: Read>(r: &mut R) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub(crate) fn read_f64<R: Read>(r: &mut R) -> std::io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

pub(crate) fn read_u8<R: Read>(r: &mut R) -> std::io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// What the model was trained as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Cbow,
    Skipgram,
    Supervised,
}

impl ModelKind {
    pub(crate) fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Self::Cbow),
            2 => Ok(Self::Skipgram),
            3 => Ok(Self::Supervised),
            other => Err(EngineError::UnknownModelKind(other)),
        }
    }

    pub(crate) const fn code(self) -> i32 {
        match self {
            Self::Cbow => 1,
            Self::Skipgram => 2,
            Self::Supervised => 3,
        }
    }
}

/// Training loss wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossKind {
    HierarchicalSoftmax,
    NegativeSampling,
    Softmax,
}

impl LossKind {
    pub(crate) fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Self::HierarchicalSoftmax),
            2 => Ok(Self::NegativeSampling),
            3 => Ok(Self::Softmax),
            other => Err(EngineError::UnknownLoss(other)),
        }
    }

    pub(crate) const fn code(self) -> i32 {
        match self {
            Self::HierarchicalSoftmax => 1,
            Self::NegativeSampling => 2,
            Self::Softmax => 3,
        }
    }
}

impl From<LossKind> for embed_model::Loss {
    fn from(k: LossKind) -> Self {
        match k {
            LossKind::HierarchicalSoftmax => Self::HierarchicalSoftmax,
            LossKind::NegativeSampling => Self::NegativeSampling,
            LossKind::Softmax => Self::Softmax,
        }
    }
}

/// Hyperparameters carried by every model file.
///
/// Training-only fields (learning-rate schedule, epochs, window) are kept
/// so saved models round-trip byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub dim: usize,
    pub ws: i32,
    pub epoch: i32,
    pub min_count: i32,
    pub neg: i32,
    pub word_ngrams: i32,
    pub loss: LossKind,
    pub model: ModelKind,
    pub bucket: i32,
    pub minn: i32,
    pub maxn: i32,
    pub lr_update_rate: i32,
    pub sampling_threshold: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            dim: 100,
            ws: 5,
            epoch: 5,
            min_count: 1,
            neg: 5,
            word_ngrams: 1,
            loss: LossKind::Softmax,
            model: ModelKind::Supervised,
            bucket: 2_000_000,
            minn: 0,
            maxn: 0,
            lr_update_rate: 100,
            sampling_threshold: 1e-4,
        }
    }
}

impl ModelParams {
    /// Read the positional block.
    ///
    /// # Errors
    ///
    /// Returns `Io` on a short read, `UnknownLoss`/`UnknownModelKind` for
    /// unrecognized codes.
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let dim = read_i32(r)?;
        let ws = read_i32(r)?;
        let epoch = read_i32(r)?;
        let min_count = read_i32(r)?;
        let neg = read_i32(r)?;
        let word_ngrams = read_i32(r)?;
        let loss = LossKind::from_code(read_i32(r)?)?;
        let model = ModelKind::from_code(read_i32(r)?)?;
        let bucket = read_i32(r)?;
        let minn = read_i32(r)?;
        let maxn = read_i32(r)?;
        let lr_update_rate = read_i32(r)?;
        let sampling_threshold = read_f64(r)?;
        Ok(Self {
            dim: dim.max(0) as usize,
            ws,
            epoch,
            min_count,
            neg,
            word_ngrams,
            loss,
            model,
            bucket,
            minn,
            maxn,
            lr_update_rate,
            sampling_threshold,
        })
    }

    /// Write the positional block.
    ///
    /// # Errors
    ///
    /// Returns any underlying I/O error.
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        for v in [
            self.dim as i32,
            self.ws,
            self.epoch,
            self.min_count,
            self.neg,
            self.word_ngrams,
            self.loss.code(),
            self.model.code(),
            self.bucket,
            self.minn,
            self.maxn,
            self.lr_update_rate,
        ] {
            w.write_all(&v.to_le_bytes())?;
        }
        w.write_all(&self.sampling_threshold.to_le_bytes())
    }
}
