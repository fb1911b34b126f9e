// SPDX-License-Identifier: MIT OR Apache-2.0
//! Target distributions and inference for bag-of-features embedding models.
//!
//! [`InferenceModel`] scores an output vocabulary from a set of active
//! feature indices. The target-side structure depends on the training loss:
//! a merge tree for hierarchical softmax, a sampling table for negative
//! sampling, nothing for plain softmax. Structures are built once via
//! [`InferenceModel::set_target_counts`] and read-only afterwards; each
//! concurrent caller holds its own [`Scratch`].

pub mod error;
pub mod model;
pub mod tables;
pub mod targets;
pub mod topk;

pub use error::{ModelError, Result};
pub use model::{InferenceModel, Loss, Scratch};
pub use targets::{HuffmanTree, NegativeTable, TargetDistribution, NEGATIVE_TABLE_SIZE, NONE};
pub use topk::{Scored, TopK};
