// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bag-of-features inference over a pair of weight matrices.
//!
//! The model averages active input rows into a hidden vector, then scores
//! the output vocabulary either with a stabilized softmax (softmax and
//! negative-sampling losses share this at prediction time) or by walking
//! the hierarchical merge tree with branch-and-bound.

use embed_store::{vector, DenseVector, WeightMatrix};

use crate::{
    error::{ModelError, Result},
    tables,
    targets::TargetDistribution,
    topk::{Scored, TopK},
};

/// Training loss the model was built with; decides the prediction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    HierarchicalSoftmax,
    NegativeSampling,
    Softmax,
}

/// Per-caller scratch buffers.
///
/// Prediction never touches shared mutable state; each concurrent caller
/// brings its own `Scratch` and the model itself is only read.
#[derive(Debug, Clone)]
pub struct Scratch {
    pub hidden: DenseVector,
    pub output: DenseVector,
}

/// Read-only inference model: input rows, output rows, and the target
/// distribution structure for the loss.
pub struct InferenceModel {
    input: WeightMatrix,
    output: WeightMatrix,
    dim: usize,
    output_size: usize,
    loss: Loss,
    targets: TargetDistribution,
}

impl InferenceModel {
    /// Assemble a model from its weight matrices.
    ///
    /// Hierarchical and negative-sampling losses additionally need
    /// [`Self::set_target_counts`] before prediction.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the matrices disagree on width.
    pub fn new(input: WeightMatrix, output: WeightMatrix, loss: Loss) -> Result<Self> {
        let dim = input.cols();
        if output.cols() != dim {
            return Err(ModelError::DimensionMismatch {
                expected: dim,
                got: output.cols(),
            });
        }
        let output_size = output.rows();
        Ok(Self {
            input,
            output,
            dim,
            output_size,
            loss,
            targets: TargetDistribution::Unstructured,
        })
    }

    /// One-time build of the target distribution from final counts.
    ///
    /// Takes `&mut self`, so it cannot race concurrent predictions; build
    /// the model fully before sharing it.
    ///
    /// # Errors
    ///
    /// Returns `CountMismatch` or `DegenerateDistribution` from the builder.
    pub fn set_target_counts(&mut self, counts: &[u64], seed: u64) -> Result<()> {
        self.targets = TargetDistribution::build(self.loss, counts, self.output_size, seed)?;
        Ok(())
    }

    /// Fresh scratch buffers sized for this model.
    #[must_use]
    pub fn scratch(&self) -> Scratch {
        Scratch {
            hidden: DenseVector::zeros(self.dim),
            output: DenseVector::zeros(self.output_size),
        }
    }

    /// Average the active input rows into `hidden`.
    ///
    /// Duplicate indices contribute once per occurrence.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` for no indices, `DimensionMismatch` for a
    /// wrongly sized buffer.
    pub fn compute_hidden(&self, indices: &[u32], hidden: &mut DenseVector) -> Result<()> {
        if hidden.len() != self.dim {
            return Err(ModelError::DimensionMismatch {
                expected: self.dim,
                got: hidden.len(),
            });
        }
        if indices.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        hidden.zero();
        for &i in indices {
            self.input.add_row_into(hidden, i as usize);
        }
        vector::scale(hidden, 1.0 / indices.len() as f32);
        Ok(())
    }

    /// Max-stabilized softmax over all output rows.
    pub fn compute_output_softmax(&self, hidden: &DenseVector, output: &mut DenseVector) {
        for i in 0..self.output_size {
            output[i] = self.output.dot_row(hidden, i);
        }
        let max = output.iter().fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let mut z = 0.0f32;
        for v in output.iter_mut() {
            *v = (*v - max).exp();
            z += *v;
        }
        for v in output.iter_mut() {
            *v /= z;
        }
    }

    /// Top-`k` targets for the active features, as log-probabilities,
    /// best first. `k = 0` yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` for no indices and `TreeNotBuilt` if a
    /// hierarchical model has no tree yet.
    pub fn predict(&self, indices: &[u32], k: usize, scratch: &mut Scratch) -> Result<Vec<Scored>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.compute_hidden(indices, &mut scratch.hidden)?;
        match self.loss {
            Loss::HierarchicalSoftmax => self.predict_tree(k, &scratch.hidden),
            Loss::NegativeSampling | Loss::Softmax => {
                Ok(self.find_k_best(k, &scratch.hidden, &mut scratch.output))
            }
        }
    }

    fn find_k_best(&self, k: usize, hidden: &DenseVector, output: &mut DenseVector) -> Vec<Scored> {
        self.compute_output_softmax(hidden, output);
        let mut heap = TopK::new(k);
        for (i, &p) in output.iter().enumerate() {
            heap.offer(tables::log(p), i as u32);
        }
        heap.into_sorted()
    }

    fn predict_tree(&self, k: usize, hidden: &DenseVector) -> Result<Vec<Scored>> {
        let tree = self.targets.tree().ok_or(ModelError::TreeNotBuilt)?;
        let n = tree.leaves() as u32;
        let mut heap = TopK::new(k);

        // Depth-first with an explicit work stack; accumulated log-scores
        // only decrease going down, so a subtree scoring no better than the
        // current worst cannot improve the result.
        let mut stack: Vec<(u32, f32)> = vec![(tree.root(), 0.0)];
        while let Some((node, score)) = stack.pop() {
            if heap.full() && score <= heap.worst() {
                continue;
            }
            if node < n {
                heap.offer(score, node);
                continue;
            }
            let nd = tree.nodes()[node as usize];
            let f = tables::sigmoid(self.output.dot_row(hidden, (node - n) as usize));
            // Right pushed first so the left branch is explored first.
            stack.push((nd.right, score + tables::log(f)));
            stack.push((nd.left, score + tables::log(1.0 - f)));
        }
        Ok(heap.into_sorted())
    }

    /// Embedding width.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Output vocabulary size.
    #[must_use]
    pub const fn output_size(&self) -> usize {
        self.output_size
    }

    /// Training loss.
    #[must_use]
    pub const fn loss(&self) -> Loss {
        self.loss
    }

    /// Input (feature embedding) matrix.
    #[must_use]
    pub const fn input(&self) -> &WeightMatrix {
        &self.input
    }

    /// Output (target) matrix.
    #[must_use]
    pub const fn output(&self) -> &WeightMatrix {
        &self.output
    }
}

impl std::fmt::Debug for InferenceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceModel")
            .field("dim", &self.dim)
            .field("output_size", &self.output_size)
            .field("loss", &self.loss)
            .finish_non_exhaustive()
    }
}
