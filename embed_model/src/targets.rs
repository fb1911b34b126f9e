// SPDX-License-Identifier: MIT OR Apache-2.0
//! Target distribution structures for the output vocabulary.
//!
//! Hierarchical losses get a Huffman-style merge tree; negative sampling
//! gets a √count-proportional sampling table; plain softmax needs no
//! structure at all. All three are built once from the final target counts
//! and are immutable afterwards.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    error::{ModelError, Result},
    model::Loss,
};

/// Sentinel child/parent index meaning "absent".
pub const NONE: u32 = u32::MAX;

/// Default sampling table length.
pub const NEGATIVE_TABLE_SIZE: usize = 10_000_000;

/// Count seeded into not-yet-merged internal nodes, above any real count.
const INTERNAL_SEED_COUNT: u64 = 1_000_000_000_000_000;

/// One tree node in the flat arena. Leaves occupy indices `0..n`,
/// internal nodes `n..2n-1`, the root is `2n-2`.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub parent: u32,
    pub left: u32,
    pub right: u32,
    pub count: u64,
    /// True if this node is its parent's right child.
    pub binary: bool,
}

/// Merge tree over the output vocabulary with per-leaf root paths.
///
/// Callers are expected to pass counts in non-ascending order (the natural
/// order of a frequency-sorted vocabulary). Unsorted input still produces a
/// structurally valid tree, just not a minimal-depth one.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    /// Per leaf, internal-node ids (`arena index - n`) from leaf to root.
    paths: Vec<Vec<u32>>,
    /// Per leaf, the branch taken at each step of `paths` (true = right).
    codes: Vec<Vec<bool>>,
    leaves: usize,
}

impl HuffmanTree {
    /// Build the merge tree from target counts.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateDistribution` if `counts` is empty.
    pub fn build(counts: &[u64]) -> Result<Self> {
        let n = counts.len();
        if n == 0 {
            return Err(ModelError::DegenerateDistribution);
        }
        if counts.windows(2).any(|w| w[0] < w[1]) {
            tracing::warn!("target counts not sorted in non-ascending order; tree depth will be suboptimal");
        }

        let mut nodes = vec![
            Node {
                parent: NONE,
                left: NONE,
                right: NONE,
                count: INTERNAL_SEED_COUNT,
                binary: false,
            };
            2 * n - 1
        ];
        for (i, &c) in counts.iter().enumerate() {
            nodes[i].count = c;
        }

        // Two monotone cursors: `leaf` walks the sorted leaves from the
        // smallest count upward, `node` walks already-merged internals in
        // creation order. Counts on both frontiers are non-decreasing, so
        // the two cursor heads are always the two global minima.
        let mut leaf = n as i64 - 1;
        let mut node = n;
        for parent in n..2 * n - 1 {
            let mut mini = [0usize; 2];
            for slot in &mut mini {
                // Ties prefer the leaf candidate.
                if leaf >= 0 && nodes[leaf as usize].count <= nodes[node].count {
                    *slot = leaf as usize;
                    leaf -= 1;
                } else {
                    *slot = node;
                    node += 1;
                }
            }
            nodes[parent].count = nodes[mini[0]].count + nodes[mini[1]].count;
            nodes[parent].left = mini[0] as u32;
            nodes[parent].right = mini[1] as u32;
            nodes[mini[0]].parent = parent as u32;
            nodes[mini[1]].parent = parent as u32;
            nodes[mini[1]].binary = true;
        }

        let mut paths = Vec::with_capacity(n);
        let mut codes = Vec::with_capacity(n);
        for i in 0..n {
            let mut path = Vec::new();
            let mut code = Vec::new();
            let mut j = i;
            while nodes[j].parent != NONE {
                path.push(nodes[j].parent - n as u32);
                code.push(nodes[j].binary);
                j = nodes[j].parent as usize;
            }
            paths.push(path);
            codes.push(code);
        }

        Ok(Self {
            nodes,
            paths,
            codes,
            leaves: n,
        })
    }

    /// Number of leaves (output vocabulary size).
    #[must_use]
    pub const fn leaves(&self) -> usize {
        self.leaves
    }

    /// Arena index of the root node.
    #[must_use]
    pub fn root(&self) -> u32 {
        (2 * self.leaves - 2) as u32
    }

    /// Full node arena.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Internal-node ids on the leaf-to-root path of leaf `i`.
    #[must_use]
    pub fn path(&self, i: usize) -> &[u32] {
        &self.paths[i]
    }

    /// Branch directions matching [`Self::path`] (true = right child).
    #[must_use]
    pub fn code(&self, i: usize) -> &[bool] {
        &self.codes[i]
    }
}

/// Flat sampling table where index `i` appears proportionally to
/// `sqrt(counts[i])`, shuffled once with a seeded generator.
#[derive(Debug, Clone)]
pub struct NegativeTable {
    table: Vec<u32>,
}

impl NegativeTable {
    /// Build with the default table length.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateDistribution` if `counts` is empty or all zero.
    pub fn build(counts: &[u64], seed: u64) -> Result<Self> {
        Self::with_size(counts, NEGATIVE_TABLE_SIZE, seed)
    }

    /// Build with an explicit table length.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateDistribution` if `counts` is empty or all zero.
    pub fn with_size(counts: &[u64], table_size: usize, seed: u64) -> Result<Self> {
        let z: f64 = counts.iter().map(|&c| (c as f64).sqrt()).sum();
        if counts.is_empty() || z <= 0.0 {
            return Err(ModelError::DegenerateDistribution);
        }

        let mut table = Vec::with_capacity(table_size);
        for (i, &c) in counts.iter().enumerate() {
            let entries = ((c as f64).sqrt() * table_size as f64 / z) as usize;
            for _ in 0..entries {
                table.push(i as u32);
            }
        }
        if table.is_empty() {
            // A tiny table_size can floor every share to zero; keep at least
            // one entry per positive count.
            for (i, &c) in counts.iter().enumerate() {
                if c > 0 {
                    table.push(i as u32);
                }
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        table.shuffle(&mut rng);
        Ok(Self { table })
    }

    /// Shuffled table entries.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.table
    }

    /// Table length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty (never true for a successful build).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// The structure a given loss needs over the output vocabulary.
#[derive(Debug, Clone)]
pub enum TargetDistribution {
    /// Plain softmax: no auxiliary structure.
    Unstructured,
    /// Negative sampling table.
    Negatives(NegativeTable),
    /// Hierarchical merge tree.
    Tree(HuffmanTree),
}

impl TargetDistribution {
    /// Build the distribution structure for `loss` from target counts.
    ///
    /// # Errors
    ///
    /// Returns `CountMismatch` if `counts` does not cover `output_size`,
    /// or `DegenerateDistribution` from the underlying builder.
    pub fn build(loss: Loss, counts: &[u64], output_size: usize, seed: u64) -> Result<Self> {
        if counts.len() != output_size {
            return Err(ModelError::CountMismatch {
                expected: output_size,
                got: counts.len(),
            });
        }
        match loss {
            Loss::Softmax => Ok(Self::Unstructured),
            Loss::NegativeSampling => Ok(Self::Negatives(NegativeTable::build(counts, seed)?)),
            Loss::HierarchicalSoftmax => Ok(Self::Tree(HuffmanTree::build(counts)?)),
        }
    }

    /// The merge tree, if this distribution has one.
    #[must_use]
    pub fn tree(&self) -> Option<&HuffmanTree> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }
}
