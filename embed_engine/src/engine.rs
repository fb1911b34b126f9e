// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text-model facade: token-level prediction and vector queries.

use std::sync::OnceLock;

use embed_model::{InferenceModel, Loss, Scored};
use embed_store::{vector, ArrayMatrix, DenseVector, WeightMatrix};

use crate::{
    error::{EngineError, Result},
    lexicon::{EntryKind, Lexicon},
    params::{ModelKind, ModelParams},
};

/// One predicted label with its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub prob: f32,
    pub label: String,
}

/// A loaded model bound to its vocabulary.
///
/// All query methods take `&self`; per-call scratch keeps concurrent
/// callers independent. The normalized word-vector matrix backing
/// neighbor/analogy queries is computed at most once.
pub struct TextModel<L: Lexicon> {
    params: ModelParams,
    lexicon: L,
    model: InferenceModel,
    word_vectors: OnceLock<ArrayMatrix>,
}

impl<L: Lexicon> TextModel<L> {
    /// Assemble a model and build its target distribution.
    ///
    /// Supervised models draw target counts from labels, embedding models
    /// from words.
    ///
    /// # Errors
    ///
    /// Returns `Model` for mismatched shapes or degenerate counts.
    pub fn from_parts(
        params: ModelParams,
        lexicon: L,
        input: WeightMatrix,
        output: WeightMatrix,
        seed: u64,
    ) -> Result<Self> {
        let loss = Loss::from(params.loss);
        let mut model = InferenceModel::new(input, output, loss)?;
        let counts = match params.model {
            ModelKind::Supervised => lexicon.counts(EntryKind::Label),
            ModelKind::Cbow | ModelKind::Skipgram => lexicon.counts(EntryKind::Word),
        };
        model.set_target_counts(&counts, seed)?;
        Ok(Self {
            params,
            lexicon,
            model,
            word_vectors: OnceLock::new(),
        })
    }

    /// Hyperparameters the model was trained with.
    #[must_use]
    pub const fn params(&self) -> &ModelParams {
        &self.params
    }

    /// The bound vocabulary.
    pub const fn lexicon(&self) -> &L {
        &self.lexicon
    }

    /// The underlying inference model.
    #[must_use]
    pub const fn model(&self) -> &InferenceModel {
        &self.model
    }

    /// Top-`k` labels for a tokenized line, best first.
    ///
    /// A line with no known features yields an empty result rather than an
    /// error; probabilities are `exp` of the model's log scores.
    ///
    /// # Errors
    ///
    /// Returns `Model` errors from prediction and `Lexicon` if the model
    /// emits an id the vocabulary cannot name.
    pub fn predict(&self, tokens: &[&str], k: usize) -> Result<Vec<Prediction>> {
        let (words, _labels) = self.lexicon.line_features(tokens);
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let mut scratch = self.model.scratch();
        let scored = self.model.predict(&words, k, &mut scratch)?;
        scored
            .into_iter()
            .map(|Scored { score, id }| {
                let label = self
                    .lexicon
                    .label(id)
                    .ok_or_else(|| EngineError::Lexicon(format!("unknown label id {id}")))?;
                Ok(Prediction {
                    prob: score.exp(),
                    label: label.to_owned(),
                })
            })
            .collect()
    }

    /// Subword-averaged vector for a single word.
    ///
    /// Unknown words with no usable subwords yield the zero vector.
    #[must_use]
    pub fn word_vector(&self, word: &str) -> DenseVector {
        let mut v = DenseVector::zeros(self.model.dim());
        let ids = self.lexicon.subword_ids(word);
        if ids.is_empty() {
            return v;
        }
        for &id in &ids {
            self.model.input().add_row_into(&mut v, id as usize);
        }
        vector::scale(&mut v, 1.0 / ids.len() as f32);
        v
    }

    /// Vector for a tokenized line.
    ///
    /// Supervised models average the line's feature rows (the prediction
    /// hidden state); embedding models average the normalized vectors of
    /// tokens with positive norm.
    #[must_use]
    pub fn sentence_vector(&self, tokens: &[&str]) -> DenseVector {
        let mut v = DenseVector::zeros(self.model.dim());
        if self.params.model == ModelKind::Supervised {
            let (words, _labels) = self.lexicon.line_features(tokens);
            if words.is_empty() {
                return v;
            }
            for &id in &words {
                self.model.input().add_row_into(&mut v, id as usize);
            }
            vector::scale(&mut v, 1.0 / words.len() as f32);
            return v;
        }

        let mut n = 0usize;
        for token in tokens {
            let wv = self.word_vector(token);
            let norm = vector::norm2(&wv);
            if norm > 0.0 {
                vector::add_scaled(&mut v, 1.0 / norm, &wv);
                n += 1;
            }
        }
        if n > 0 {
            vector::scale(&mut v, 1.0 / n as f32);
        }
        v
    }

    /// Words closest to `word` by cosine score, excluding the word itself.
    #[must_use]
    pub fn nearest_neighbors(&self, word: &str, k: usize) -> Vec<(f32, String)> {
        let query = self.word_vector(word);
        self.find_nn(&query, k, &[word])
    }

    /// Words completing the analogy `a - b + c`.
    #[must_use]
    pub fn analogies(&self, a: &str, b: &str, c: &str, k: usize) -> Vec<(f32, String)> {
        let mut query = self.word_vector(a);
        vector::sub_assign(&mut query, &self.word_vector(b));
        vector::add_assign(&mut query, &self.word_vector(c));
        self.find_nn(&query, k, &[a, b, c])
    }

    /// Normalized word-vector matrix, computed on first use.
    fn word_vectors(&self) -> &ArrayMatrix {
        self.word_vectors.get_or_init(|| {
            let nwords = self.lexicon.nwords();
            let dim = self.model.dim();
            let mut m = ArrayMatrix::zeros(nwords, dim);
            for id in 0..nwords {
                let Some(text) = self.lexicon.word(id as u32) else {
                    continue;
                };
                let mut wv = self.word_vector(text);
                let norm = vector::norm2(&wv);
                if norm > 0.0 {
                    vector::scale(&mut wv, 1.0 / norm);
                }
                m.row_mut(id).copy_from_slice(&wv);
            }
            m
        })
    }

    fn find_nn(&self, query: &[f32], k: usize, ban: &[&str]) -> Vec<(f32, String)> {
        let wv = self.word_vectors();
        let mut qnorm = vector::norm2(query);
        if qnorm < 1e-8 {
            qnorm = 1.0;
        }

        // Banned words are filtered after ranking, so rank enough extras to
        // still return k.
        let mut heap = embed_model::TopK::new(k + ban.len());
        for id in 0..wv.rows() {
            let score = vector::dot(wv.row(id), query) / qnorm;
            heap.offer(score, id as u32);
        }

        let mut out = Vec::with_capacity(k);
        for s in heap.into_sorted() {
            let Some(text) = self.lexicon.word(s.id) else {
                continue;
            };
            if ban.contains(&text) {
                continue;
            }
            out.push((s.score, text.to_owned()));
            if out.len() == k {
                break;
            }
        }
        out
    }
}

impl<L: Lexicon> std::fmt::Debug for TextModel<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextModel")
            .field("model", &self.model)
            .field("nwords", &self.lexicon.nwords())
            .field("nlabels", &self.lexicon.nlabels())
            .finish_non_exhaustive()
    }
}
