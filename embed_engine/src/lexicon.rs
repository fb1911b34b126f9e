// SPDX-License-Identifier: MIT OR Apache-2.0
//! Vocabulary collaborator interface.
//!
//! Vocabulary construction (tokenization, ngram hashing, pruning policy)
//! lives outside this workspace. The codecs and the facade only need the
//! read side defined here, plus each implementation's own block codec so a
//! lexicon travels inside model files.

use std::io::{Read, Write};

use crate::{error::Result, params::ModelParams};

/// Which entry population a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Word,
    Label,
}

/// Read access to a trained vocabulary.
pub trait Lexicon: Send + Sync {
    /// Number of word entries.
    fn nwords(&self) -> usize;

    /// Number of label entries.
    fn nlabels(&self) -> usize;

    /// Occurrence counts for one entry population, in id order.
    fn counts(&self, kind: EntryKind) -> Vec<u64>;

    /// Whether the vocabulary was pruned after training.
    ///
    /// Pruned vocabularies only pair with quantized input matrices; the
    /// loaders enforce this.
    fn is_pruned(&self) -> bool;

    /// Word text by id.
    fn word(&self, id: u32) -> Option<&str>;

    /// Label text by id.
    fn label(&self, id: u32) -> Option<&str>;

    /// Id of a word, if present.
    fn word_id(&self, word: &str) -> Option<u32>;

    /// Input-matrix row indices for a word: its own row (if any) plus its
    /// subword ngram rows.
    fn subword_ids(&self, word: &str) -> Vec<u32>;

    /// Feature and label ids for a tokenized line: input-matrix rows for
    /// every known token (with ngrams per the trained configuration) and
    /// the ids of any label tokens.
    fn line_features(&self, tokens: &[&str]) -> (Vec<u32>, Vec<u32>);

    /// Read a lexicon block written by [`Lexicon::write`].
    ///
    /// # Errors
    ///
    /// Returns `Io` on short reads or `Lexicon` on invalid content.
    fn read<R: Read>(r: &mut R, params: &ModelParams) -> Result<Self>
    where
        Self: Sized;

    /// Write the lexicon block.
    ///
    /// # Errors
    ///
    /// Returns any underlying I/O error.
    fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()>;
}
