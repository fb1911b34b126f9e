// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared test fixtures: a minimal lexicon and a pass-through compact codec.
#![allow(dead_code)]

use std::io::{self, Read, Write};

use embed_engine::{
    EngineError, EntryKind, Lexicon, LossKind, ModelKind, ModelParams, Result, TextModel,
};
use embed_store::{ArrayMatrix, CompactCodec, CompactMatrix, DenseMatrix, WeightMatrix};

/// Flat word/label vocabulary with one input row per word and no ngrams.
pub struct ToyLexicon {
    words: Vec<String>,
    word_counts: Vec<u64>,
    labels: Vec<String>,
    label_counts: Vec<u64>,
    pruned: bool,
}

impl ToyLexicon {
    pub fn new(
        words: &[(&str, u64)],
        labels: &[(&str, u64)],
        pruned: bool,
    ) -> Self {
        Self {
            words: words.iter().map(|(w, _)| (*w).to_owned()).collect(),
            word_counts: words.iter().map(|(_, c)| *c).collect(),
            labels: labels.iter().map(|(l, _)| (*l).to_owned()).collect(),
            label_counts: labels.iter().map(|(_, c)| *c).collect(),
            pruned,
        }
    }

    pub fn supervised(pruned: bool) -> Self {
        Self::new(
            &[
                ("the", 100),
                ("quick", 60),
                ("brown", 40),
                ("fox", 30),
                ("lazy", 20),
                ("dog", 10),
            ],
            &[
                ("__label__animal", 50),
                ("__label__color", 30),
                ("__label__speed", 20),
                ("__label__other", 5),
            ],
            pruned,
        )
    }

    pub fn embeddings() -> Self {
        Self::new(
            &[
                ("king", 90),
                ("queen", 80),
                ("man", 70),
                ("woman", 60),
                ("apple", 50),
                ("orange", 40),
            ],
            &[],
            false,
        )
    }
}

impl Lexicon for ToyLexicon {
    fn nwords(&self) -> usize {
        self.words.len()
    }

    fn nlabels(&self) -> usize {
        self.labels.len()
    }

    fn counts(&self, kind: EntryKind) -> Vec<u64> {
        match kind {
            EntryKind::Word => self.word_counts.clone(),
            EntryKind::Label => self.label_counts.clone(),
        }
    }

    fn is_pruned(&self) -> bool {
        self.pruned
    }

    fn word(&self, id: u32) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    fn label(&self, id: u32) -> Option<&str> {
        self.labels.get(id as usize).map(String::as_str)
    }

    fn word_id(&self, word: &str) -> Option<u32> {
        self.words.iter().position(|w| w == word).map(|i| i as u32)
    }

    fn subword_ids(&self, word: &str) -> Vec<u32> {
        self.word_id(word).map_or_else(Vec::new, |id| vec![id])
    }

    fn line_features(&self, tokens: &[&str]) -> (Vec<u32>, Vec<u32>) {
        let mut words = Vec::new();
        let mut labels = Vec::new();
        for t in tokens {
            if let Some(i) = self.labels.iter().position(|l| l == t) {
                labels.push(i as u32);
            } else if let Some(id) = self.word_id(t) {
                words.push(id);
            }
        }
        (words, labels)
    }

    fn read<R: Read>(r: &mut R, _params: &ModelParams) -> Result<Self> {
        fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
            let mut b = [0u8; 4];
            r.read_exact(&mut b)?;
            Ok(u32::from_le_bytes(b))
        }
        fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
            let mut b = [0u8; 8];
            r.read_exact(&mut b)?;
            Ok(u64::from_le_bytes(b))
        }
        fn read_entries<R: Read>(r: &mut R) -> Result<(Vec<String>, Vec<u64>)> {
            let n = read_u32(r)?;
            let mut texts = Vec::with_capacity(n as usize);
            let mut counts = Vec::with_capacity(n as usize);
            for _ in 0..n {
                let len = read_u32(r)? as usize;
                let mut bytes = vec![0u8; len];
                r.read_exact(&mut bytes)?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| EngineError::Lexicon(e.to_string()))?;
                texts.push(text);
                counts.push(read_u64(r)?);
            }
            Ok((texts, counts))
        }

        let (words, word_counts) = read_entries(r)?;
        let (labels, label_counts) = read_entries(r)?;
        let mut b = [0u8; 1];
        r.read_exact(&mut b)?;
        Ok(Self {
            words,
            word_counts,
            labels,
            label_counts,
            pruned: b[0] != 0,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        fn write_entries<W: Write>(
            w: &mut W,
            texts: &[String],
            counts: &[u64],
        ) -> io::Result<()> {
            w.write_all(&(texts.len() as u32).to_le_bytes())?;
            for (t, &c) in texts.iter().zip(counts) {
                w.write_all(&(t.len() as u32).to_le_bytes())?;
                w.write_all(t.as_bytes())?;
                w.write_all(&c.to_le_bytes())?;
            }
            Ok(())
        }

        write_entries(w, &self.words, &self.word_counts)?;
        write_entries(w, &self.labels, &self.label_counts)?;
        w.write_all(&[u8::from(self.pruned)])
    }
}

/// "Compact" matrix that stores plain floats in the dense wire layout.
pub struct PlainCompact(pub ArrayMatrix);

impl CompactMatrix for PlainCompact {
    fn rows(&self) -> usize {
        self.0.rows()
    }

    fn cols(&self) -> usize {
        self.0.cols()
    }

    fn dot_row(&self, v: &[f32], r: usize) -> f32 {
        embed_store::vector::dot(v, self.0.row(r))
    }

    fn add_row_into(&self, target: &mut [f32], r: usize) {
        embed_store::vector::add_assign(target, self.0.row(r));
    }

    fn save(&self, mut w: &mut dyn Write) -> io::Result<()> {
        self.0.write_to(&mut w)
    }
}

/// Codec pairing with [`PlainCompact`].
pub struct PlainCodec;

impl CompactCodec for PlainCodec {
    fn read(&self, mut r: &mut dyn Read) -> io::Result<Box<dyn CompactMatrix>> {
        let m = ArrayMatrix::read_from(&mut r).map_err(|e| match e {
            embed_store::MatrixError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        })?;
        Ok(Box::new(PlainCompact(m)))
    }
}

pub fn supervised_params(dim: usize, loss: LossKind) -> ModelParams {
    ModelParams {
        dim,
        loss,
        model: ModelKind::Supervised,
        ..ModelParams::default()
    }
}

/// Supervised model over the fixed toy vocabulary.
pub fn supervised_model(loss: LossKind, pruned: bool) -> TextModel<ToyLexicon> {
    let dim = 8;
    let lexicon = ToyLexicon::supervised(pruned);
    let input = WeightMatrix::Dense(DenseMatrix::Array(ArrayMatrix::uniform(
        lexicon.nwords(),
        dim,
        21,
    )));
    let output = WeightMatrix::Dense(DenseMatrix::Array(ArrayMatrix::uniform(
        lexicon.nlabels(),
        dim,
        22,
    )));
    TextModel::from_parts(supervised_params(dim, loss), lexicon, input, output, 0).unwrap()
}

/// Skipgram embedding model over the fixed toy vocabulary.
pub fn embedding_model() -> TextModel<ToyLexicon> {
    let dim = 8;
    let lexicon = ToyLexicon::embeddings();
    let n = lexicon.nwords();
    let params = ModelParams {
        dim,
        loss: LossKind::NegativeSampling,
        model: ModelKind::Skipgram,
        ..ModelParams::default()
    };
    let input = WeightMatrix::Dense(DenseMatrix::Array(ArrayMatrix::uniform(n, dim, 31)));
    let output = WeightMatrix::Dense(DenseMatrix::Array(ArrayMatrix::uniform(n, dim, 32)));
    TextModel::from_parts(params, lexicon, input, output, 0).unwrap()
}
