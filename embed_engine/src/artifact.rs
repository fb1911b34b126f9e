// SPDX-License-Identifier: MIT OR Apache-2.0
//! Multi-artifact model directory codec.
//!
//! A saved model is a directory of fixed-name artifacts:
//!
//! - `params.bin` — hyperparameter block
//! - `lexicon.bin` — vocabulary block
//! - `input.matrix` or `qinput.matrix` — dense or quantized input rows
//! - `output.matrix` or `qoutput.matrix` — dense or quantized output rows
//!
//! The loader infers quantization by probing for the `q*` artifact, so the
//! directory itself is the format tag. Dense matrices can be opened with
//! any backing; the regional backing serves models too large for a single
//! mapping.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use embed_store::{CompactCodec, DenseMatrix, MatrixBacking, UnsupportedCompact, WeightMatrix};

use crate::{
    engine::TextModel,
    error::{EngineError, Result},
    lexicon::Lexicon,
    params::ModelParams,
};

/// Hyperparameter artifact name.
pub const PARAMS_FILE: &str = "params.bin";
/// Vocabulary artifact name.
pub const LEXICON_FILE: &str = "lexicon.bin";
/// Dense input matrix artifact name.
pub const INPUT_FILE: &str = "input.matrix";
/// Quantized input matrix artifact name.
pub const QINPUT_FILE: &str = "qinput.matrix";
/// Dense output matrix artifact name.
pub const OUTPUT_FILE: &str = "output.matrix";
/// Quantized output matrix artifact name.
pub const QOUTPUT_FILE: &str = "qoutput.matrix";

/// How to open a model directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Backing for dense matrices.
    pub backing: MatrixBacking,
    /// Seed for the target-distribution build.
    pub seed: u64,
}

/// Write every artifact of a model into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns any underlying I/O error.
pub fn save_model<L: Lexicon, P: AsRef<Path>>(model: &TextModel<L>, dir: P) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut w = BufWriter::new(File::create(dir.join(PARAMS_FILE))?);
    model.params().write(&mut w)?;

    let mut w = BufWriter::new(File::create(dir.join(LEXICON_FILE))?);
    model.lexicon().write(&mut w)?;

    save_matrix(model.model().input(), dir, INPUT_FILE, QINPUT_FILE)?;
    save_matrix(model.model().output(), dir, OUTPUT_FILE, QOUTPUT_FILE)?;

    tracing::info!(dir = %dir.display(), "model artifacts saved");
    Ok(())
}

fn save_matrix(m: &WeightMatrix, dir: &Path, dense_name: &str, quant_name: &str) -> Result<()> {
    match m {
        WeightMatrix::Dense(d) => {
            let mut w = BufWriter::new(File::create(dir.join(dense_name))?);
            d.write_to(&mut w)?;
        }
        WeightMatrix::Compact(c) => {
            let mut w = BufWriter::new(File::create(dir.join(quant_name))?);
            c.save(&mut w)?;
        }
    }
    Ok(())
}

/// Load a model directory without quantization support.
///
/// # Errors
///
/// As [`load_model_with`].
pub fn load_model<L: Lexicon, P: AsRef<Path>>(dir: P, options: LoadOptions) -> Result<TextModel<L>> {
    load_model_with(dir, &UnsupportedCompact, options)
}

/// Load a model directory with an injected compact-matrix codec.
///
/// # Errors
///
/// Returns `Io` for missing artifacts, format errors from the blocks, and
/// `PrunedWithoutQuant` when a pruned lexicon is paired with a dense input
/// matrix.
pub fn load_model_with<L: Lexicon, P: AsRef<Path>>(
    dir: P,
    codec: &dyn CompactCodec,
    options: LoadOptions,
) -> Result<TextModel<L>> {
    let dir = dir.as_ref();

    let mut r = BufReader::new(File::open(dir.join(PARAMS_FILE))?);
    let params = ModelParams::read(&mut r)?;

    let mut r = BufReader::new(File::open(dir.join(LEXICON_FILE))?);
    let lexicon = L::read(&mut r, &params)?;

    let input = load_matrix(dir, INPUT_FILE, QINPUT_FILE, codec, options.backing)?;
    if lexicon.is_pruned() && !input.is_compact() {
        return Err(EngineError::PrunedWithoutQuant);
    }
    let output = load_matrix(dir, OUTPUT_FILE, QOUTPUT_FILE, codec, options.backing)?;

    tracing::info!(
        dir = %dir.display(),
        dim = params.dim,
        quant_input = input.is_compact(),
        "model artifacts loaded"
    );
    TextModel::from_parts(params, lexicon, input, output, options.seed)
}

fn load_matrix(
    dir: &Path,
    dense_name: &str,
    quant_name: &str,
    codec: &dyn CompactCodec,
    backing: MatrixBacking,
) -> Result<WeightMatrix> {
    let quant_path = dir.join(quant_name);
    if quant_path.exists() {
        let mut r = BufReader::new(File::open(quant_path)?);
        Ok(WeightMatrix::Compact(codec.read(&mut r)?))
    } else {
        Ok(WeightMatrix::Dense(DenseMatrix::load(
            dir.join(dense_name),
            backing,
        )?))
    }
}
