// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loader for the single-file reference model stream.
//!
//! Stream order is fixed: magic, version, hyperparameter block, lexicon
//! block, then each matrix preceded by a one-byte quantization flag.
//! Version 11 supervised models predate subword ngrams on labels and are
//! patched to `maxn = 0` on load.

use std::{fs::File, io::BufReader, io::Read, path::Path};

use embed_store::{ArrayMatrix, CompactCodec, DenseMatrix, UnsupportedCompact, WeightMatrix};

use crate::{
    engine::TextModel,
    error::{EngineError, Result},
    lexicon::Lexicon,
    params::{read_i32, read_u8, ModelKind, ModelParams, MODEL_MAGIC, MODEL_VERSION},
};

/// Load a reference model stream without quantization support.
///
/// # Errors
///
/// Returns `Io` if the file cannot be opened (before any parsing), then
/// format/validation errors per [`read_native_stream`].
pub fn load_native_model<L: Lexicon, P: AsRef<Path>>(path: P) -> Result<TextModel<L>> {
    load_native_model_with(path, &UnsupportedCompact, 0)
}

/// Load a reference model stream with an injected compact-matrix codec.
///
/// # Errors
///
/// As [`load_native_model`].
pub fn load_native_model_with<L: Lexicon, P: AsRef<Path>>(
    path: P,
    codec: &dyn CompactCodec,
    seed: u64,
) -> Result<TextModel<L>> {
    let file = File::open(path)?;
    read_native_stream(&mut BufReader::new(file), codec, seed)
}

/// Decode a reference model stream from any byte source.
///
/// # Errors
///
/// Returns `BadMagic`/`UnsupportedVersion` for an unrecognized header,
/// `PrunedWithoutQuant` for a pruned lexicon paired with a dense input
/// matrix, plus codec, matrix, and model errors from the blocks.
pub fn read_native_stream<L: Lexicon, R: Read>(
    r: &mut R,
    codec: &dyn CompactCodec,
    seed: u64,
) -> Result<TextModel<L>> {
    let magic = read_i32(r)?;
    if magic != MODEL_MAGIC {
        return Err(EngineError::BadMagic(magic));
    }
    let version = read_i32(r)?;
    if version > MODEL_VERSION {
        return Err(EngineError::UnsupportedVersion(version));
    }

    let mut params = ModelParams::read(r)?;
    if version == 11 && params.model == ModelKind::Supervised {
        params.maxn = 0;
    }

    let lexicon = L::read(r, &params)?;

    let quant_input = read_u8(r)? != 0;
    let input = read_matrix(r, quant_input, codec)?;
    if lexicon.is_pruned() && !quant_input {
        return Err(EngineError::PrunedWithoutQuant);
    }

    let quant_output = read_u8(r)? != 0;
    let output = read_matrix(r, quant_output, codec)?;

    tracing::debug!(
        version,
        dim = params.dim,
        nwords = lexicon.nwords(),
        nlabels = lexicon.nlabels(),
        "native model stream loaded"
    );
    TextModel::from_parts(params, lexicon, input, output, seed)
}

fn read_matrix<R: Read>(
    r: &mut R,
    quantized: bool,
    codec: &dyn CompactCodec,
) -> Result<WeightMatrix> {
    if quantized {
        Ok(WeightMatrix::Compact(codec.read(r)?))
    } else {
        Ok(WeightMatrix::Dense(DenseMatrix::Array(
            ArrayMatrix::read_from(r)?,
        )))
    }
}
