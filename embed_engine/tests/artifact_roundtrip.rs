// SPDX-License-Identifier: MIT OR Apache-2.0
mod common;

use common::{supervised_model, supervised_params, PlainCodec, PlainCompact, ToyLexicon};
use embed_engine::{
    load_model, load_model_with, save_model, EngineError, LoadOptions, LossKind, TextModel,
};
use embed_store::{ArrayMatrix, MatrixBacking, RegionConfig, WeightMatrix};
use tempfile::tempdir;

const LINE: &[&str] = &["the", "quick", "brown", "fox"];

#[test]
fn roundtrip_preserves_predictions_across_backings() {
    let model = supervised_model(LossKind::Softmax, false);
    let expected = model.predict(LINE, 4).unwrap();
    assert_eq!(expected.len(), 4);

    let dir = tempdir().unwrap();
    save_model(&model, dir.path()).unwrap();

    for backing in [
        MatrixBacking::InMemory,
        MatrixBacking::Mapped,
        // A tiny budget forces several regions even on the toy matrices.
        MatrixBacking::Regional(RegionConfig {
            max_region_elements: 16,
        }),
    ] {
        let loaded: TextModel<ToyLexicon> =
            load_model(dir.path(), LoadOptions { backing, seed: 0 }).unwrap();
        let got = loaded.predict(LINE, 4).unwrap();
        // Bit-identical, not approximately equal.
        assert_eq!(got, expected, "{backing:?}");
    }
}

#[test]
fn roundtrip_hierarchical_model() {
    let model = supervised_model(LossKind::HierarchicalSoftmax, false);
    let expected = model.predict(LINE, 2).unwrap();

    let dir = tempdir().unwrap();
    save_model(&model, dir.path()).unwrap();
    let loaded: TextModel<ToyLexicon> = load_model(dir.path(), LoadOptions::default()).unwrap();
    assert_eq!(loaded.predict(LINE, 2).unwrap(), expected);
}

#[test]
fn pruned_lexicon_with_dense_input_fails_validation() {
    let model = supervised_model(LossKind::Softmax, true);
    let dir = tempdir().unwrap();
    save_model(&model, dir.path()).unwrap();

    let err = load_model::<ToyLexicon, _>(dir.path(), LoadOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::PrunedWithoutQuant), "{err}");
}

#[test]
fn pruned_lexicon_with_quantized_input_loads() {
    let dim = 8;
    let lexicon = ToyLexicon::supervised(true);
    let input = WeightMatrix::Compact(Box::new(PlainCompact(ArrayMatrix::uniform(6, dim, 21))));
    let output = WeightMatrix::Dense(embed_store::DenseMatrix::Array(ArrayMatrix::uniform(
        4, dim, 22,
    )));
    let model = TextModel::from_parts(
        supervised_params(dim, LossKind::Softmax),
        lexicon,
        input,
        output,
        0,
    )
    .unwrap();
    let expected = model.predict(LINE, 3).unwrap();

    let dir = tempdir().unwrap();
    save_model(&model, dir.path()).unwrap();
    assert!(dir.path().join("qinput.matrix").exists());
    assert!(!dir.path().join("input.matrix").exists());

    let loaded: TextModel<ToyLexicon> =
        load_model_with(dir.path(), &PlainCodec, LoadOptions::default()).unwrap();
    assert_eq!(loaded.predict(LINE, 3).unwrap(), expected);
}

#[test]
fn quantized_artifact_without_codec_is_rejected() {
    let dim = 8;
    let lexicon = ToyLexicon::supervised(false);
    let input = WeightMatrix::Compact(Box::new(PlainCompact(ArrayMatrix::uniform(6, dim, 21))));
    let output = WeightMatrix::Dense(embed_store::DenseMatrix::Array(ArrayMatrix::uniform(
        4, dim, 22,
    )));
    let model = TextModel::from_parts(
        supervised_params(dim, LossKind::Softmax),
        lexicon,
        input,
        output,
        0,
    )
    .unwrap();

    let dir = tempdir().unwrap();
    save_model(&model, dir.path()).unwrap();

    let err = load_model::<ToyLexicon, _>(dir.path(), LoadOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::Io(_)), "{err}");
}

#[test]
fn missing_artifact_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_model::<ToyLexicon, _>(dir.path(), LoadOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}
