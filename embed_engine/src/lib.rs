// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model codecs and the text-model facade.
//!
//! Two on-disk formats are supported: the single-file reference stream
//! ([`native`]) and the multi-artifact directory ([`artifact`]). Both
//! produce a [`TextModel`] bound to a [`Lexicon`] implementation supplied
//! by the caller; quantized matrices enter through an injected
//! [`embed_store::CompactCodec`].

pub mod artifact;
pub mod engine;
pub mod error;
pub mod lexicon;
pub mod native;
pub mod params;

pub use artifact::{load_model, load_model_with, save_model, LoadOptions};
pub use engine::{Prediction, TextModel};
pub use error::{EngineError, Result};
pub use lexicon::{EntryKind, Lexicon};
pub use native::{load_native_model, load_native_model_with, read_native_stream};
pub use params::{LossKind, ModelKind, ModelParams, MODEL_MAGIC, MODEL_VERSION};
