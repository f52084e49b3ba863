//! Built-in transformers.

mod civet;
mod replace;

pub use civet::{CivetCompiler, CivetError, CivetOutput, CivetTransformer};
pub use replace::ReplaceTransformer;
