mod fold;
#[allow(clippy::module_inception)]
mod tokenizer;

pub use fold::{fold_ascii_lowercase, fold_ascii_lowercase_scalar};
pub use tokenizer::{TermFrequencies, Tokenizer};
