//! # MilkCat
//!
//! Chinese word segmentation, part-of-speech tagging and dependency parsing.
//!
//! A [`Model`] bundles the read-only tables. It is shared among decoders
//! through [`Arc`](std::sync::Arc), and each decoder owns the buffers it
//! reuses between calls.
//!
//! ```
//! use std::sync::Arc;
//!
//! use milkcat::model::{LexType, Lexicon};
//! use milkcat::{Model, Segmenter, Sentence, TermInstance};
//!
//! let lexicon = Lexicon::from_reader(
//!     "北京,2.0\n大学,2.5\n北京大学,3.0\n".as_bytes(),
//!     LexType::System,
//! )?;
//! let model = Arc::new(Model::new(lexicon)?);
//!
//! let mut segmenter = Segmenter::new(model);
//! let mut sent = Sentence::new();
//! sent.set_sentence("北京大学");
//! let mut terms = TermInstance::default();
//! segmenter.segment(&sent, &mut terms)?;
//!
//! assert_eq!(terms.len(), 1);
//! assert_eq!(terms.term(0).text(), "北京大学");
//! # Ok::<(), milkcat::errors::MilkcatError>(())
//! ```
#![deny(missing_docs)]

#[cfg(target_pointer_width = "16")]
compile_error!("`target_pointer_width` must be larger than or equal to 32");

pub mod analyzer;
pub mod common;
pub mod errors;
pub mod feature_template;
pub mod model;
pub mod parser;
pub mod segmenter;
mod sentence;
pub mod tagger;
pub mod term;
pub mod token;
mod utils;

#[cfg(test)]
mod tests;

pub use analyzer::{AnalyzedWord, Analyzer};
pub use model::Model;
pub use parser::{DependencyInstance, DependencyParser};
pub use segmenter::Segmenter;
pub use sentence::Sentence;
pub use tagger::{CrfTagger, SequenceFeatures, TermFeatures};
pub use term::{Term, TermInstance};
