//! Read-only model tables shared by the decoders.
//!
//! A [`Model`] is built once, wrapped in an [`Arc`](std::sync::Arc) and
//! handed to every [`Segmenter`](crate::Segmenter),
//! [`CrfTagger`](crate::CrfTagger) and
//! [`DependencyParser`](crate::DependencyParser). It is never mutated
//! afterwards, so any number of threads may decode with it at once.
pub(crate) mod cost;
pub(crate) mod crf;
pub(crate) mod feature_ids;
pub(crate) mod lexicon;
pub(crate) mod maxent;
pub(crate) mod trie;
pub(crate) mod word_idx;

use std::io::{Read, Write};

use bincode::{Decode, Encode};

use crate::common::{self, MODEL_MAGIC};
use crate::errors::{MilkcatError, Result};
use crate::utils;

pub use cost::{BigramCost, UnigramCost};
pub use crf::{CrfModel, CrfModelBuilder};
pub use lexicon::Lexicon;
pub use maxent::{MaxentModel, MaxentModelBuilder};
pub use word_idx::WordIdx;

/// Type of a lexicon that contains the word.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Decode, Encode)]
#[repr(u8)]
pub enum LexType {
    /// System lexicon.
    System,
    /// User lexicon.
    User,
    /// Unknown words.
    Unknown,
}

impl Default for LexType {
    fn default() -> Self {
        Self::System
    }
}

/// Classifier and feature templates of the dependency parser.
#[derive(Decode, Encode)]
pub struct DependencyModel {
    classifier: MaxentModel,
    templates: Vec<String>,
}

impl DependencyModel {
    /// Creates a new instance.
    pub fn new<I, S>(classifier: MaxentModel, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classifier,
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a model from the classifier text (see
    /// [`MaxentModel::from_reader`]) and the template text, one template per line.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when either text is malformed.
    pub fn from_readers<R, T>(classifier_rdr: R, templates_rdr: T) -> Result<Self>
    where
        R: Read,
        T: Read,
    {
        let classifier = MaxentModel::from_reader(classifier_rdr)?;
        let mut templates = vec![];
        for line in utils::table_lines(templates_rdr) {
            templates.push(line?.1);
        }
        Ok(Self::new(classifier, templates))
    }

    /// Gets the transition classifier.
    #[inline(always)]
    pub const fn classifier(&self) -> &MaxentModel {
        &self.classifier
    }

    /// Gets the feature templates.
    #[inline(always)]
    pub fn templates(&self) -> &[String] {
        &self.templates
    }
}

/// Inner data of [`Model`].
#[derive(Decode, Encode)]
struct ModelInner {
    system_lexicon: Lexicon,
    user_lexicon: Option<Lexicon>,
    bigram: Option<BigramCost>,
    pos: Option<CrfModel>,
    dependency: Option<DependencyModel>,
}

/// Bundle of the model tables.
pub struct Model(ModelInner);

impl Model {
    /// Creates a model with only a system lexicon.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when `system_lexicon` is not of type
    /// [`LexType::System`].
    pub fn new(system_lexicon: Lexicon) -> Result<Self> {
        if system_lexicon.lex_type() != LexType::System {
            return Err(MilkcatError::invalid_argument(
                "system_lexicon",
                "the lexicon type must be System",
            ));
        }
        Ok(Self(ModelInner {
            system_lexicon,
            user_lexicon: None,
            bigram: None,
            pos: None,
            dependency: None,
        }))
    }

    /// Sets the user lexicon.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when `user_lexicon` is not of type
    /// [`LexType::User`].
    pub fn with_user_lexicon(mut self, user_lexicon: Lexicon) -> Result<Self> {
        if user_lexicon.lex_type() != LexType::User {
            return Err(MilkcatError::invalid_argument(
                "user_lexicon",
                "the lexicon type must be User",
            ));
        }
        self.0.user_lexicon = Some(user_lexicon);
        Ok(self)
    }

    /// Sets the bigram cost table over system word ids.
    /// An empty table is dropped, leaving the model with unigram costs only.
    pub fn with_bigram(mut self, bigram: BigramCost) -> Self {
        self.0.bigram = if bigram.is_empty() {
            None
        } else {
            Some(bigram)
        };
        self
    }

    /// Reads the bigram cost table from rows of `left,right,cost`, where
    /// `left` and `right` are words of the system lexicon.
    /// Rows naming unknown words are skipped.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when a row is malformed.
    pub fn with_bigram_from_reader<R>(self, rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut bigram = BigramCost::new();
        let mut skipped = 0;
        for line in utils::table_lines(rdr) {
            let (lineno, line) = line?;
            let cells = utils::parse_csv_row(&line)?;
            if cells.len() != 3 {
                return Err(MilkcatError::invalid_format(
                    "bigram",
                    format!("line {lineno}: expected left,right,cost but got {line}"),
                ));
            }
            let cost: f32 = cells[2].trim().parse()?;
            let lexicon = self.system_lexicon();
            match (lexicon.exact_match(&cells[0]), lexicon.exact_match(&cells[1])) {
                (Some(left), Some(right)) => bigram.insert(left.word_id, right.word_id, cost),
                _ => skipped += 1,
            }
        }
        if skipped != 0 {
            log::warn!("skipped {skipped} bigram entries referring to unknown words");
        }
        Ok(self.with_bigram(bigram))
    }

    /// Sets the CRF model of the part-of-speech tagger.
    pub fn with_pos_model(mut self, pos: CrfModel) -> Self {
        self.0.pos = Some(pos);
        self
    }

    /// Sets the model of the dependency parser.
    pub fn with_dependency_model(mut self, dependency: DependencyModel) -> Self {
        self.0.dependency = Some(dependency);
        self
    }

    /// Gets the reference to the system lexicon.
    #[inline(always)]
    pub const fn system_lexicon(&self) -> &Lexicon {
        &self.0.system_lexicon
    }

    /// Gets the reference to the user lexicon.
    #[inline(always)]
    pub const fn user_lexicon(&self) -> Option<&Lexicon> {
        self.0.user_lexicon.as_ref()
    }

    /// Gets the reference to the bigram cost table.
    #[inline(always)]
    pub const fn bigram(&self) -> Option<&BigramCost> {
        self.0.bigram.as_ref()
    }

    /// Gets the reference to the part-of-speech model.
    #[inline(always)]
    pub const fn pos_model(&self) -> Option<&CrfModel> {
        self.0.pos.as_ref()
    }

    /// Gets the reference to the dependency model.
    #[inline(always)]
    pub const fn dependency_model(&self) -> Option<&DependencyModel> {
        self.0.dependency.as_ref()
    }

    /// Exports the model.
    ///
    /// # Errors
    ///
    /// When bincode generates an error, it will be returned as is.
    pub fn write<W>(&self, mut wtr: W) -> Result<usize>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;
        let num_bytes =
            bincode::encode_into_std_write(&self.0, &mut wtr, common::bincode_config())?;
        Ok(MODEL_MAGIC.len() + num_bytes)
    }

    /// Creates a model from a reader.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the data is not a model exported by
    /// [`Model::write()`].
    pub fn read<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut magic = [0; MODEL_MAGIC.len()];
        rdr.read_exact(&mut magic)?;
        if &magic[..] != MODEL_MAGIC {
            return Err(MilkcatError::invalid_format(
                "rdr",
                "the magic number of the input model mismatches",
            ));
        }
        let inner: ModelInner = bincode::decode_from_std_read(&mut rdr, common::bincode_config())?;
        log::debug!(
            "loaded a model: {} system words, user lexicon: {}, bigram: {}, pos: {}, dependency: {}",
            inner.system_lexicon.num_words(),
            inner.user_lexicon.is_some(),
            inner.bigram.is_some(),
            inner.pos.is_some(),
            inner.dependency.is_some(),
        );
        Ok(Self(inner))
    }
}
