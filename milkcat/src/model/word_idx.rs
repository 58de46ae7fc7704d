use bincode::{Decode, Encode};

use crate::model::LexType;

/// Identifier of a term: the lexicon it comes from and its id there.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Decode, Encode)]
pub struct WordIdx {
    /// Type of a lexicon that contains this word.
    pub lex_type: LexType,

    /// ID of this word.
    pub word_id: u32,
}

impl Default for WordIdx {
    fn default() -> Self {
        Self::new(LexType::System, u32::MAX)
    }
}

impl WordIdx {
    /// Identifier reserved for out-of-vocabulary terms.
    pub const OOV: Self = Self::new(LexType::Unknown, 0);

    /// Identifier reserved for the beginning of a sentence.
    pub(crate) const BOS: Self = Self::new(LexType::Unknown, u32::MAX);

    /// Creates a new instance.
    #[inline(always)]
    pub(crate) const fn new(lex_type: LexType, word_id: u32) -> Self {
        Self { lex_type, word_id }
    }

    /// Checks if the word is out of vocabulary.
    #[inline(always)]
    pub fn is_oov(&self) -> bool {
        *self == Self::OOV
    }
}
