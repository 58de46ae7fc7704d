use std::collections::BTreeMap;
use std::io::Read;

use bincode::{Decode, Encode};

use super::cost::UnigramCost;
use super::trie::Trie;
use super::{LexType, WordIdx};
use crate::common::USER_DEFAULT_COST;
use crate::errors::{MilkcatError, Result};
use crate::utils;

/// Lexicon of words with their unigram costs.
///
/// Word ids are dense: the `i`-th word has id `i` and its cost is the
/// `i`-th entry of the unigram table.
#[derive(Decode, Encode)]
pub struct Lexicon {
    map: Trie,
    costs: UnigramCost,
    lex_type: LexType,
}

impl Lexicon {
    /// Creates a lexicon from `(word, cost)` pairs; the position of a pair is the word id.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when a word is empty or appears twice.
    pub fn new<I, W>(entries: I, lex_type: LexType) -> Result<Self>
    where
        I: IntoIterator<Item = (W, f32)>,
        W: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        let mut costs = vec![];
        for (word, cost) in entries {
            let word = word.as_ref();
            if word.is_empty() {
                return Err(MilkcatError::invalid_format(
                    "lexicon",
                    "a word must not be empty",
                ));
            }
            let word_id = u32::try_from(costs.len())?;
            if map.insert(word.to_string(), word_id).is_some() {
                return Err(MilkcatError::invalid_format(
                    "lexicon",
                    format!("duplicate word: {word}"),
                ));
            }
            costs.push(cost);
        }
        let records: Vec<_> = map.into_iter().collect();
        Ok(Self {
            map: Trie::from_records(&records)?,
            costs: UnigramCost::new(costs),
            lex_type,
        })
    }

    /// Creates a lexicon from rows of `word,cost`.
    ///
    /// Rows of a user lexicon may omit the cost; such words get
    /// [`USER_DEFAULT_COST`](crate::common::USER_DEFAULT_COST).
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when a row is malformed.
    pub fn from_reader<R>(rdr: R, lex_type: LexType) -> Result<Self>
    where
        R: Read,
    {
        let mut entries = vec![];
        for line in utils::table_lines(rdr) {
            let (lineno, line) = line?;
            let cells = utils::parse_csv_row(&line)?;
            let cost = match (cells.len(), lex_type) {
                (1, LexType::User) => USER_DEFAULT_COST,
                (2, _) => cells[1].trim().parse()?,
                _ => {
                    return Err(MilkcatError::invalid_format(
                        "lexicon",
                        format!("line {lineno}: expected word,cost but got {line}"),
                    ));
                }
            };
            entries.push((cells.into_iter().next().unwrap_or_default(), cost));
        }
        Self::new(entries, lex_type)
    }

    /// Enumerates the words that are prefixes of `input`, with the word
    /// end in characters. Words are reported in increasing length.
    #[inline(always)]
    pub(crate) fn common_prefix_iterator<'a>(
        &'a self,
        input: &'a [char],
    ) -> impl Iterator<Item = LexMatch> + 'a {
        self.map.common_prefix_iterator(input).map(move |m| {
            LexMatch::new(
                WordIdx::new(self.lex_type, m.value),
                self.costs.cost(m.value),
                m.end_char,
            )
        })
    }

    /// Looks up the id of `word`.
    #[inline(always)]
    pub fn exact_match(&self, word: &str) -> Option<WordIdx> {
        self.map
            .exact_match(word)
            .map(|word_id| WordIdx::new(self.lex_type, word_id))
    }

    /// Gets the unigram cost of a word in this lexicon.
    #[inline(always)]
    pub fn cost(&self, word_idx: WordIdx) -> f32 {
        debug_assert_eq!(word_idx.lex_type, self.lex_type);
        self.costs.cost(word_idx.word_id)
    }

    /// Gets the number of words.
    #[inline(always)]
    pub fn num_words(&self) -> usize {
        self.costs.len()
    }

    /// Gets the type of the lexicon.
    #[inline(always)]
    pub const fn lex_type(&self) -> LexType {
        self.lex_type
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct LexMatch {
    pub word_idx: WordIdx,
    pub cost: f32,
    pub end_char: u32,
}

impl LexMatch {
    #[inline(always)]
    pub const fn new(word_idx: WordIdx, cost: f32, end_char: u32) -> Self {
        Self {
            word_idx,
            cost,
            end_char,
        }
    }
}
