//! Container of segmented terms.
use std::ops::Range;

use crate::common::DEFAULT_MAX_TOKENS;
use crate::model::WordIdx;
use crate::token::TokenType;

/// Segmented term.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub(crate) text: String,
    pub(crate) word_idx: WordIdx,
    pub(crate) range_token: Range<usize>,
    pub(crate) range_byte: Range<usize>,
    pub(crate) term_type: TokenType,
    pub(crate) total_cost: f64,
}

impl Term {
    /// Gets the surface string of the term.
    #[inline(always)]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Gets the identifier of the term, [`WordIdx::OOV`] if out of vocabulary.
    #[inline(always)]
    pub const fn word_idx(&self) -> WordIdx {
        self.word_idx
    }

    /// Gets the position range of the term in tokens.
    #[inline(always)]
    pub fn range_token(&self) -> Range<usize> {
        self.range_token.clone()
    }

    /// Gets the position range of the term in bytes.
    #[inline(always)]
    pub fn range_byte(&self) -> Range<usize> {
        self.range_byte.clone()
    }

    /// Gets the type of the term.
    #[inline(always)]
    pub const fn term_type(&self) -> TokenType {
        self.term_type
    }

    /// Gets the total cost of the path from the beginning of the sentence
    /// to this term.
    #[inline(always)]
    pub const fn total_cost(&self) -> f64 {
        self.total_cost
    }
}

/// Reusable output buffer of a segmentation.
///
/// Its capacity is fixed at construction, and each call to
/// [`Segmenter::segment()`](crate::Segmenter::segment) overwrites it.
pub struct TermInstance {
    terms: Vec<Term>,
    capacity: usize,
}

impl Default for TermInstance {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

impl TermInstance {
    /// Creates an instance that can hold up to `capacity` terms.
    pub fn new(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity.min(DEFAULT_MAX_TOKENS)),
            capacity,
        }
    }

    /// Gets the maximum number of terms.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Gets the number of terms.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Checks if there are no terms.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Gets the `i`-th term.
    #[inline(always)]
    pub fn term(&self, i: usize) -> &Term {
        &self.terms[i]
    }

    /// Creates an iterator of terms.
    #[inline(always)]
    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    /// Gets the cost of the whole path, or 0 when there are no terms.
    #[inline(always)]
    pub fn total_cost(&self) -> f64 {
        self.terms.last().map_or(0.0, |t| t.total_cost)
    }

    #[inline(always)]
    pub(crate) fn clear(&mut self) {
        self.terms.clear();
    }

    #[inline(always)]
    pub(crate) fn push(&mut self, term: Term) {
        debug_assert!(self.terms.len() < self.capacity);
        self.terms.push(term);
    }
}

impl<'a> IntoIterator for &'a TermInstance {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
