//! Beam-search word segmenter.
pub(crate) mod lattice;

use std::sync::Arc;

use crate::common::{DEFAULT_BEAM_WIDTH, DEFAULT_MAX_TOKENS, OOV_COST};
use crate::errors::{MilkcatError, Result};
use crate::model::lexicon::LexMatch;
use crate::model::{BigramCost, LexType, Model, WordIdx};
use crate::segmenter::lattice::Lattice;
use crate::sentence::Sentence;
use crate::term::{Term, TermInstance};
use crate::token::TokenType;
use crate::utils::FromU32;

/// Word segmenter that searches the lattice of lexicon words over the
/// tokens of a sentence.
///
/// Each hypothesis costs the sum of its word costs. A word costs its
/// bigram cost with the previous word when both are system words and the
/// pair is in the bigram table, or its unigram cost otherwise. Only the
/// best `beam_width` hypotheses are kept at each token boundary.
///
/// A segmenter owns its working buffers, so create one per thread and
/// share the [`Model`] through [`Arc`].
pub struct Segmenter {
    model: Arc<Model>,
    beam_width: usize,
    max_tokens: usize,
    lattice: Lattice,
    path: Vec<u32>,
}

impl Segmenter {
    /// Creates a new instance.
    ///
    /// The beam width defaults to [`DEFAULT_BEAM_WIDTH`] when the model
    /// has a bigram table and to 1 otherwise, with which the search is
    /// exact for unigram costs.
    pub fn new(model: Arc<Model>) -> Self {
        let beam_width = if model.bigram().is_some() {
            DEFAULT_BEAM_WIDTH
        } else {
            1
        };
        Self {
            model,
            beam_width,
            max_tokens: DEFAULT_MAX_TOKENS,
            lattice: Lattice::default(),
            path: vec![],
        }
    }

    /// Specifies the number of hypotheses kept at each token boundary.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when `beam_width` is 0.
    pub fn beam_width(mut self, beam_width: usize) -> Result<Self> {
        if beam_width == 0 {
            return Err(MilkcatError::invalid_argument(
                "beam_width",
                "must be at least 1",
            ));
        }
        self.beam_width = beam_width;
        Ok(self)
    }

    /// Specifies the maximum number of tokens in a sentence.
    /// The default value is [`DEFAULT_MAX_TOKENS`].
    pub const fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Gets the reference to the model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Segments `sent` into `terms`, overwriting its content.
    ///
    /// The terms cover all the tokens of `sent` in order without gaps.
    /// A token that begins no lexicon word becomes a single-token term
    /// with [`WordIdx::OOV`].
    ///
    /// # Errors
    ///
    /// [`MilkcatError::Capacity`] is returned when `sent` has more tokens
    /// than the maximum or than the capacity of `terms`. `terms` is left
    /// untouched in that case.
    pub fn segment(&mut self, sent: &Sentence, terms: &mut TermInstance) -> Result<()> {
        let len_token = sent.len_token();
        if len_token > self.max_tokens {
            return Err(MilkcatError::capacity("sentence", len_token, self.max_tokens));
        }
        if len_token > terms.capacity() {
            return Err(MilkcatError::capacity("terms", len_token, terms.capacity()));
        }
        u32::try_from(len_token)?;

        terms.clear();
        if len_token == 0 {
            return Ok(());
        }

        build_lattice(&self.model, sent, &mut self.lattice, self.beam_width);

        self.path.clear();
        self.lattice.append_best_path(&mut self.path);
        for &idx in &self.path {
            let node = self.lattice.node(idx);
            let range_token = node.start_token()..node.end_token();
            let term_type = if range_token.len() == 1 {
                sent.token_type(range_token.start)
            } else {
                TokenType::Chinese
            };
            let range_byte = sent.byte_range(range_token.clone());
            terms.push(Term {
                text: sent.raw()[range_byte.clone()].to_string(),
                word_idx: node.word_idx(),
                range_token,
                range_byte,
                term_type,
                total_cost: node.cost(),
            });
        }
        log::trace!(
            "segmented {len_token} tokens into {} terms, cost={:?}",
            terms.len(),
            self.lattice.best_cost()
        );
        Ok(())
    }
}

fn build_lattice(model: &Model, sent: &Sentence, lattice: &mut Lattice, beam_width: usize) {
    let len_token = sent.len_token();
    lattice.reset(len_token, beam_width);

    for start in 0..len_token {
        if !lattice.has_previous_node(start) {
            continue;
        }
        let start_char = sent.token_start_char(start);
        let suffix = &sent.chars()[start_char..];

        if let Some(user_lexicon) = model.user_lexicon() {
            for m in user_lexicon.common_prefix_iterator(suffix) {
                add_lattice_edge(model.bigram(), sent, lattice, start, start_char, m);
            }
        }
        for m in model.system_lexicon().common_prefix_iterator(suffix) {
            add_lattice_edge(model.bigram(), sent, lattice, start, start_char, m);
        }

        if !lattice.has_previous_node(start + 1) {
            let best = lattice.beam(start)[0];
            let cost = lattice.node(best).cost() + f64::from(OOV_COST);
            lattice.insert_node(start, start + 1, WordIdx::OOV, best, cost);
        }
    }
}

fn add_lattice_edge(
    bigram: Option<&BigramCost>,
    sent: &Sentence,
    lattice: &mut Lattice,
    start: usize,
    start_char: usize,
    m: LexMatch,
) {
    let end_char = start_char + usize::from_u32(m.end_char);
    // Words ending inside a token are not candidates.
    let Some(end) = sent.token_at_char(end_char) else {
        return;
    };
    let right = m.word_idx;
    let unigram = f64::from(m.cost);
    let best = lattice.search_min_node(start, |left| {
        connection_cost(bigram, left, right).unwrap_or(unigram)
    });
    if let Some((prev_idx, cost)) = best {
        lattice.insert_node(start, end, right, prev_idx, cost);
    }
}

#[inline(always)]
fn connection_cost(bigram: Option<&BigramCost>, left: WordIdx, right: WordIdx) -> Option<f64> {
    if left.lex_type != LexType::System || right.lex_type != LexType::System {
        return None;
    }
    bigram?
        .cost(left.word_id, right.word_id)
        .map(f64::from)
}
