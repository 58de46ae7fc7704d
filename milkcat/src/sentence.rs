//! Input sentence and its tokens.
use std::ops::Range;

use crate::token::TokenType;

const NOT_BOUNDARY: u32 = u32::MAX;

#[derive(Default, Clone, Copy, Debug, Eq, PartialEq)]
struct TokenSpan {
    start_char: u32,
    end_char: u32,
    token_type: TokenType,
}

/// Input sentence split into tokens.
///
/// Each token is a span of characters with a coarse [`TokenType`].
/// Tokens tile the input without gaps.
#[derive(Default, Clone, Debug)]
pub struct Sentence {
    input: String,
    chars: Vec<char>,
    c2b: Vec<usize>,
    tokens: Vec<TokenSpan>,
    // Maps a character position to the index of the token starting there,
    // or to NOT_BOUNDARY. Has one extra slot for the end of the input.
    c2t: Vec<u32>,
}

impl Sentence {
    /// Creates an empty sentence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the sentence, keeping allocated buffers.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.input.clear();
        self.chars.clear();
        self.c2b.clear();
        self.tokens.clear();
        self.c2t.clear();
    }

    /// Resets the sentence to `input` and tokenizes it with the built-in
    /// character classifier.
    pub fn set_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.clear();
        self.input.push_str(input.as_ref());
        self.compute_basic();
        self.compute_tokens();
        self.compute_boundaries();
    }

    /// Appends a token given by the caller, bypassing the built-in classifier.
    pub fn push_token<S>(&mut self, text: S, token_type: TokenType)
    where
        S: AsRef<str>,
    {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        let start_char = self.chars.len();
        // Drop the end sentinel before extending.
        self.c2b.pop();
        let offset = self.input.len();
        self.input.push_str(text);
        for (bi, ch) in text.char_indices() {
            self.chars.push(ch);
            self.c2b.push(offset + bi);
        }
        self.c2b.push(self.input.len());
        self.tokens.push(TokenSpan {
            start_char: start_char as u32,
            end_char: self.chars.len() as u32,
            token_type,
        });
        self.compute_boundaries();
    }

    fn compute_basic(&mut self) {
        for (bi, ch) in self.input.char_indices() {
            self.chars.push(ch);
            self.c2b.push(bi);
        }
        self.c2b.push(self.input.len());
    }

    fn compute_tokens(&mut self) {
        let mut i = 0;
        while i < self.chars.len() {
            let token_type = TokenType::of_char(self.chars[i]);
            let mut j = i + 1;
            if token_type.groupable() {
                while j < self.chars.len() && TokenType::of_char(self.chars[j]) == token_type {
                    j += 1;
                }
            }
            self.tokens.push(TokenSpan {
                start_char: i as u32,
                end_char: j as u32,
                token_type,
            });
            i = j;
        }
    }

    fn compute_boundaries(&mut self) {
        self.c2t.clear();
        self.c2t.resize(self.chars.len() + 1, NOT_BOUNDARY);
        for (t, span) in self.tokens.iter().enumerate() {
            self.c2t[span.start_char as usize] = t as u32;
        }
        self.c2t[self.chars.len()] = self.tokens.len() as u32;
    }

    /// Gets the raw input.
    #[inline(always)]
    pub fn raw(&self) -> &str {
        &self.input
    }

    #[inline(always)]
    pub(crate) fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Gets the number of tokens.
    #[inline(always)]
    pub fn len_token(&self) -> usize {
        self.tokens.len()
    }

    /// Checks if the sentence has no tokens.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Gets the type of the `i`-th token.
    #[inline(always)]
    pub fn token_type(&self, i: usize) -> TokenType {
        self.tokens[i].token_type
    }

    /// Gets the character position where the `i`-th token starts.
    /// `i` may equal the number of tokens, giving the end of the input.
    #[inline(always)]
    pub fn token_start_char(&self, i: usize) -> usize {
        self.tokens
            .get(i)
            .map_or(self.chars.len(), |span| span.start_char as usize)
    }

    /// Gets the byte range covering tokens `range.start..range.end`.
    #[inline(always)]
    pub fn byte_range(&self, range: Range<usize>) -> Range<usize> {
        self.c2b[self.token_start_char(range.start)]..self.c2b[self.token_start_char(range.end)]
    }

    /// Gets the text of the `i`-th token.
    #[inline(always)]
    pub fn token_text(&self, i: usize) -> &str {
        &self.input[self.byte_range(i..i + 1)]
    }

    /// Maps a character position to the token starting there, if any.
    /// The end of the input maps to the number of tokens.
    #[inline(always)]
    pub(crate) fn token_at_char(&self, pos_char: usize) -> Option<usize> {
        match self.c2t.get(pos_char) {
            Some(&t) if t != NOT_BOUNDARY => Some(t as usize),
            _ => None,
        }
    }
}
