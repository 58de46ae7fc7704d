//! Coarse character classes of tokens and terms.
use std::fmt;

use bincode::{Decode, Encode};

/// Coarse class of a token, also used as the type of a segmented term.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Decode, Encode)]
#[repr(u8)]
pub enum TokenType {
    /// A CJK ideograph, or a term spanning several tokens.
    Chinese,
    /// A run of Latin letters.
    English,
    /// A run of digits.
    Number,
    /// A symbol such as `$`, `+` or `©`.
    Symbol,
    /// A punctuation mark.
    Punctuation,
    /// A run of whitespace.
    Space,
    /// Anything else, e.g., letters of other scripts.
    Other,
}

impl Default for TokenType {
    fn default() -> Self {
        Self::Other
    }
}

impl TokenType {
    /// Classifies a character.
    pub fn of_char(c: char) -> Self {
        if is_cjk_ideograph(c) {
            Self::Chinese
        } else if c.is_whitespace() {
            Self::Space
        } else if c.is_ascii_digit() || ('０'..='９').contains(&c) {
            Self::Number
        } else if c.is_ascii_alphabetic()
            || ('Ａ'..='Ｚ').contains(&c)
            || ('ａ'..='ｚ').contains(&c)
            || (c.is_alphabetic() && c <= '\u{024f}')
        {
            Self::English
        } else if is_punctuation(c) {
            Self::Punctuation
        } else if c.is_alphanumeric() {
            Self::Other
        } else {
            Self::Symbol
        }
    }

    /// Returns `true` if consecutive characters of this class form one token.
    #[inline(always)]
    pub const fn groupable(self) -> bool {
        matches!(
            self,
            Self::English | Self::Number | Self::Space | Self::Other
        )
    }

    /// Short name used in feature columns and printed output.
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Chinese => "ZH",
            Self::English => "EN",
            Self::Number => "NUM",
            Self::Symbol => "SYM",
            Self::Punctuation => "PU",
            Self::Space => "SP",
            Self::Other => "OTH",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c,
        '\u{3400}'..='\u{4dbf}'
        | '\u{4e00}'..='\u{9fff}'
        | '\u{f900}'..='\u{faff}'
        | '\u{20000}'..='\u{2a6df}'
        | '\u{2a700}'..='\u{2ebef}'
        | '\u{3007}')
}

fn is_punctuation(c: char) -> bool {
    match c {
        '!' | '"' | '\'' | '(' | ')' | ',' | '-' | '.' | ':' | ';' | '?' | '[' | ']' | '{'
        | '}' => true,
        // General Punctuation, CJK Symbols and Punctuation
        '\u{2010}'..='\u{205e}' | '\u{3000}'..='\u{303f}' => true,
        // Fullwidth ASCII punctuation
        '！' | '＂' | '＇' | '（' | '）' | '，' | '－' | '．' | '：' | '；' | '？' | '［'
        | '］' | '｛' | '｝' | '｡' | '､' => true,
        _ => false,
    }
}
