//! End-to-end pipeline from raw text to words, tags and dependencies.
use std::sync::Arc;

use crate::errors::Result;
use crate::model::Model;
use crate::parser::{DependencyInstance, DependencyParser};
use crate::segmenter::Segmenter;
use crate::sentence::Sentence;
use crate::tagger::{CrfTagger, TermFeatures};
use crate::term::TermInstance;
use crate::token::TokenType;

/// Word output by [`Analyzer::analyze()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalyzedWord {
    text: String,
    word_type: TokenType,
    tag: Option<String>,
    head: Option<usize>,
    label: Option<String>,
}

impl AnalyzedWord {
    /// Gets the surface string.
    #[inline(always)]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Gets the type of the word.
    #[inline(always)]
    pub const fn word_type(&self) -> TokenType {
        self.word_type
    }

    /// Gets the part-of-speech tag, if the model has a tagger.
    #[inline(always)]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Gets the head counting words from 1 (0 is the root), if the model
    /// has a parser.
    #[inline(always)]
    pub const fn head(&self) -> Option<usize> {
        self.head
    }

    /// Gets the dependency label, if the model has a parser.
    #[inline(always)]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Pipeline of the segmenter, the tagger and the parser.
///
/// The tagger runs if the model has a part-of-speech model, and the parser
/// runs if it has a dependency model. Without a tagger, the parser reads
/// the abbreviated word types as tags.
pub struct Analyzer {
    sent: Sentence,
    segmenter: Segmenter,
    tagger: Option<CrfTagger>,
    parser: Option<DependencyParser>,
    terms: TermInstance,
    tag_ids: Vec<usize>,
    texts: Vec<String>,
    tags: Vec<String>,
    tree: DependencyInstance,
    words: Vec<AnalyzedWord>,
}

impl Analyzer {
    /// Creates a new instance.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`](crate::errors::MilkcatError) is returned when the
    /// tagger or the parser cannot be built from the model.
    pub fn new(model: Arc<Model>) -> Result<Self> {
        let tagger = if model.pos_model().is_some() {
            Some(CrfTagger::new(Arc::clone(&model))?)
        } else {
            None
        };
        let parser = if model.dependency_model().is_some() {
            Some(DependencyParser::new(Arc::clone(&model))?)
        } else {
            None
        };
        Ok(Self {
            sent: Sentence::new(),
            segmenter: Segmenter::new(model),
            tagger,
            parser,
            terms: TermInstance::default(),
            tag_ids: vec![],
            texts: vec![],
            tags: vec![],
            tree: DependencyInstance::new(),
            words: vec![],
        })
    }

    /// Specifies the beam width of the segmenter.
    /// See [`Segmenter::beam_width()`].
    ///
    /// # Errors
    ///
    /// [`MilkcatError`](crate::errors::MilkcatError) is returned when
    /// `beam_width` is 0.
    pub fn beam_width(mut self, beam_width: usize) -> Result<Self> {
        self.segmenter = self.segmenter.beam_width(beam_width)?;
        Ok(self)
    }

    /// Specifies the maximum number of tokens in a sentence for every stage.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.segmenter = self.segmenter.max_tokens(max_tokens);
        self.terms = TermInstance::new(max_tokens);
        self.tagger = self.tagger.map(|t| t.max_length(max_tokens));
        self.parser = self.parser.map(|p| p.max_length(max_tokens));
        self
    }

    /// Checks if the pipeline tags words.
    pub const fn has_tagger(&self) -> bool {
        self.tagger.is_some()
    }

    /// Checks if the pipeline parses sentences.
    pub const fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Analyzes `text`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError::Capacity`](crate::errors::MilkcatError::Capacity) is
    /// returned when `text` has too many tokens.
    pub fn analyze<S>(&mut self, text: S) -> Result<&[AnalyzedWord]>
    where
        S: AsRef<str>,
    {
        self.words.clear();
        self.sent.set_sentence(text);
        self.segmenter.segment(&self.sent, &mut self.terms)?;

        self.tags.clear();
        let tagged = if let Some(tagger) = self.tagger.as_mut() {
            tagger.tag(&TermFeatures(&self.terms), &mut self.tag_ids)?;
            for &tag_id in &self.tag_ids {
                self.tags
                    .push(tagger.tag_name(tag_id).unwrap_or_default().to_string());
            }
            true
        } else {
            // The parser reads the abbreviated word types instead.
            if self.parser.is_some() {
                self.tags.extend(
                    self.terms
                        .iter()
                        .map(|t| t.term_type().abbreviation().to_string()),
                );
            }
            false
        };

        let parsed = if let Some(parser) = self.parser.as_mut() {
            self.texts.clear();
            self.texts
                .extend(self.terms.iter().map(|t| t.text().to_string()));
            parser.parse(&self.texts, &self.tags, &mut self.tree)?;
            true
        } else {
            false
        };

        for (i, term) in self.terms.iter().enumerate() {
            self.words.push(AnalyzedWord {
                text: term.text().to_string(),
                word_type: term.term_type(),
                tag: self.tags.get(i).filter(|_| tagged).cloned(),
                head: parsed.then(|| self.tree.head(i)),
                label: parsed.then(|| self.tree.label(i).to_string()),
            });
        }
        Ok(&self.words)
    }
}
