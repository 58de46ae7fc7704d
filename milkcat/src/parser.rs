//! Arc-eager transition-based dependency parser.
pub(crate) mod state;
pub(crate) mod transition;

use std::sync::Arc;

use crate::common::DEFAULT_MAX_TOKENS;
use crate::errors::{MilkcatError, Result};
use crate::feature_template::{FeatureTemplate, FeatureTemplateIndex};
use crate::model::{DependencyModel, Model};
use crate::parser::state::{ParserState, ROOT};
use crate::parser::transition::{Transition, TransitionTable};

/// Names of the slots the feature templates of the parser may refer to.
///
/// `ST` is the stack top, `N0`, `N1` and `N2` are the first three words of
/// the buffer, `STP` is the head of the stack top, `STLC` and `STRC` are
/// the leftmost and rightmost children of the stack top, and `N0LC` is the
/// leftmost child of `N0`. The suffix `w` is the word and `t` is the tag.
pub const PARSER_SLOTS: [&str; 11] = [
    "STw", "STt", "N0w", "N0t", "N1w", "N1t", "N2t", "STPt", "STLCt", "STRCt", "N0LCt",
];

/// Default label of words left without a head at the end of parsing.
pub const DEFAULT_ROOT_LABEL: &str = "ROOT";

const NULL_VALUE: &str = "NULL";
const ROOT_VALUE: &str = "ROOT";

/// Dependency tree output by [`DependencyParser::parse()`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyInstance {
    heads: Vec<usize>,
    labels: Vec<String>,
}

impl DependencyInstance {
    /// Creates an empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the number of words.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Checks if there are no words.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Gets the head of the `i`-th word, counting words from 1. The value
    /// 0 means the root of the sentence.
    #[inline(always)]
    pub fn head(&self, i: usize) -> usize {
        self.heads[i]
    }

    /// Gets the dependency label of the `i`-th word.
    #[inline(always)]
    pub fn label(&self, i: usize) -> &str {
        &self.labels[i]
    }

    fn clear(&mut self) {
        self.heads.clear();
        self.labels.clear();
    }
}

/// Greedy dependency parser choosing each transition by a maxent
/// classifier over features expanded from templates.
///
/// At each step the most probable allowed transition is applied; if the
/// classifier ranks no allowed transition, the parser shifts. Words that
/// end without a head are attached to the root.
///
/// A parser owns its node pool and stack, so create one per thread.
pub struct DependencyParser {
    model: Arc<Model>,
    templates: Vec<FeatureTemplate>,
    transitions: TransitionTable,
    root_label: u16,
    max_length: usize,
    state: ParserState,
    slot_values: Vec<String>,
    features: Vec<String>,
    probs: Vec<f64>,
    ranking: Vec<usize>,
    num_transitions: usize,
}

impl DependencyParser {
    /// Creates a new instance.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the model has no dependency model,
    /// a template is malformed, or a label of the classifier is not a
    /// transition.
    pub fn new(model: Arc<Model>) -> Result<Self> {
        let dependency = dependency_model(&model)?;
        let index = FeatureTemplateIndex::new(&PARSER_SLOTS)?;
        let mut templates = Vec::with_capacity(dependency.templates().len());
        for template in dependency.templates() {
            templates.push(index.compile(template.as_str())?);
        }
        let mut transitions = TransitionTable::new(dependency.classifier())?;
        let root_label = transitions.intern(DEFAULT_ROOT_LABEL)?;
        log::debug!(
            "dependency parser: {} slots, {} templates, {} transitions",
            index.num_slots(),
            templates.len(),
            dependency.classifier().ysize()
        );
        let features = vec![String::new(); templates.len()];
        Ok(Self {
            model,
            templates,
            transitions,
            root_label,
            max_length: DEFAULT_MAX_TOKENS,
            state: ParserState::new(DEFAULT_MAX_TOKENS),
            slot_values: vec![String::new(); PARSER_SLOTS.len()],
            features,
            probs: vec![],
            ranking: vec![],
            num_transitions: 0,
        })
    }

    /// Specifies the maximum number of words in a sentence.
    /// The default value is [`DEFAULT_MAX_TOKENS`].
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self.state = ParserState::new(max_length);
        self
    }

    /// Specifies the label of words left without a head, which are
    /// attached to the root. The default value is [`DEFAULT_ROOT_LABEL`].
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when too many labels are defined.
    pub fn root_label(mut self, label: &str) -> Result<Self> {
        self.root_label = self.transitions.intern(label)?;
        Ok(self)
    }

    /// Gets the number of transitions applied by the last parse.
    pub const fn num_transitions(&self) -> usize {
        self.num_transitions
    }

    /// Parses a sentence of `words` tagged with `tags` into `tree`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError::Capacity`] is returned when the sentence is longer
    /// than the maximum length, and [`MilkcatError::InvalidArgument`] when
    /// `words` and `tags` differ in length. `tree` is left untouched then.
    pub fn parse<S, T>(
        &mut self,
        words: &[S],
        tags: &[T],
        tree: &mut DependencyInstance,
    ) -> Result<()>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        if words.len() != tags.len() {
            return Err(MilkcatError::invalid_argument(
                "tags",
                format!("{} words but {} tags", words.len(), tags.len()),
            ));
        }
        if words.len() > self.max_length {
            return Err(MilkcatError::capacity(
                "sentence",
                words.len(),
                self.max_length,
            ));
        }
        let model = Arc::clone(&self.model);
        let classifier = dependency_model(&model)?.classifier();

        self.state.reset(words.len());
        self.num_transitions = 0;
        while !self.state.is_terminal() {
            self.fill_slots(words, tags);
            for (template, feature) in self.templates.iter().zip(&mut self.features) {
                feature.clear();
                template.expand_into(&self.slot_values, feature);
            }
            classifier.classify(&self.features, &mut self.probs);

            let probs = &self.probs;
            self.ranking.clear();
            self.ranking.extend(0..probs.len());
            self.ranking.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));

            let chosen = self
                .ranking
                .iter()
                .map(|&label_id| self.transitions.transition(label_id))
                .find(|&t| self.state.allows(t));
            let transition = chosen.unwrap_or_else(|| {
                log::warn!(
                    "no allowed transition at word {:?}, falling back to shift",
                    self.state.input(0)
                );
                Transition::Shift
            });
            self.state.apply(transition);
            self.num_transitions += 1;
        }

        for id in 1..self.state.size() {
            if self.state.node(id).head().is_none() {
                self.state.attach(id, ROOT, self.root_label);
            }
        }

        tree.clear();
        for id in 1..self.state.size() {
            let node = self.state.node(id);
            tree.heads.push(node.head().unwrap_or(ROOT));
            let label = node.label().unwrap_or(self.root_label);
            tree.labels.push(self.transitions.label(label).to_string());
        }
        log::trace!(
            "parsed {} words with {} transitions",
            words.len(),
            self.num_transitions
        );
        Ok(())
    }

    fn fill_slots<S, T>(&mut self, words: &[S], tags: &[T])
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let state = &self.state;
        let word = |id: Option<usize>| match id {
            None => NULL_VALUE,
            Some(ROOT) => ROOT_VALUE,
            Some(id) => words[id - 1].as_ref(),
        };
        let tag = |id: Option<usize>| match id {
            None => NULL_VALUE,
            Some(ROOT) => ROOT_VALUE,
            Some(id) => tags[id - 1].as_ref(),
        };
        let st = state.stack_top();
        let n0 = state.input(0);
        let values = [
            word(st),
            tag(st),
            word(n0),
            tag(n0),
            word(state.input(1)),
            tag(state.input(1)),
            tag(state.input(2)),
            tag(st.and_then(|id| state.node(id).head())),
            tag(st.and_then(|id| state.node(id).left_child())),
            tag(st.and_then(|id| state.node(id).right_child())),
            tag(n0.and_then(|id| state.node(id).left_child())),
        ];
        for (slot, value) in self.slot_values.iter_mut().zip(values) {
            slot.clear();
            slot.push_str(value);
        }
    }
}

fn dependency_model(model: &Model) -> Result<&DependencyModel> {
    model.dependency_model().ok_or_else(|| {
        MilkcatError::invalid_format("model", "the model has no dependency model")
    })
}
