//! Linear-chain CRF tagger.
pub(crate) mod feature_cache;
pub(crate) mod template;

use std::sync::Arc;

use crate::common::DEFAULT_MAX_TOKENS;
use crate::errors::{MilkcatError, Result};
use crate::model::{CrfModel, Model};
use crate::tagger::feature_cache::FeatureCache;
use crate::tagger::template::CrfTemplate;
use crate::term::TermInstance;

const INVALID_TAG: u32 = u32::MAX;

/// Sequence of positions, each described by columns of strings that the
/// `%x[row,col]` macros of the CRF templates refer to.
pub trait SequenceFeatures {
    /// Gets the number of positions.
    fn len(&self) -> usize;

    /// Checks if there are no positions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends the columns of `position` to `columns`.
    /// Missing columns are treated as empty strings.
    fn extract(&self, position: usize, columns: &mut Vec<String>);
}

impl<S> SequenceFeatures for [Vec<S>]
where
    S: AsRef<str>,
{
    fn len(&self) -> usize {
        <[Vec<S>]>::len(self)
    }

    fn extract(&self, position: usize, columns: &mut Vec<String>) {
        columns.extend(self[position].iter().map(|c| c.as_ref().to_string()));
    }
}

/// Columns of segmented terms: the surface and the abbreviated type.
pub struct TermFeatures<'a>(pub &'a TermInstance);

impl SequenceFeatures for TermFeatures<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn extract(&self, position: usize, columns: &mut Vec<String>) {
        let term = self.0.term(position);
        columns.push(term.text().to_string());
        columns.push(term.term_type().abbreviation().to_string());
    }
}

#[derive(Clone, Copy, Default)]
struct Bucket {
    cost: f64,
    prev: u32,
}

/// Tagger decoding the minimum-cost tag sequence under the CRF model of
/// the part-of-speech tagger in [`Model`].
///
/// A tagger owns its buckets and feature cache, so create one per thread.
pub struct CrfTagger {
    model: Arc<Model>,
    unigram_templates: Vec<CrfTemplate>,
    bigram_templates: Vec<CrfTemplate>,
    row_range: (isize, isize),
    max_length: usize,
    cache: FeatureCache,
    buckets: Vec<Bucket>,
    emission: Vec<f64>,
    transition: Vec<f64>,
}

impl CrfTagger {
    /// Creates a new instance.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the model has no part-of-speech
    /// model or one of its templates is malformed.
    pub fn new(model: Arc<Model>) -> Result<Self> {
        let crf = pos_model(&model)?;
        let pattern = CrfTemplate::macro_pattern();
        let mut unigram_templates = vec![];
        for template in crf.unigram_templates() {
            unigram_templates.push(CrfTemplate::parse(template, crf.xsize(), &pattern)?);
        }
        let mut bigram_templates = vec![];
        for template in crf.bigram_templates() {
            bigram_templates.push(CrfTemplate::parse(template, crf.xsize(), &pattern)?);
        }
        let row_range = unigram_templates
            .iter()
            .chain(&bigram_templates)
            .filter_map(CrfTemplate::row_range)
            .fold((0, 0), |(min, max), (lo, hi)| (min.min(lo), max.max(hi)));
        let num_tags = crf.num_tags();
        log::debug!(
            "CRF tagger: {num_tags} tags, {} unigram and {} bigram templates",
            unigram_templates.len(),
            bigram_templates.len()
        );
        Ok(Self {
            model,
            unigram_templates,
            bigram_templates,
            row_range,
            max_length: DEFAULT_MAX_TOKENS,
            cache: FeatureCache::new(DEFAULT_MAX_TOKENS),
            buckets: vec![Bucket::default(); DEFAULT_MAX_TOKENS * num_tags],
            emission: Vec::with_capacity(num_tags),
            transition: Vec::with_capacity(num_tags * num_tags),
        })
    }

    /// Specifies the maximum length of a sequence.
    /// The default value is [`DEFAULT_MAX_TOKENS`].
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self.cache = FeatureCache::new(max_length);
        self.buckets = vec![Bucket::default(); max_length * self.num_tags()];
        self
    }

    /// Gets the number of tags.
    pub fn num_tags(&self) -> usize {
        self.model.pos_model().map_or(0, CrfModel::num_tags)
    }

    /// Gets the name of a tag.
    pub fn tag_name(&self, tag_id: usize) -> Option<&str> {
        let crf = self.model.pos_model()?;
        (tag_id < crf.num_tags()).then(|| crf.tag_name(tag_id))
    }

    /// Looks up the id of a tag by its name.
    pub fn tag_id(&self, name: &str) -> Option<usize> {
        self.model.pos_model()?.tag_id(name)
    }

    /// Starts tagging `features`. The returned session caches the features
    /// of every position it visits, so several ranges of the same sequence
    /// can be tagged without extracting them again.
    ///
    /// # Errors
    ///
    /// [`MilkcatError::Capacity`] is returned when `features` is longer
    /// than the maximum length.
    pub fn session<'a, F>(&'a mut self, features: &'a F) -> Result<TaggingSession<'a, F>>
    where
        F: SequenceFeatures + ?Sized,
    {
        if features.len() > self.max_length {
            return Err(MilkcatError::capacity(
                "sequence",
                features.len(),
                self.max_length,
            ));
        }
        self.cache.clear();
        Ok(TaggingSession {
            tagger: self,
            features,
        })
    }

    /// Tags the whole sequence and returns the cost of the best path.
    ///
    /// # Errors
    ///
    /// See [`CrfTagger::session()`].
    pub fn tag<F>(&mut self, features: &F, tags: &mut Vec<usize>) -> Result<f64>
    where
        F: SequenceFeatures + ?Sized,
    {
        let len = features.len();
        self.session(features)?.tag_range(0, len, None, None, tags)
    }

    /// Tags `begin..end` of the sequence. See [`TaggingSession::tag_range()`].
    ///
    /// # Errors
    ///
    /// See [`CrfTagger::session()`] and [`TaggingSession::tag_range()`].
    pub fn tag_range<F>(
        &mut self,
        features: &F,
        begin: usize,
        end: usize,
        begin_tag: Option<usize>,
        end_tag: Option<usize>,
        tags: &mut Vec<usize>,
    ) -> Result<f64>
    where
        F: SequenceFeatures + ?Sized,
    {
        self.session(features)?
            .tag_range(begin, end, begin_tag, end_tag, tags)
    }

    /// Computes the tag distribution of `position`.
    /// See [`TaggingSession::probability_at()`].
    ///
    /// # Errors
    ///
    /// See [`CrfTagger::session()`] and [`TaggingSession::probability_at()`].
    pub fn probability_at<F>(
        &mut self,
        features: &F,
        position: usize,
        probs: &mut Vec<f64>,
    ) -> Result<()>
    where
        F: SequenceFeatures + ?Sized,
    {
        self.session(features)?.probability_at(position, probs)
    }

    fn populate<F>(&mut self, features: &F, crf: &CrfModel, position: usize)
    where
        F: SequenceFeatures + ?Sized,
    {
        self.cache.populate(
            features,
            position,
            crf,
            &self.unigram_templates,
            &self.bigram_templates,
            self.row_range,
        );
    }

    fn compute_emission(&mut self, crf: &CrfModel, position: usize) {
        self.emission.clear();
        self.emission.resize(crf.num_tags(), 0.0);
        for &feature_id in self.cache.unigram_ids(position) {
            for (y, c) in self.emission.iter_mut().enumerate() {
                *c += f64::from(crf.unigram_cost(feature_id, y));
            }
        }
    }

    fn compute_transition(&mut self, crf: &CrfModel, position: usize) {
        let num_tags = crf.num_tags();
        self.transition.clear();
        self.transition.resize(num_tags * num_tags, 0.0);
        for &feature_id in self.cache.bigram_ids(position) {
            for left in 0..num_tags {
                for right in 0..num_tags {
                    self.transition[left * num_tags + right] +=
                        f64::from(crf.bigram_cost(feature_id, left, right));
                }
            }
        }
    }

    fn viterbi<F>(
        &mut self,
        features: &F,
        begin: usize,
        end: usize,
        begin_tag: Option<usize>,
        end_tag: Option<usize>,
        tags: &mut Vec<usize>,
    ) -> Result<f64>
    where
        F: SequenceFeatures + ?Sized,
    {
        let model = Arc::clone(&self.model);
        let crf = pos_model(&model)?;
        let num_tags = crf.num_tags();
        if begin > end || end > features.len() {
            return Err(MilkcatError::invalid_argument(
                "range",
                format!("{begin}..{end} is out of 0..{}", features.len()),
            ));
        }
        for &tag in begin_tag.iter().chain(end_tag.iter()) {
            if tag >= num_tags {
                return Err(MilkcatError::invalid_argument(
                    "tag",
                    format!("tag id {tag} is out of range (num_tags={num_tags})"),
                ));
            }
        }
        tags.clear();
        if begin == end {
            return Ok(0.0);
        }

        self.populate(features, crf, begin);
        self.compute_emission(crf, begin);
        if let Some(left) = begin_tag {
            self.compute_transition(crf, begin);
            for y in 0..num_tags {
                self.emission[y] += self.transition[left * num_tags + y];
            }
        }
        for y in 0..num_tags {
            self.buckets[begin * num_tags + y] = Bucket {
                cost: self.emission[y],
                prev: INVALID_TAG,
            };
        }

        for pos in begin + 1..end {
            self.populate(features, crf, pos);
            self.compute_emission(crf, pos);
            self.compute_transition(crf, pos);
            let prev_offset = (pos - 1) * num_tags;
            for right in 0..num_tags {
                let mut best_left = 0;
                let mut best_cost = self.buckets[prev_offset].cost + self.transition[right];
                for left in 1..num_tags {
                    let cost = self.buckets[prev_offset + left].cost
                        + self.transition[left * num_tags + right];
                    if cost < best_cost {
                        best_left = left;
                        best_cost = cost;
                    }
                }
                self.buckets[pos * num_tags + right] = Bucket {
                    cost: best_cost + self.emission[right],
                    prev: best_left as u32,
                };
            }
        }

        let last_offset = (end - 1) * num_tags;
        if let Some(right) = end_tag {
            self.populate(features, crf, end);
            self.compute_transition(crf, end);
            for y in 0..num_tags {
                self.emission[y] = self.buckets[last_offset + y].cost
                    + self.transition[y * num_tags + right];
            }
        } else {
            for y in 0..num_tags {
                self.emission[y] = self.buckets[last_offset + y].cost;
            }
        }
        let mut best = 0;
        for y in 1..num_tags {
            if self.emission[y] < self.emission[best] {
                best = y;
            }
        }
        let total_cost = self.emission[best];

        let mut tag = best;
        tags.push(tag);
        for pos in (begin + 1..end).rev() {
            tag = self.buckets[pos * num_tags + tag].prev as usize;
            tags.push(tag);
        }
        tags.reverse();
        log::trace!("tagged {begin}..{end} with cost {total_cost}");
        Ok(total_cost)
    }

    fn probability<F>(&mut self, features: &F, position: usize, probs: &mut Vec<f64>) -> Result<()>
    where
        F: SequenceFeatures + ?Sized,
    {
        let model = Arc::clone(&self.model);
        let crf = pos_model(&model)?;
        if position >= features.len() {
            return Err(MilkcatError::invalid_argument(
                "position",
                format!("{position} is out of 0..{}", features.len()),
            ));
        }
        self.populate(features, crf, position);
        self.compute_emission(crf, position);

        probs.clear();
        let min_cost = self.emission.iter().copied().fold(f64::INFINITY, f64::min);
        let mut sum = 0.0;
        for &c in &self.emission {
            let p = (min_cost - c).exp();
            probs.push(p);
            sum += p;
        }
        let sum = sum.max(f64::MIN_POSITIVE);
        for p in probs.iter_mut() {
            *p /= sum;
        }
        Ok(())
    }
}

/// Tagging of one sequence, created by [`CrfTagger::session()`].
pub struct TaggingSession<'a, F>
where
    F: ?Sized,
{
    tagger: &'a mut CrfTagger,
    features: &'a F,
}

impl<F> TaggingSession<'_, F>
where
    F: SequenceFeatures + ?Sized,
{
    /// Decodes the minimum-cost tags of positions `begin..end` into `tags`
    /// and returns the cost of the path.
    ///
    /// `begin_tag` pins the tag preceding `begin`, adding the transition
    /// from it into the first position. `end_tag` pins the tag at `end`,
    /// adding the transition from the last position into it.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the range is out of the sequence
    /// or a pinned tag id is out of range.
    pub fn tag_range(
        &mut self,
        begin: usize,
        end: usize,
        begin_tag: Option<usize>,
        end_tag: Option<usize>,
        tags: &mut Vec<usize>,
    ) -> Result<f64> {
        self.tagger
            .viterbi(self.features, begin, end, begin_tag, end_tag, tags)
    }

    /// Computes the distribution of tags at `position` from its unigram
    /// features alone, into `probs` indexed by tag id.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when `position` is out of the sequence.
    pub fn probability_at(&mut self, position: usize, probs: &mut Vec<f64>) -> Result<()> {
        self.tagger.probability(self.features, position, probs)
    }
}

fn pos_model(model: &Model) -> Result<&CrfModel> {
    model.pos_model().ok_or_else(|| {
        MilkcatError::invalid_format("model", "the model has no part-of-speech model")
    })
}
