use std::io::{BufRead, BufReader, Read};

use bincode::{Decode, Encode};
use hashbrown::HashMap;

use super::feature_ids::FeatureIds;
use crate::errors::{MilkcatError, Result};
use crate::utils::FromU32;

/// Weight table of a linear-chain CRF.
///
/// Weights are stored as costs (negated scores), so the best tag sequence is
/// the one with the minimum total cost. A unigram feature with id `f` owns
/// the costs `f..f + T` (one per tag) and a bigram feature owns
/// `f..f + T * T` indexed by `left * T + right`, where `T` is the number
/// of tags. This follows the layout of CRF++ models.
#[derive(Decode, Encode)]
pub struct CrfModel {
    tags: Vec<String>,
    xsize: u32,
    unigram_templates: Vec<String>,
    bigram_templates: Vec<String>,
    features: FeatureIds,
    costs: Vec<f32>,
}

impl CrfModel {
    /// Creates a model from the text format written by `crf_learn -t`.
    ///
    /// The scores in the file are converted into costs as
    /// `-(weight * cost_factor)`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the model text is malformed.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut lines = BufReader::new(rdr).lines();

        let mut cost_factor = 1.0;
        let mut maxid = None;
        let mut xsize = None;
        for line in read_section(&mut lines)? {
            let (key, value) = line.split_once(':').ok_or_else(|| {
                MilkcatError::invalid_format("crf", format!("invalid header line: {line}"))
            })?;
            let value = value.trim();
            match key.trim() {
                "cost-factor" => cost_factor = value.parse()?,
                "maxid" => maxid = Some(value.parse::<usize>()?),
                "xsize" => xsize = Some(value.parse::<u32>()?),
                _ => (),
            }
        }
        let maxid = maxid.ok_or_else(|| MilkcatError::invalid_format("crf", "maxid is missing"))?;
        let xsize = xsize.ok_or_else(|| MilkcatError::invalid_format("crf", "xsize is missing"))?;

        let tags = read_section(&mut lines)?;
        let mut builder = CrfModelBuilder::new(&tags, xsize)?;
        for template in read_section(&mut lines)? {
            builder.template(template)?;
        }

        let mut offsets = vec![];
        for line in read_section(&mut lines)? {
            let (offset, feature) = line.split_once(' ').ok_or_else(|| {
                MilkcatError::invalid_format("crf", format!("invalid feature line: {line}"))
            })?;
            offsets.push((offset.parse::<u32>()?, feature.to_string()));
        }

        let mut costs = Vec::with_capacity(maxid);
        for line in lines {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let weight: f64 = line.parse()?;
            costs.push((-weight * cost_factor) as f32);
        }
        if costs.len() != maxid {
            return Err(MilkcatError::invalid_format(
                "crf",
                format!("expected {maxid} weights but got {}", costs.len()),
            ));
        }

        builder.costs = costs;
        for (offset, feature) in offsets {
            let width = if feature.starts_with('B') {
                builder.bigram_width()
            } else {
                builder.unigram_width()
            };
            builder.register(feature, offset, width)?;
        }
        builder.build()
    }

    /// Gets the number of tags.
    #[inline(always)]
    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    /// Gets the name of a tag.
    #[inline(always)]
    pub fn tag_name(&self, tag_id: usize) -> &str {
        &self.tags[tag_id]
    }

    /// Looks up the id of a tag by its name.
    pub fn tag_id(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == name)
    }

    /// Gets the number of columns the templates may refer to.
    #[inline(always)]
    pub fn xsize(&self) -> usize {
        usize::from_u32(self.xsize)
    }

    /// Gets the unigram templates.
    pub fn unigram_templates(&self) -> &[String] {
        &self.unigram_templates
    }

    /// Gets the bigram templates.
    pub fn bigram_templates(&self) -> &[String] {
        &self.bigram_templates
    }

    /// Looks up the id of a feature string.
    #[inline(always)]
    pub fn feature_id(&self, feature: &str) -> Option<u32> {
        self.features.get(feature)
    }

    /// Gets the cost of assigning `tag` under the unigram feature `feature_id`.
    #[inline(always)]
    pub fn unigram_cost(&self, feature_id: u32, tag: usize) -> f32 {
        self.costs[usize::from_u32(feature_id) + tag]
    }

    /// Gets the cost of the transition `left -> right` under the bigram
    /// feature `feature_id`.
    #[inline(always)]
    pub fn bigram_cost(&self, feature_id: u32, left: usize, right: usize) -> f32 {
        self.costs[usize::from_u32(feature_id) + left * self.tags.len() + right]
    }
}

fn read_section<I>(lines: &mut I) -> Result<Vec<String>>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let mut section = vec![];
    for line in lines {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            if section.is_empty() {
                continue;
            }
            break;
        }
        section.push(line.to_string());
    }
    Ok(section)
}

/// Builder of [`CrfModel`].
pub struct CrfModelBuilder {
    tags: Vec<String>,
    xsize: u32,
    unigram_templates: Vec<String>,
    bigram_templates: Vec<String>,
    features: FeatureIds,
    costs: Vec<f32>,
}

impl CrfModelBuilder {
    /// Creates a builder for a model over `tags` whose templates refer to
    /// `xsize` feature columns.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when `tags` is empty or contains duplicates.
    pub fn new<S>(tags: &[S], xsize: u32) -> Result<Self>
    where
        S: AsRef<str>,
    {
        if tags.is_empty() {
            return Err(MilkcatError::invalid_format("crf", "no tags are defined"));
        }
        let mut seen = HashMap::new();
        for (i, tag) in tags.iter().enumerate() {
            if seen.insert(tag.as_ref(), i).is_some() {
                return Err(MilkcatError::invalid_format(
                    "crf",
                    format!("duplicate tag: {}", tag.as_ref()),
                ));
            }
        }
        Ok(Self {
            tags: tags.iter().map(|t| t.as_ref().to_string()).collect(),
            xsize,
            unigram_templates: vec![],
            bigram_templates: vec![],
            features: FeatureIds::new(),
            costs: vec![],
        })
    }

    /// Adds a template. Templates starting with `U` are unigram templates and
    /// those starting with `B` are bigram templates.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned for any other template.
    pub fn template<S>(&mut self, template: S) -> Result<&mut Self>
    where
        S: Into<String>,
    {
        let template = template.into();
        if template.starts_with('U') {
            self.unigram_templates.push(template);
        } else if template.starts_with('B') {
            self.bigram_templates.push(template);
        } else {
            return Err(MilkcatError::invalid_format(
                "crf",
                format!("template must start with U or B: {template}"),
            ));
        }
        Ok(self)
    }

    /// Adds a unigram feature with one cost per tag.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the number of costs does not match,
    /// or when the feature is already registered.
    pub fn add_unigram_feature<S>(&mut self, feature: S, costs: &[f32]) -> Result<&mut Self>
    where
        S: Into<String>,
    {
        self.add_feature(feature.into(), costs, self.unigram_width())
    }

    /// Adds a bigram feature with costs indexed by `left * num_tags + right`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the number of costs does not match,
    /// or when the feature is already registered.
    pub fn add_bigram_feature<S>(&mut self, feature: S, costs: &[f32]) -> Result<&mut Self>
    where
        S: Into<String>,
    {
        self.add_feature(feature.into(), costs, self.bigram_width())
    }

    fn add_feature(&mut self, feature: String, costs: &[f32], width: usize) -> Result<&mut Self> {
        if costs.len() != width {
            return Err(MilkcatError::invalid_format(
                "crf",
                format!(
                    "feature {feature} needs {width} costs but got {}",
                    costs.len()
                ),
            ));
        }
        if self.features.get(&feature).is_some() {
            return Err(MilkcatError::invalid_format(
                "crf",
                format!("duplicate feature: {feature}"),
            ));
        }
        let offset = u32::try_from(self.costs.len())?;
        self.costs.extend_from_slice(costs);
        self.register(feature, offset, width)?;
        Ok(self)
    }

    fn register(&mut self, feature: String, offset: u32, width: usize) -> Result<()> {
        if usize::from_u32(offset) + width > self.costs.len() {
            return Err(MilkcatError::invalid_format(
                "crf",
                format!("costs of feature {feature} are out of range"),
            ));
        }
        if !self.features.insert(feature, offset) {
            return Err(MilkcatError::invalid_format("crf", "duplicate feature"));
        }
        Ok(())
    }

    #[inline(always)]
    fn unigram_width(&self) -> usize {
        self.tags.len()
    }

    #[inline(always)]
    fn bigram_width(&self) -> usize {
        self.tags.len() * self.tags.len()
    }

    /// Builds the model.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when no unigram template is defined.
    pub fn build(self) -> Result<CrfModel> {
        if self.unigram_templates.is_empty() {
            return Err(MilkcatError::invalid_format(
                "crf",
                "at least one unigram template is required",
            ));
        }
        Ok(CrfModel {
            tags: self.tags,
            xsize: self.xsize,
            unigram_templates: self.unigram_templates,
            bigram_templates: self.bigram_templates,
            features: self.features,
            costs: self.costs,
        })
    }
}
