use std::io::Read;

use bincode::{Decode, Encode};

use super::feature_ids::FeatureIds;
use crate::errors::{MilkcatError, Result};
use crate::utils::{self, FromU32};

/// Multinomial log-linear classifier.
#[derive(Decode, Encode)]
pub struct MaxentModel {
    labels: Vec<String>,
    features: FeatureIds,
    // Indexed by feature_id * ysize + label_id.
    weights: Vec<f32>,
}

impl MaxentModel {
    /// Creates a model from text.
    ///
    /// The first row lists the labels, and each following row is
    /// `feature,label,weight`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when the text is malformed.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut lines = utils::table_lines(rdr);
        let (_, header) = lines
            .next()
            .ok_or_else(|| MilkcatError::invalid_format("maxent", "labels are missing"))??;
        let labels = utils::parse_csv_row(&header)?;
        let mut builder = MaxentModelBuilder::new(&labels)?;
        for line in lines {
            let (lineno, line) = line?;
            let cells = utils::parse_csv_row(&line)?;
            if cells.len() != 3 {
                return Err(MilkcatError::invalid_format(
                    "maxent",
                    format!("line {lineno}: expected feature,label,weight but got {line}"),
                ));
            }
            builder.add(&cells[0], &cells[1], cells[2].trim().parse()?)?;
        }
        Ok(builder.build())
    }

    /// Gets the number of labels.
    #[inline(always)]
    pub fn ysize(&self) -> usize {
        self.labels.len()
    }

    /// Gets the name of a label.
    #[inline(always)]
    pub fn yname(&self, label_id: usize) -> &str {
        &self.labels[label_id]
    }

    /// Classifies an instance given by its feature strings.
    ///
    /// `y_cost` receives the probability of every label, and the id of the
    /// most probable label is returned. Ties go to the smaller id.
    /// Unknown features are ignored.
    pub fn classify<S>(&self, features: &[S], y_cost: &mut Vec<f64>) -> usize
    where
        S: AsRef<str>,
    {
        let ysize = self.ysize();
        y_cost.clear();
        y_cost.resize(ysize, 0.0);
        for feature in features {
            if let Some(feature_id) = self.features.get(feature.as_ref()) {
                let offset = usize::from_u32(feature_id) * ysize;
                for (c, &w) in y_cost.iter_mut().zip(&self.weights[offset..offset + ysize]) {
                    *c += f64::from(w);
                }
            }
        }

        let mut best = 0;
        for (y, &c) in y_cost.iter().enumerate() {
            if c > y_cost[best] {
                best = y;
            }
        }
        let max = y_cost[best];
        let mut sum = 0.0;
        for c in y_cost.iter_mut() {
            *c = (*c - max).exp();
            sum += *c;
        }
        for c in y_cost.iter_mut() {
            *c /= sum;
        }
        best
    }
}

/// Builder of [`MaxentModel`].
pub struct MaxentModelBuilder {
    labels: Vec<String>,
    features: FeatureIds,
    weights: Vec<f32>,
}

impl MaxentModelBuilder {
    /// Creates a builder over `labels`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when `labels` is empty or contains duplicates.
    pub fn new<S>(labels: &[S]) -> Result<Self>
    where
        S: AsRef<str>,
    {
        if labels.is_empty() {
            return Err(MilkcatError::invalid_format("maxent", "no labels are defined"));
        }
        let labels: Vec<String> = labels.iter().map(|l| l.as_ref().trim().to_string()).collect();
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(MilkcatError::invalid_format(
                    "maxent",
                    format!("duplicate label: {label}"),
                ));
            }
        }
        Ok(Self {
            labels,
            features: FeatureIds::new(),
            weights: vec![],
        })
    }

    /// Adds `weight` to the pair of `feature` and `label`.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when `label` is undefined.
    pub fn add(&mut self, feature: &str, label: &str, weight: f32) -> Result<&mut Self> {
        let ysize = self.labels.len();
        let label_id = self
            .labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| {
                MilkcatError::invalid_format("maxent", format!("undefined label: {label}"))
            })?;
        let feature_id = match self.features.get(feature) {
            Some(id) => usize::from_u32(id),
            None => {
                let id = self.features.len();
                self.features.insert(feature.to_string(), u32::try_from(id)?);
                self.weights.resize(self.weights.len() + ysize, 0.0);
                id
            }
        };
        self.weights[feature_id * ysize + label_id] += weight;
        Ok(self)
    }

    /// Builds the model.
    pub fn build(self) -> MaxentModel {
        MaxentModel {
            labels: self.labels,
            features: self.features,
            weights: self.weights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_TXT: &str = "SHIFT,REDUCE,LARC_nsubj
# feature,label,weight
N0w=猫,SHIFT,1.0
N0w=猫,LARC_nsubj,2.0
STw=吃,REDUCE,0.5
";

    #[test]
    fn test_classify() {
        let model = MaxentModel::from_reader(MODEL_TXT.as_bytes()).unwrap();
        assert_eq!(model.ysize(), 3);
        assert_eq!(model.yname(2), "LARC_nsubj");

        let mut y_cost = vec![];
        let best = model.classify(&["N0w=猫", "STw=吃", "N1w=狗"], &mut y_cost);
        assert_eq!(best, 2);
        assert_eq!(y_cost.len(), 3);
        let sum: f64 = y_cost.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(y_cost[2] > y_cost[0]);
        assert!(y_cost[0] > y_cost[1]);
    }

    #[test]
    fn test_classify_no_feature() {
        let model = MaxentModel::from_reader(MODEL_TXT.as_bytes()).unwrap();
        let mut y_cost = vec![];
        let features: [&str; 0] = [];
        assert_eq!(model.classify(&features, &mut y_cost), 0);
        assert!(y_cost.iter().all(|&p| (p - 1.0 / 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_undefined_label() {
        let text = "SHIFT\nN0w=猫,REDUCE,1.0\n";
        assert!(MaxentModel::from_reader(text.as_bytes()).is_err());
    }
}
