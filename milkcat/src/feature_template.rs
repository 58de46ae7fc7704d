//! Feature templates over a closed set of named slots.
//!
//! A template such as `STw/N0t=[STw]/[N0t]` mixes literal text with
//! `[Slot]` placeholders. Placeholders are resolved to slot ids once when
//! the template is compiled, so that expanding it only indexes into the
//! slot values computed for the current configuration.
use std::ops::Range;

use regex::Regex;

use crate::errors::{MilkcatError, Result};
use crate::model::trie::Trie;
use crate::utils::FromU32;

/// Index from slot names to dense ids.
pub struct FeatureTemplateIndex {
    num_slots: usize,
    map: Trie,
    placeholder_pattern: Regex,
}

impl FeatureTemplateIndex {
    /// Creates an index over `names`; the position of a name is its id.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when a name is empty, contains a
    /// bracket, or appears twice.
    pub fn new<S>(names: &[S]) -> Result<Self>
    where
        S: AsRef<str>,
    {
        let mut records = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if name.is_empty() || name.contains(['[', ']']) {
                return Err(MilkcatError::invalid_argument(
                    "names",
                    format!("invalid slot name: {name:?}"),
                ));
            }
            records.push((name, u32::try_from(i)?));
        }
        records.sort_unstable();
        for pair in records.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(MilkcatError::invalid_argument(
                    "names",
                    format!("duplicate slot name: {}", pair[0].0),
                ));
            }
        }
        Ok(Self {
            num_slots: names.len(),
            map: Trie::from_records(&records)?,
            placeholder_pattern: Regex::new(r"\[([^\[\]]*)\]").unwrap(),
        })
    }

    /// Gets the number of slots.
    #[inline(always)]
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Resolves a slot name into its id.
    #[inline(always)]
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.map.exact_match(name).map(usize::from_u32)
    }

    /// Compiles a template string.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when a placeholder is unterminated or
    /// names an unknown slot.
    pub fn compile<S>(&self, template: S) -> Result<FeatureTemplate>
    where
        S: Into<String>,
    {
        let raw_template = template.into();
        let mut captures = vec![];
        let mut start = 0;
        for m in self.placeholder_pattern.captures_iter(&raw_template) {
            let pattern = m.get(0).unwrap();
            Self::check_literal(&raw_template, start..pattern.start())?;
            let name = m.get(1).unwrap().as_str();
            let slot_id = self.resolve(name).ok_or_else(|| {
                MilkcatError::invalid_format(
                    "template",
                    format!("unknown slot {name:?} in {raw_template}"),
                )
            })?;
            captures.push((pattern.start()..pattern.end(), slot_id));
            start = pattern.end();
        }
        Self::check_literal(&raw_template, start..raw_template.len())?;
        Ok(FeatureTemplate {
            raw_template,
            captures,
        })
    }

    fn check_literal(raw_template: &str, range: Range<usize>) -> Result<()> {
        if raw_template[range].contains(['[', ']']) {
            return Err(MilkcatError::invalid_format(
                "template",
                format!("unterminated placeholder in {raw_template}"),
            ));
        }
        Ok(())
    }
}

/// Template compiled by [`FeatureTemplateIndex::compile()`].
#[derive(Clone, Debug)]
pub struct FeatureTemplate {
    raw_template: String,
    captures: Vec<(Range<usize>, usize)>,
}

impl FeatureTemplate {
    /// Appends the template expanded with `values`, indexed by slot id,
    /// to `out`.
    pub fn expand_into<S>(&self, values: &[S], out: &mut String)
    where
        S: AsRef<str>,
    {
        let mut start = 0;
        for (range, slot_id) in &self.captures {
            out.push_str(&self.raw_template[start..range.start]);
            out.push_str(values[*slot_id].as_ref());
            start = range.end;
        }
        out.push_str(&self.raw_template[start..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOTS: &[&str] = &["STw", "STt", "N0w", "N0t"];

    #[test]
    fn test_resolve() {
        let index = FeatureTemplateIndex::new(SLOTS).unwrap();
        assert_eq!(index.num_slots(), 4);
        assert_eq!(index.resolve("STw"), Some(0));
        assert_eq!(index.resolve("N0t"), Some(3));
        assert_eq!(index.resolve("N0"), None);
        assert_eq!(index.resolve("N1w"), None);
    }

    #[test]
    fn test_duplicate_slot() {
        assert!(FeatureTemplateIndex::new(&["STw", "N0w", "STw"]).is_err());
        assert!(FeatureTemplateIndex::new(&["ST[w]"]).is_err());
    }

    #[test]
    fn test_expand() {
        let index = FeatureTemplateIndex::new(SLOTS).unwrap();
        let template = index.compile("STw/N0t=[STw]/[N0t]").unwrap();
        let values = ["吃", "VV", "苹果", "NN"];
        let mut out = String::new();
        template.expand_into(&values, &mut out);
        assert_eq!(out, "STw/N0t=吃/NN");

        // Appends to the existing contents.
        out.clear();
        out.push_str("prefix:");
        index.compile("BIAS").unwrap().expand_into(&values, &mut out);
        assert_eq!(out, "prefix:BIAS");
    }

    #[test]
    fn test_malformed_template() {
        let index = FeatureTemplateIndex::new(SLOTS).unwrap();
        assert!(index.compile("STw=[STw").is_err());
        assert!(index.compile("STw=STw]").is_err());
        assert!(index.compile("STw=[[STw]]").is_err());
        assert!(index.compile("N1w=[N1w]").is_err());
    }
}
