use std::ops::Range;

use regex::Regex;

use crate::errors::{MilkcatError, Result};

/// Template of CRF++ such as `U02:%x[-1,0]/%x[0,1]`, where `%x[row,col]`
/// refers to column `col` of the position `row` away from the current one.
#[derive(Debug)]
pub struct CrfTemplate {
    raw_template: String,
    captures: Vec<(Range<usize>, isize, usize)>,
}

impl CrfTemplate {
    pub fn macro_pattern() -> Regex {
        Regex::new(r"%x\[(-?[0-9]+),([0-9]+)\]").unwrap()
    }

    /// Parses a template.
    ///
    /// # Errors
    ///
    /// [`MilkcatError`] is returned when a macro is malformed or refers
    /// to a column not less than `xsize`.
    pub fn parse(raw_template: &str, xsize: usize, pattern: &Regex) -> Result<Self> {
        let mut captures = vec![];
        let mut start = 0;
        for m in pattern.captures_iter(raw_template) {
            let whole = m.get(0).unwrap();
            Self::check_literal(raw_template, start..whole.start())?;
            let row: isize = m.get(1).unwrap().as_str().parse()?;
            let col: usize = m.get(2).unwrap().as_str().parse()?;
            if col >= xsize {
                return Err(MilkcatError::invalid_format(
                    "template",
                    format!("column {col} is out of range (xsize={xsize}) in {raw_template}"),
                ));
            }
            captures.push((whole.start()..whole.end(), row, col));
            start = whole.end();
        }
        Self::check_literal(raw_template, start..raw_template.len())?;
        Ok(Self {
            raw_template: raw_template.to_string(),
            captures,
        })
    }

    fn check_literal(raw_template: &str, range: Range<usize>) -> Result<()> {
        if raw_template[range].contains("%x") {
            return Err(MilkcatError::invalid_format(
                "template",
                format!("malformed macro in {raw_template}"),
            ));
        }
        Ok(())
    }

    /// Range of row offsets referred to, or `None` without macros.
    pub fn row_range(&self) -> Option<(isize, isize)> {
        let min = self.captures.iter().map(|&(_, row, _)| row).min()?;
        let max = self.captures.iter().map(|&(_, row, _)| row).max()?;
        Some((min, max))
    }

    /// Expands the template at `position` of a sequence of `len`
    /// positions into `out`, which is cleared first.
    ///
    /// `columns(p)` gives the columns of position `p`. Rows outside the
    /// sequence expand to `_B-k` before the beginning and `_B+k` after
    /// the end.
    pub fn expand_into<'a, F>(&self, position: usize, len: usize, columns: F, out: &mut String)
    where
        F: Fn(usize) -> &'a [String],
    {
        out.clear();
        let mut start = 0;
        for &(ref range, row, col) in &self.captures {
            out.push_str(&self.raw_template[start..range.start]);
            let target = position as isize + row;
            if target < 0 {
                out.push_str("_B");
                out.push_str(&target.to_string());
            } else if target as usize >= len {
                out.push_str("_B+");
                out.push_str(&(target as usize - len + 1).to_string());
            } else {
                out.push_str(&columns(target as usize)[col]);
            }
            start = range.end;
        }
        out.push_str(&self.raw_template[start..]);
    }
}
