use crate::model::CrfModel;
use crate::tagger::template::CrfTemplate;
use crate::tagger::SequenceFeatures;

#[derive(Default)]
struct CacheEntry {
    columns: Vec<String>,
    columns_ready: bool,
    unigram_ids: Vec<u32>,
    bigram_ids: Vec<u32>,
    populated: bool,
}

/// Per-position cache of extracted columns and feature ids.
///
/// Clearing only touches the positions used since the last clear.
pub struct FeatureCache {
    entries: Vec<CacheEntry>,
    // Inclusive range of touched positions.
    dirty: Option<(usize, usize)>,
    buf: String,
}

impl FeatureCache {
    /// Creates a cache for sequences of up to `max_len` positions. One more
    /// entry is kept for the transition into the position after the end.
    pub fn new(max_len: usize) -> Self {
        let mut entries = Vec::with_capacity(max_len + 1);
        entries.resize_with(max_len + 1, CacheEntry::default);
        Self {
            entries,
            dirty: None,
            buf: String::new(),
        }
    }

    pub fn clear(&mut self) {
        if let Some((min, max)) = self.dirty.take() {
            for entry in &mut self.entries[min..=max] {
                entry.columns_ready = false;
                entry.populated = false;
            }
        }
    }

    #[inline(always)]
    fn touch(&mut self, position: usize) {
        self.dirty = Some(self.dirty.map_or((position, position), |(min, max)| {
            (min.min(position), max.max(position))
        }));
    }

    fn ensure_columns<F>(&mut self, features: &F, position: usize, xsize: usize)
    where
        F: SequenceFeatures + ?Sized,
    {
        if self.entries[position].columns_ready {
            return;
        }
        let entry = &mut self.entries[position];
        entry.columns.clear();
        features.extract(position, &mut entry.columns);
        if entry.columns.len() < xsize {
            entry.columns.resize(xsize, String::new());
        }
        entry.columns_ready = true;
        self.touch(position);
    }

    /// Computes the feature ids of `position` unless cached.
    /// `position` may equal the length of `features`.
    pub fn populate<F>(
        &mut self,
        features: &F,
        position: usize,
        crf: &CrfModel,
        unigram_templates: &[CrfTemplate],
        bigram_templates: &[CrfTemplate],
        row_range: (isize, isize),
    ) where
        F: SequenceFeatures + ?Sized,
    {
        if self.entries[position].populated {
            return;
        }
        let len = features.len();
        let first = (position as isize + row_range.0).max(0) as usize;
        let last = (position as isize + row_range.1 + 1).clamp(0, len as isize) as usize;
        for q in first..last {
            self.ensure_columns(features, q, crf.xsize());
        }

        let mut unigram_ids = std::mem::take(&mut self.entries[position].unigram_ids);
        let mut bigram_ids = std::mem::take(&mut self.entries[position].bigram_ids);
        unigram_ids.clear();
        bigram_ids.clear();
        let entries = &self.entries;
        let buf = &mut self.buf;
        for (templates, ids) in [
            (unigram_templates, &mut unigram_ids),
            (bigram_templates, &mut bigram_ids),
        ] {
            for template in templates {
                template.expand_into(position, len, |q| entries[q].columns.as_slice(), buf);
                if let Some(feature_id) = crf.feature_id(buf) {
                    ids.push(feature_id);
                }
            }
        }

        let entry = &mut self.entries[position];
        entry.unigram_ids = unigram_ids;
        entry.bigram_ids = bigram_ids;
        entry.populated = true;
        self.touch(position);
    }

    #[inline(always)]
    pub fn unigram_ids(&self, position: usize) -> &[u32] {
        debug_assert!(self.entries[position].populated);
        &self.entries[position].unigram_ids
    }

    #[inline(always)]
    pub fn bigram_ids(&self, position: usize) -> &[u32] {
        debug_assert!(self.entries[position].populated);
        &self.entries[position].bigram_ids
    }

    #[cfg(test)]
    pub fn dirty_range(&self) -> Option<(usize, usize)> {
        self.dirty
    }
}
