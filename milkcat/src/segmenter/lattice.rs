use crate::model::WordIdx;
use crate::utils::FromU32;

const INVALID_IDX: u32 = u32::MAX;

/// Hypothesis of the segmentation search. Nodes live in the arena of
/// [`Lattice`] and refer to their predecessors by arena index.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    start_token: u32,
    end_token: u32,
    word_idx: WordIdx,
    prev_idx: u32,
    // Position along the path, counting BOS as 0.
    rank: u32,
    cost: f64,
}

impl Node {
    #[inline(always)]
    pub fn start_token(&self) -> usize {
        usize::from_u32(self.start_token)
    }

    #[inline(always)]
    pub fn end_token(&self) -> usize {
        usize::from_u32(self.end_token)
    }

    #[inline(always)]
    pub const fn word_idx(&self) -> WordIdx {
        self.word_idx
    }

    /// Arena index of the predecessor, or `None` for BOS.
    #[inline(always)]
    pub const fn prev_idx(&self) -> Option<u32> {
        if self.prev_idx == INVALID_IDX {
            None
        } else {
            Some(self.prev_idx)
        }
    }

    /// Cumulative cost from BOS.
    #[inline(always)]
    pub const fn cost(&self) -> f64 {
        self.cost
    }
}

/// Beams of the segmentation lattice, one per token boundary.
///
/// All nodes of one search are allocated in a single arena that is
/// released at once by [`Lattice::reset()`].
#[derive(Default)]
pub struct Lattice {
    nodes: Vec<Node>,
    // Arena indices sorted in ascending order of cost.
    beams: Vec<Vec<u32>>,
    beam_width: usize,
    len_token: usize,
}

impl Lattice {
    pub fn reset(&mut self, new_len_token: usize, beam_width: usize) {
        debug_assert_ne!(beam_width, 0);
        self.nodes.clear();
        Self::reset_vec(&mut self.beams, new_len_token + 1, beam_width);
        self.beam_width = beam_width;
        self.len_token = new_len_token;
        self.insert_bos();
    }

    fn reset_vec(data: &mut Vec<Vec<u32>>, new_len: usize, beam_width: usize) {
        for v in data.iter_mut() {
            v.clear();
        }
        let cur_len = data.len();
        if cur_len <= new_len {
            data.reserve(new_len - cur_len);
            for _ in cur_len..new_len {
                data.push(Vec::with_capacity(beam_width + 1));
            }
        }
    }

    fn insert_bos(&mut self) {
        self.nodes.push(Node {
            start_token: 0,
            end_token: 0,
            word_idx: WordIdx::BOS,
            prev_idx: INVALID_IDX,
            rank: 0,
            cost: 0.0,
        });
        self.beams[0].push(0);
    }

    #[inline(always)]
    pub fn node(&self, idx: u32) -> &Node {
        &self.nodes[usize::from_u32(idx)]
    }

    #[inline(always)]
    pub fn beam(&self, pos: usize) -> &[u32] {
        &self.beams[pos]
    }

    /// Checks if at least one node ends at `pos`.
    #[inline(always)]
    pub fn has_previous_node(&self, pos: usize) -> bool {
        self.beams.get(pos).map_or(false, |b| !b.is_empty())
    }

    /// Finds the node ending at `pos` that minimizes its cost plus the
    /// connection cost given by `conn_cost`. Ties go to the cheaper node.
    pub fn search_min_node<F>(&self, pos: usize, mut conn_cost: F) -> Option<(u32, f64)>
    where
        F: FnMut(WordIdx) -> f64,
    {
        let mut best: Option<(u32, f64)> = None;
        for &idx in &self.beams[pos] {
            let left = self.node(idx);
            let new_cost = left.cost + conn_cost(left.word_idx);
            if best.map_or(true, |(_, min_cost)| new_cost < min_cost) {
                best = Some((idx, new_cost));
            }
        }
        best
    }

    /// Inserts a node spanning `start..end` reached from `prev_idx`,
    /// keeping the beam at `end` sorted and within the beam width.
    /// A node worse than every node of a full beam is not allocated.
    pub fn insert_node(
        &mut self,
        start: usize,
        end: usize,
        word_idx: WordIdx,
        prev_idx: u32,
        cost: f64,
    ) {
        debug_assert!(start < end);
        debug_assert!(end <= self.len_token);

        let beam = &self.beams[end];
        let nodes = &self.nodes;
        if beam.len() >= self.beam_width
            && beam
                .last()
                .map_or(false, |&w| nodes[usize::from_u32(w)].cost <= cost)
        {
            return;
        }
        let at = beam.partition_point(|&i| nodes[usize::from_u32(i)].cost <= cost);

        let idx = self.nodes.len() as u32;
        let rank = self.node(prev_idx).rank + 1;
        self.nodes.push(Node {
            start_token: start as u32,
            end_token: end as u32,
            word_idx,
            prev_idx,
            rank,
            cost,
        });
        let beam = &mut self.beams[end];
        beam.insert(at, idx);
        beam.truncate(self.beam_width);
    }

    /// Appends the arena indices of the best path to `path` in forward
    /// order, excluding BOS.
    pub fn append_best_path(&self, path: &mut Vec<u32>) {
        let Some(&last) = self.beams[self.len_token].first() else {
            return;
        };
        let first = path.len();
        path.reserve(usize::from_u32(self.node(last).rank));
        let mut idx = last;
        while let Some(prev_idx) = self.node(idx).prev_idx() {
            path.push(idx);
            idx = prev_idx;
        }
        path[first..].reverse();
    }

    /// Cost of the best complete path, if any.
    pub fn best_cost(&self) -> Option<f64> {
        self.beams[self.len_token]
            .first()
            .map(|&idx| self.node(idx).cost)
    }
}

impl std::fmt::Debug for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Lattice {{ beams: [")?;
        for (i, b) in self.beams[..=self.len_token].iter().enumerate() {
            let nodes: Vec<_> = b.iter().map(|&idx| self.node(idx)).collect();
            writeln!(f, "{} => {:?}", i, nodes)?;
        }
        writeln!(f, "]}}")
    }
}
