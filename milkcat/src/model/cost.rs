use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};
use hashbrown::HashMap;

use crate::utils::FromU32;

/// Dense table of unigram costs indexed by word id.
///
/// Costs are negative log-probabilities: smaller means more likely.
#[derive(Default, Clone, Debug, Decode, Encode)]
pub struct UnigramCost {
    costs: Vec<f32>,
}

impl UnigramCost {
    /// Creates a table from costs in word-id order.
    pub fn new<I>(costs: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        Self {
            costs: costs.into_iter().collect(),
        }
    }

    /// Gets the cost of `word_id`.
    #[inline(always)]
    pub fn cost(&self, word_id: u32) -> f32 {
        self.costs[usize::from_u32(word_id)]
    }

    /// Gets the number of words.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.costs.len()
    }
}

/// Sparse table of bigram costs between system word ids.
#[derive(Default, Clone, Debug)]
pub struct BigramCost {
    map: HashMap<u64, f32>,
}

#[inline(always)]
const fn bigram_key(left_id: u32, right_id: u32) -> u64 {
    ((left_id as u64) << 32) | right_id as u64
}

impl BigramCost {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cost of `(left_id, right_id)`, overwriting an earlier entry.
    pub fn insert(&mut self, left_id: u32, right_id: u32, cost: f32) {
        self.map.insert(bigram_key(left_id, right_id), cost);
    }

    /// Gets the cost of `(left_id, right_id)`, or `None` if the pair is absent.
    #[inline(always)]
    pub fn cost(&self, left_id: u32, right_id: u32) -> Option<f32> {
        self.map.get(&bigram_key(left_id, right_id)).copied()
    }

    /// Gets the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Checks if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn sorted_entries(&self) -> Vec<(u32, u32, f32)> {
        let mut entries: Vec<_> = self
            .map
            .iter()
            .map(|(&k, &cost)| ((k >> 32) as u32, k as u32, cost))
            .collect();
        entries.sort_unstable_by_key(|&(l, r, _)| (l, r));
        entries
    }
}

impl Encode for BigramCost {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        // Sorted so that equal tables serialize to equal bytes.
        Encode::encode(&self.sorted_entries(), encoder)?;
        Ok(())
    }
}

impl Decode for BigramCost {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        let entries: Vec<(u32, u32, f32)> = Decode::decode(decoder)?;
        let mut table = Self::new();
        for (l, r, cost) in entries {
            table.insert(l, r, cost);
        }
        Ok(table)
    }
}

bincode::impl_borrow_decode!(BigramCost);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bigram_cost() {
        let mut table = BigramCost::new();
        table.insert(1, 2, 0.5);
        table.insert(2, 1, 1.5);
        table.insert(u32::MAX - 1, 0, 2.5);
        assert_eq!(table.cost(1, 2), Some(0.5));
        assert_eq!(table.cost(2, 1), Some(1.5));
        assert_eq!(table.cost(u32::MAX - 1, 0), Some(2.5));
        assert_eq!(table.cost(1, 1), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_bigram_cost_serialization() {
        let mut table = BigramCost::new();
        table.insert(3, 4, 0.25);
        table.insert(0, 9, 7.0);
        let config = crate::common::bincode_config();
        let bytes = bincode::encode_to_vec(&table, config).unwrap();
        let (decoded, _): (BigramCost, usize) = bincode::decode_from_slice(&bytes, config).unwrap();
        assert_eq!(decoded.cost(3, 4), Some(0.25));
        assert_eq!(decoded.cost(0, 9), Some(7.0));
        assert_eq!(decoded.len(), 2);

        let (borrowed, _): (BigramCost, usize) =
            bincode::borrow_decode_from_slice(&bytes, config).unwrap();
        assert_eq!(borrowed.cost(3, 4), Some(0.25));
    }
}
