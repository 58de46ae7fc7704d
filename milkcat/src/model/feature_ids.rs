use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};
use hashbrown::HashMap;

/// Mapping from feature strings to ids.
///
/// A generated feature string missing from the map is an expected miss:
/// the feature simply carries no weight.
#[derive(Default, Clone, Debug)]
pub struct FeatureIds {
    map: HashMap<String, u32>,
}

impl FeatureIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `feature` with `id`. Returns `false` if it already exists.
    pub fn insert(&mut self, feature: String, id: u32) -> bool {
        match self.map.entry(feature) {
            hashbrown::hash_map::Entry::Occupied(_) => false,
            hashbrown::hash_map::Entry::Vacant(e) => {
                e.insert(id);
                true
            }
        }
    }

    #[inline(always)]
    pub fn get(&self, feature: &str) -> Option<u32> {
        self.map.get(feature).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

impl Encode for FeatureIds {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        let mut entries: Vec<_> = self.map.iter().map(|(k, &v)| (k.clone(), v)).collect();
        entries.sort_unstable_by_key(|&(_, v)| v);
        Encode::encode(&entries, encoder)?;
        Ok(())
    }
}

impl Decode for FeatureIds {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        let entries: Vec<(String, u32)> = Decode::decode(decoder)?;
        Ok(Self {
            map: entries.into_iter().collect(),
        })
    }
}

bincode::impl_borrow_decode!(FeatureIds);
