//! Common settings in MilkCat.
use bincode::config::{self, Fixint, LittleEndian};

/// The default maximum number of tokens in a sentence.
///
/// Decoders size their fixed-capacity buffers with this value unless
/// another bound is given at construction.
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// The default beam width of bigram decoding.
pub const DEFAULT_BEAM_WIDTH: usize = 3;

/// Cost of a single-token out-of-vocabulary term.
pub const OOV_COST: f32 = 20.0;

/// Cost of a user-lexicon word whose row omits the cost column.
pub const USER_DEFAULT_COST: f32 = 10.0;

/// Magic header of a serialized model bundle.
pub const MODEL_MAGIC: &[u8] = b"MilkCatModel 0.1\n";

pub(crate) fn bincode_config() -> config::Configuration<LittleEndian, Fixint> {
    config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}
