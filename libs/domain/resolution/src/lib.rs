
pub mod cascade;
pub mod seed;
pub mod similarity;

pub use cascade::{resolve_entities, CascadeReport, ResolutionOutcome};
pub use seed::ContactSeed;
pub use similarity::{block_key, significant_tokens, token_set_jaccard, FUZZY_MATCH_THRESHOLD};
