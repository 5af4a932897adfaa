pub mod config;
pub mod index;
pub mod matcher;
pub mod similarity;

pub use config::MatcherConfig;
pub use index::NameIndex;
pub use matcher::{rank_candidates, FuzzyCandidate, MatchMethod, MatchStrategy, Matcher, Resolution, STRATEGY_ORDER};
pub use similarity::{similarity, similarity_with_floor};
