// Core algorithm exports
pub mod matcher;
pub mod scoring;

pub use matcher::{MatchEngine, MatchOutcome, RankResult, RankedProfile};
pub use scoring::{
    candidate_score, combine_scores, text_match_score, MatchInput, ScoringWeights,
    TextMatchBreakdown,
};
