//! DateMeDoc API - backend for the DateMeDoc dating platform
//!
//! Users publish date-me-docs (public questionnaire pages), applicants
//! submit answers and social links, and a hosted AI provider scores
//! compatibility. Entity state lives in a hosted Postgres row API; this
//! service is the HTTP surface, the shared scoring heuristic, and the
//! analysis pipeline in between.

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{MatchEngine, MatchInput, ScoringWeights};
pub use crate::models::{Application, DateMeDoc, MatchmakingScore, Recommendation, UserProfile};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let engine = MatchEngine::with_default_weights();
        let input = MatchInput::default();
        let outcome = engine.match_profiles(&input, &input.clone(), None);
        assert_eq!(outcome.recommendation, Recommendation::LowMatch);
    }
}
