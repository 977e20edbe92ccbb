use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::scoring::{
    candidate_score, combine_scores, text_match_score, MatchInput, ScoringWeights,
    TextMatchBreakdown,
};
use crate::models::{Recommendation, UserProfile};

/// Outcome of matching two people
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub text_match_score: f64,
    pub url_context_score: Option<f64>,
    pub overall_score: f64,
    pub breakdown: Value,
    pub recommendation: Recommendation,
}

/// One candidate with its rank-adjusted score
#[derive(Debug, Clone)]
pub struct RankedProfile {
    pub profile: UserProfile,
    pub score: f64,
    pub breakdown: TextMatchBreakdown,
}

/// Result of ranking a candidate pool
#[derive(Debug)]
pub struct RankResult {
    pub ranked: Vec<RankedProfile>,
    pub total_candidates: usize,
}

/// Match engine - the single home of the compatibility heuristic
///
/// Every caller (application pipeline, candidate ranking, ad-hoc analysis)
/// goes through this engine so the weights and combination rules cannot
/// drift between call sites.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    weights: ScoringWeights,
}

impl MatchEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    /// Match two people: text heuristic plus an optional AI URL-context
    /// score supplied by the caller
    ///
    /// With a URL-context score the overall result is text*0.4 + url*0.6,
    /// otherwise the text score stands alone.
    pub fn match_profiles(
        &self,
        owner: &MatchInput,
        applicant: &MatchInput,
        url_context_score: Option<f64>,
    ) -> MatchOutcome {
        let (text_score, text_breakdown) = text_match_score(owner, applicant, &self.weights);

        let overall_score = combine_scores(text_score, url_context_score);
        let recommendation = Recommendation::from_score(overall_score);

        let mut breakdown = serde_json::Map::new();
        breakdown.insert(
            "text_based".to_string(),
            serde_json::json!({
                "score": text_score,
                "method": "interest, values, location, and age matching",
                "factors": text_breakdown,
            }),
        );
        if let Some(url_score) = url_context_score {
            breakdown.insert(
                "url_based".to_string(),
                serde_json::json!({ "score": url_score }),
            );
        }

        MatchOutcome {
            text_match_score: text_score,
            url_context_score,
            overall_score,
            breakdown: Value::Object(breakdown),
            recommendation,
        }
    }

    /// Rank a candidate pool for a user and keep the top `limit`
    pub fn rank_candidates(
        &self,
        user: &UserProfile,
        candidates: Vec<UserProfile>,
        limit: usize,
    ) -> RankResult {
        let total_candidates = candidates.len();

        let mut ranked: Vec<RankedProfile> = candidates
            .into_iter()
            .filter(|candidate| candidate.id != user.id)
            .map(|candidate| {
                let (score, breakdown) = candidate_score(user, &candidate, &self.weights);
                RankedProfile {
                    profile: candidate,
                    score,
                    breakdown,
                }
            })
            .collect();

        // Sort by score descending; stable sort keeps query order for ties
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ranked.truncate(limit);

        RankResult {
            ranked,
            total_candidates,
        }
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use uuid::Uuid;

    fn candidate(name: &str, interests: &[&str], location: Option<&str>, age: Option<u8>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            auth_user_id: format!("auth-{}", name),
            email: format!("{}@example.com", name),
            name: Some(name.to_string()),
            age,
            location: location.map(|s| s.to_string()),
            gender: None,
            bio: None,
            avatar_url: None,
            looking_for: vec![],
            interests: interests.iter().map(|s| s.to_string()).collect(),
            hobbies: vec![],
            values: vec!["honesty".to_string()],
            deal_breakers: vec![],
            lifestyle: Value::Null,
            preferences: Value::Null,
            preferred_age_range: None,
            twitter_handle: None,
            instagram_handle: None,
            personal_website: None,
            spotify_profile: None,
            other_links: vec![],
            digital_footprint_score: None,
            profile_completed: true,
            last_analysis_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_match_profiles_text_only() {
        let engine = MatchEngine::with_default_weights();
        let a = MatchInput {
            interests: vec!["hiking".to_string()],
            values: vec!["honesty".to_string()],
            location: Some("Berlin".to_string()),
            age: Some(30),
        };

        let outcome = engine.match_profiles(&a, &a.clone(), None);

        assert_eq!(outcome.overall_score, 100.0);
        assert_eq!(outcome.url_context_score, None);
        assert_eq!(outcome.recommendation, Recommendation::ExcellentMatch);
        assert!(outcome.breakdown.get("url_based").is_none());
    }

    #[test]
    fn test_match_profiles_with_url_context() {
        let engine = MatchEngine::with_default_weights();
        let a = MatchInput {
            interests: vec!["hiking".to_string()],
            values: vec![],
            location: None,
            age: None,
        };
        let b = MatchInput {
            interests: vec!["hiking".to_string()],
            values: vec![],
            location: None,
            age: None,
        };

        let outcome = engine.match_profiles(&a, &b, Some(90.0));

        // text = 40 (interests only), overall = 40*0.4 + 90*0.6 = 70
        assert_eq!(outcome.text_match_score, 40.0);
        assert_eq!(outcome.overall_score, 70.0);
        assert_eq!(outcome.recommendation, Recommendation::GoodMatch);
        assert!(outcome.breakdown.get("url_based").is_some());
    }

    #[test]
    fn test_rank_candidates_sorted_and_limited() {
        let engine = MatchEngine::with_default_weights();
        let user = candidate("me", &["hiking", "jazz"], Some("Berlin"), Some(30));

        let pool = vec![
            candidate("far", &["gaming"], Some("Tokyo"), Some(50)),
            candidate("close", &["hiking", "jazz"], Some("Berlin"), Some(31)),
            candidate("mid", &["hiking"], Some("Berlin"), Some(33)),
        ];

        let result = engine.rank_candidates(&user, pool, 2);

        assert_eq!(result.total_candidates, 3);
        assert_eq!(result.ranked.len(), 2);
        assert_eq!(result.ranked[0].profile.name.as_deref(), Some("close"));
        assert!(result.ranked[0].score >= result.ranked[1].score);
    }

    #[test]
    fn test_rank_excludes_self() {
        let engine = MatchEngine::with_default_weights();
        let user = candidate("me", &["hiking"], None, None);
        let pool = vec![user.clone()];

        let result = engine.rank_candidates(&user, pool, 10);
        assert!(result.ranked.is_empty());
    }
}
