use serde::{Deserialize, Serialize};

use crate::config::WeightsConfig;
use crate::models::{PsychProfile, UserProfile};

/// Scoring weights for the text-based heuristic
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub interests: f64,
    pub values: f64,
    pub location: f64,
    pub age: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            interests: 40.0,
            values: 30.0,
            location: 20.0,
            age: 10.0,
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            interests: config.interests,
            values: config.values,
            location: config.location,
            age: config.age,
        }
    }
}

/// The fields the heuristic reads, lifted out of whichever record holds them
/// (a stored profile row or an AI-derived profile)
#[derive(Debug, Clone, Default)]
pub struct MatchInput {
    pub interests: Vec<String>,
    pub values: Vec<String>,
    pub location: Option<String>,
    pub age: Option<u8>,
}

impl From<&UserProfile> for MatchInput {
    fn from(profile: &UserProfile) -> Self {
        Self {
            interests: profile.interests.clone(),
            values: profile.values.clone(),
            location: profile.location.clone(),
            age: profile.age,
        }
    }
}

impl From<&PsychProfile> for MatchInput {
    fn from(profile: &PsychProfile) -> Self {
        Self {
            interests: profile.interests.clone(),
            values: profile.values.clone(),
            location: None,
            age: None,
        }
    }
}

/// Per-factor breakdown of a text match score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextMatchBreakdown {
    pub interest_score: f64,
    pub value_score: f64,
    pub location_score: f64,
    pub age_score: f64,
    pub common_interests: Vec<String>,
    pub common_values: Vec<String>,
}

/// Calculate the text-based match score (0-100) between two people
///
/// Scoring formula (default weights):
///     interest overlap   40    common / max(|a|, |b|, 1)
///     shared values      30    common / max(|a|, |b|, 1)
///     location           20    exact match full, containment half
///     age proximity      10    |delta| <= 5 full, <= 10 half
///
/// The total is normalized against the weight sum and rounded.
pub fn text_match_score(
    a: &MatchInput,
    b: &MatchInput,
    weights: &ScoringWeights,
) -> (f64, TextMatchBreakdown) {
    let (interest_score, common_interests) =
        overlap_score(&a.interests, &b.interests, weights.interests);
    let (value_score, common_values) = overlap_score(&a.values, &b.values, weights.values);
    let location_score = location_score(
        a.location.as_deref(),
        b.location.as_deref(),
        weights.location,
    );
    let age_score = age_score(a.age, b.age, weights.age);

    let total = interest_score + value_score + location_score + age_score;
    let max = weights.interests + weights.values + weights.location + weights.age;

    let score = if max > 0.0 {
        (total / max * 100.0).round()
    } else {
        0.0
    };

    (
        score,
        TextMatchBreakdown {
            interest_score,
            value_score,
            location_score,
            age_score,
            common_interests,
            common_values,
        },
    )
}

/// Overlap ratio scaled by weight, with the common items
#[inline]
fn overlap_score(a: &[String], b: &[String], weight: f64) -> (f64, Vec<String>) {
    let common: Vec<String> = a
        .iter()
        .filter(|item| b.iter().any(|other| other.eq_ignore_ascii_case(item)))
        .cloned()
        .collect();

    let denominator = a.len().max(b.len()).max(1) as f64;
    ((common.len() as f64 / denominator) * weight, common)
}

/// Location score: exact match (case-insensitive) scores the full weight,
/// containment either way scores half
#[inline]
fn location_score(a: Option<&str>, b: Option<&str>, weight: f64) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let a = a.to_lowercase();
            let b = b.to_lowercase();
            if a == b {
                weight
            } else if a.contains(&b) || b.contains(&a) {
                weight / 2.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Age score: within 5 years scores the full weight, within 10 scores half
#[inline]
fn age_score(a: Option<u8>, b: Option<u8>, weight: f64) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let diff = (a as i16 - b as i16).abs();
            if diff <= 5 {
                weight
            } else if diff <= 10 {
                weight / 2.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Bonus points applied on top of the text score when ranking candidates
const LIFESTYLE_BONUS: f64 = 15.0;
const AGE_RANGE_BONUS: f64 = 10.0;
const BIO_QUALITY_BONUS: f64 = 5.0;
const DEAL_BREAKER_PENALTY: f64 = 50.0;
const BIO_QUALITY_MIN_LEN: usize = 150;

/// Rank-adjusted score for a candidate against a user's full profile
///
/// Starts from the shared text heuristic, then applies ranking adjustments:
/// lifestyle match bonus, preferred-age-range bonus, bio-completeness bonus,
/// and a heavy penalty when a deal-breaker term appears in the candidate's
/// bio. Clamped to 0-100.
pub fn candidate_score(
    user: &UserProfile,
    candidate: &UserProfile,
    weights: &ScoringWeights,
) -> (f64, TextMatchBreakdown) {
    let (base, breakdown) =
        text_match_score(&MatchInput::from(user), &MatchInput::from(candidate), weights);

    let mut score = base;

    if !user.lifestyle.is_null() && user.lifestyle == candidate.lifestyle {
        score += LIFESTYLE_BONUS;
    }

    if let (Some(range), Some(age)) = (user.preferred_age_range, candidate.age) {
        if age >= range.min && age <= range.max {
            score += AGE_RANGE_BONUS;
        }
    }

    if candidate
        .bio
        .as_deref()
        .map(|bio| bio.len() > BIO_QUALITY_MIN_LEN)
        .unwrap_or(false)
    {
        score += BIO_QUALITY_BONUS;
    }

    if has_deal_breaker(user, candidate) {
        score -= DEAL_BREAKER_PENALTY;
    }

    (score.clamp(0.0, 100.0), breakdown)
}

/// True when any of the user's deal-breaker terms appears in the
/// candidate's bio
#[inline]
fn has_deal_breaker(user: &UserProfile, candidate: &UserProfile) -> bool {
    let Some(bio) = candidate.bio.as_deref() else {
        return false;
    };
    let bio = bio.to_lowercase();

    user.deal_breakers
        .iter()
        .any(|term| !term.is_empty() && bio.contains(&term.to_lowercase()))
}

/// Weight of the text score when URL-context matching is included
const TEXT_WEIGHT_WITH_URL: f64 = 0.4;
/// Weight of the URL-context score when included
const URL_WEIGHT: f64 = 0.6;

/// Combine the text score with an optional URL-context score into the
/// overall 0-100 score
pub fn combine_scores(text_score: f64, url_context_score: Option<f64>) -> f64 {
    match url_context_score {
        Some(url_score) => (text_score * TEXT_WEIGHT_WITH_URL + url_score * URL_WEIGHT).round(),
        None => text_score.round(),
    }
}
