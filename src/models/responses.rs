use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::domain::{Application, ApplicationStatus, DateMeDoc, Recommendation, UserProfile};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Response wrapping a single doc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocResponse {
    pub message: String,
    pub doc: DateMeDoc,
}

/// Response for the public doc-by-slug view (owner id stripped)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicDocResponse {
    pub doc: Value,
}

/// Response listing a user's docs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocListResponse {
    pub docs: Vec<DateMeDoc>,
}

/// Application joined with its stored score, for owner-facing listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationWithScore {
    #[serde(flatten)]
    pub application: Application,
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub compatibility_breakdown: Option<Value>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
}

/// Response listing applications for a doc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationWithScore>,
    pub total: usize,
}

/// Receipt returned to an applicant after submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationReceipt {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Response to a successful application submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApplicationResponse {
    pub message: String,
    pub application: ApplicationReceipt,
}

/// Response wrapping a user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
}

/// Response for the digital footprint analysis endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintAnalysisResponse {
    pub message: String,
    pub analysis: Value,
    pub metadata: Value,
    pub footprint_score: i32,
}

/// One ranked candidate in a match listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub profile: CandidateSummary,
    pub match_score: f64,
    pub breakdown: Value,
    pub recommendation: Recommendation,
}

/// Public-safe subset of a candidate profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub age: Option<u8>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub avatar_url: Option<String>,
}

impl From<&UserProfile> for CandidateSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            age: profile.age,
            location: profile.location.clone(),
            bio: profile.bio.clone(),
            interests: profile.interests.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// Response listing ranked candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub matches: Vec<RankedCandidate>,
    pub total_checked: usize,
    pub matching_criteria: String,
}

/// Response for matching one application against the doc owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchApplicationResponse {
    pub match_result: Value,
    pub match_score_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let resp = ErrorResponse {
            error: "not_found".to_string(),
            message: "Date-me-doc not found".to_string(),
            status_code: 404,
        };

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["status_code"], 404);
    }

    #[test]
    fn test_application_with_score_flattens() {
        let json = serde_json::json!({
            "id": "6a4f2f5e-9a0f-4d9c-8b77-0e9a3a8f1b21",
            "date_me_doc_id": "9c0de3bb-31a2-4a56-a2a4-0f3cf44f7f01",
            "applicant_name": "Alex",
            "applicant_email": "alex@example.com",
            "overall_score": 74.5,
            "recommendation": "good_match"
        });

        let with_score: ApplicationWithScore = serde_json::from_value(json).unwrap();
        assert_eq!(with_score.application.applicant_name, "Alex");
        assert_eq!(with_score.overall_score, Some(74.5));
        assert_eq!(with_score.recommendation, Some(Recommendation::GoodMatch));
    }
}
