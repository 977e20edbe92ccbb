use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// User profile row from the hosted database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub auth_user_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub looking_for: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub deal_breakers: Vec<String>,
    #[serde(default)]
    pub lifestyle: Value,
    #[serde(default)]
    pub preferences: Value,
    #[serde(default)]
    pub preferred_age_range: Option<AgeRange>,
    #[serde(default)]
    pub twitter_handle: Option<String>,
    #[serde(default)]
    pub instagram_handle: Option<String>,
    #[serde(default)]
    pub personal_website: Option<String>,
    #[serde(default)]
    pub spotify_profile: Option<String>,
    #[serde(default)]
    pub other_links: Vec<SocialLink>,
    #[serde(default)]
    pub digital_footprint_score: Option<i32>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub last_analysis_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Preferred age range on a profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

/// A link to an external presence (profile sidebar, application submission)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub url: String,
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Twitter,
    Instagram,
    Website,
    Blog,
    Linkedin,
    Spotify,
    Other,
}

impl LinkKind {
    /// Sources that require credentials and cannot be scraped anonymously
    pub fn requires_credentials(&self) -> bool {
        matches!(self, LinkKind::Twitter | LinkKind::Instagram | LinkKind::Linkedin)
    }
}

/// A question on a date-me-doc form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Textarea,
    Url,
    Video,
    Email,
    Select,
}

/// Date-me-doc row: a user-authored public questionnaire page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateMeDoc {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub header_content: Value,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub deal_breakers: Vec<String>,
    #[serde(default)]
    pub form_questions: Vec<FormQuestion>,
    #[serde(default)]
    pub preferences: Value,
    #[serde(default)]
    pub social_links: Value,
    #[serde(default)]
    pub settings: Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub application_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Application lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Matched,
}

impl ApplicationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "reviewed" => Some(Self::Reviewed),
            "shortlisted" => Some(Self::Shortlisted),
            "rejected" => Some(Self::Rejected),
            "matched" => Some(Self::Matched),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Shortlisted => "shortlisted",
            Self::Rejected => "rejected",
            Self::Matched => "matched",
        }
    }
}

/// Application row: a respondent's submission against a date-me-doc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub date_me_doc_id: Uuid,
    #[serde(default)]
    pub applicant_user_id: Option<Uuid>,
    pub applicant_name: String,
    pub applicant_email: String,
    #[serde(default)]
    pub answers: Value,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    #[serde(default = "default_status")]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub compatibility_data: Option<Value>,
    #[serde(default)]
    pub analysis_completed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_status() -> ApplicationStatus {
    ApplicationStatus::Pending
}

/// Content-analysis row: extraction + AI analysis of one source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub id: Uuid,
    #[serde(default)]
    pub application_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub source_type: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub extracted_content: Option<String>,
    #[serde(default)]
    pub content_metadata: Value,
    #[serde(default)]
    pub psychological_profile: Value,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub communication_style: Value,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Matchmaking-score row: stored compatibility result for an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingScore {
    pub id: Uuid,
    pub application_id: Uuid,
    pub doc_owner_id: Uuid,
    #[serde(default)]
    pub applicant_id: Option<Uuid>,
    #[serde(default)]
    pub text_match_score: Option<f64>,
    #[serde(default)]
    pub url_context_score: Option<f64>,
    pub overall_score: f64,
    #[serde(default)]
    pub compatibility_breakdown: Value,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Match quality bucket derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ExcellentMatch,
    GoodMatch,
    ModerateMatch,
    LowMatch,
}

impl Recommendation {
    /// Bucket an overall score (0-100)
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::ExcellentMatch
        } else if score >= 60.0 {
            Self::GoodMatch
        } else if score >= 40.0 {
            Self::ModerateMatch
        } else {
            Self::LowMatch
        }
    }
}

/// Psychological profile returned by the AI analyzer.
///
/// The provider returns a large JSON document; the fields the matching code
/// reads are typed, everything else rides along in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PsychProfile {
    #[serde(default)]
    pub personality_traits: Value,
    #[serde(default)]
    pub communication_style: Value,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub green_flags: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub overall_summary: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Compatibility report returned by the AI analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatibilityReport {
    #[serde(default)]
    pub overall_compatibility_score: f64,
    #[serde(default)]
    pub confidence_level: f64,
    #[serde(default)]
    pub compatibility_breakdown: Value,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub green_flags: Value,
    #[serde(default)]
    pub red_flags: Value,
    #[serde(default)]
    pub date_ideas: Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Application-vs-preferences report returned by the AI analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationMatchReport {
    #[serde(default)]
    pub preference_match_score: f64,
    #[serde(default)]
    pub answer_quality_score: f64,
    #[serde(default)]
    pub authenticity_score: f64,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_status_roundtrip() {
        for s in ["pending", "reviewed", "shortlisted", "rejected", "matched"] {
            let parsed = ApplicationStatus::parse(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!(ApplicationStatus::parse("archived").is_none());
    }

    #[test]
    fn test_recommendation_buckets() {
        assert_eq!(Recommendation::from_score(92.0), Recommendation::ExcellentMatch);
        assert_eq!(Recommendation::from_score(80.0), Recommendation::ExcellentMatch);
        assert_eq!(Recommendation::from_score(65.0), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(40.0), Recommendation::ModerateMatch);
        assert_eq!(Recommendation::from_score(12.0), Recommendation::LowMatch);
    }

    #[test]
    fn test_link_kind_credentials() {
        assert!(LinkKind::Twitter.requires_credentials());
        assert!(LinkKind::Linkedin.requires_credentials());
        assert!(!LinkKind::Website.requires_credentials());
        assert!(!LinkKind::Blog.requires_credentials());
    }

    #[test]
    fn test_doc_deserializes_with_sparse_row() {
        let json = serde_json::json!({
            "id": "6a4f2f5e-9a0f-4d9c-8b77-0e9a3a8f1b21",
            "user_id": "9c0de3bb-31a2-4a56-a2a4-0f3cf44f7f01",
            "slug": "hike-with-me",
            "title": "Hike with me"
        });

        let doc: DateMeDoc = serde_json::from_value(json).unwrap();
        assert!(doc.is_active);
        assert!(doc.is_public);
        assert_eq!(doc.view_count, 0);
        assert!(doc.form_questions.is_empty());
    }

    #[test]
    fn test_psych_profile_keeps_unknown_fields() {
        let json = serde_json::json!({
            "interests": ["climbing"],
            "values": ["honesty"],
            "thinking_style": "analytical"
        });

        let profile: PsychProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.interests, vec!["climbing"]);
        assert_eq!(profile.extra.get("thinking_style").unwrap(), "analytical");
    }
}
