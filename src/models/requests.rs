use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::domain::{FormQuestion, SocialLink};

/// Request to create a date-me-doc
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDocRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub header_content: Option<Value>,
    #[validate(custom(function = validate_slug))]
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub preferences: Option<Value>,
    #[serde(default)]
    pub form_questions: Option<Vec<FormQuestion>>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub settings: Option<Value>,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub deal_breakers: Option<Vec<String>>,
    #[serde(default)]
    pub social_links: Option<Value>,
}

impl CreateDocRequest {
    /// Resolved slug: explicit slug, or derived from the title
    /// (lowercased, whitespace runs collapsed to `-`)
    pub fn resolved_slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.is_empty() => slug.clone(),
            _ => slugify(&self.title),
        }
    }
}

/// Derive a URL slug from free text
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.len() < 3 || slug.len() > 100 {
        return Err(ValidationError::new("slug_length"));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(ValidationError::new("slug_charset"));
    }
    Ok(())
}

/// Request to update a date-me-doc (all fields optional)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDocRequest {
    #[validate(length(min = 3, max = 200))]
    #[serde(default)]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub header_content: Option<Value>,
    #[serde(default)]
    pub preferences: Option<Value>,
    #[serde(default)]
    pub form_questions: Option<Vec<FormQuestion>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub settings: Option<Value>,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub deal_breakers: Option<Vec<String>>,
    #[serde(default)]
    pub social_links: Option<Value>,
}

impl UpdateDocRequest {
    /// Build the update payload, skipping unset fields
    pub fn to_patch(&self) -> Value {
        let mut patch = serde_json::Map::new();
        macro_rules! put {
            ($field:ident) => {
                if let Some(v) = &self.$field {
                    patch.insert(
                        stringify!($field).to_string(),
                        serde_json::to_value(v).unwrap_or(Value::Null),
                    );
                }
            };
        }
        put!(title);
        put!(description);
        put!(header_content);
        put!(preferences);
        put!(form_questions);
        put!(is_active);
        put!(is_public);
        put!(settings);
        put!(about_me);
        put!(interests);
        put!(deal_breakers);
        put!(social_links);
        Value::Object(patch)
    }
}

/// Request to submit an application to a date-me-doc
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitApplicationRequest {
    #[validate(email)]
    pub applicant_email: String,
    #[validate(length(min = 2, max = 100))]
    pub applicant_name: String,
    pub answers: Value,
    #[validate(length(min = 1))]
    pub submitted_links: Vec<SocialLink>,
}

/// Request to change an application's status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateApplicationStatusRequest {
    pub status: String,
}

/// Query parameters for listing a doc's applications
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_list_limit() -> usize {
    50
}

/// Query parameters for unauthenticated application status lookup
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub email: Option<String>,
}

/// Request to create a user profile (onboarding)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub auth_user_id: Option<String>,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(min = 2, max = 100))]
    #[serde(default)]
    pub name: Option<String>,
    #[validate(range(min = 18, max = 100))]
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub looking_for: Option<Vec<String>>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub hobbies: Option<Vec<String>>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub lifestyle: Option<Value>,
    #[serde(default)]
    pub preferences: Option<Value>,
}

/// Request to update a user profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    #[serde(default)]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub bio: Option<String>,
    #[validate(range(min = 18, max = 100))]
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub deal_breakers: Option<Vec<String>>,
    #[serde(default)]
    pub lifestyle: Option<Value>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub twitter_handle: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub instagram_handle: Option<String>,
    #[validate(url)]
    #[serde(default)]
    pub personal_website: Option<String>,
    #[validate(url)]
    #[serde(default)]
    pub spotify_profile: Option<String>,
    #[serde(default)]
    pub other_links: Option<Vec<SocialLink>>,
}

impl UpdateProfileRequest {
    /// Build the update payload, skipping unset fields
    pub fn to_patch(&self) -> Value {
        let mut patch = serde_json::Map::new();
        macro_rules! put {
            ($field:ident) => {
                if let Some(v) = &self.$field {
                    patch.insert(
                        stringify!($field).to_string(),
                        serde_json::to_value(v).unwrap_or(Value::Null),
                    );
                }
            };
        }
        put!(name);
        put!(bio);
        put!(age);
        put!(location);
        put!(interests);
        put!(values);
        put!(deal_breakers);
        put!(lifestyle);
        put!(twitter_handle);
        put!(instagram_handle);
        put!(personal_website);
        put!(spotify_profile);
        put!(other_links);
        Value::Object(patch)
    }
}

/// Request for an ad-hoc compatibility analysis between two supplied profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeMatchRequest {
    pub doc_owner_profile: Value,
    #[serde(default)]
    pub doc_preferences: Option<Value>,
    pub applicant_profile: Value,
    #[serde(default)]
    pub application_answers: Option<Value>,
}

/// Request to rank candidate profiles for a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[serde(default)]
    pub include_url_matching: bool,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_match_limit")]
    pub limit: usize,
}

fn default_match_limit() -> usize {
    10
}

/// Request to match an application against the doc owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchApplicationRequest {
    pub application_id: Uuid,
    #[serde(default)]
    pub include_url_matching: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Date Me Please"), "date-me-please");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("already-slugged"), "already-slugged");
    }

    #[test]
    fn test_resolved_slug_prefers_explicit() {
        let req = CreateDocRequest {
            title: "My Great Doc".to_string(),
            description: None,
            header_content: None,
            slug: Some("custom-slug".to_string()),
            preferences: None,
            form_questions: None,
            is_public: None,
            settings: None,
            about_me: None,
            interests: None,
            deal_breakers: None,
            social_links: None,
        };
        assert_eq!(req.resolved_slug(), "custom-slug");

        let req = CreateDocRequest { slug: None, ..req };
        assert_eq!(req.resolved_slug(), "my-great-doc");
    }

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("good-slug-123").is_ok());
        assert!(validate_slug("ab").is_err());
        assert!(validate_slug("Bad Slug").is_err());
        assert!(validate_slug("under_score").is_err());
    }

    #[test]
    fn test_update_patch_skips_unset() {
        let req = UpdateDocRequest {
            title: Some("New title".to_string()),
            description: None,
            header_content: None,
            preferences: None,
            form_questions: None,
            is_active: Some(false),
            is_public: None,
            settings: None,
            about_me: None,
            interests: None,
            deal_breakers: None,
            social_links: None,
        };

        let patch = req.to_patch();
        let obj = patch.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.get("title").unwrap(), "New title");
        assert_eq!(obj.get("is_active").unwrap(), false);
    }

    #[test]
    fn test_submit_request_requires_links() {
        let req = SubmitApplicationRequest {
            applicant_email: "a@example.com".to_string(),
            applicant_name: "Alex".to_string(),
            answers: serde_json::json!({}),
            submitted_links: vec![],
        };
        assert!(req.validate().is_err());
    }
}
