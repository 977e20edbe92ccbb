// Integration tests over the matching core and the wire models

use datemedoc_api::core::{MatchEngine, MatchInput};
use datemedoc_api::models::requests::SubmitApplicationRequest;
use datemedoc_api::models::{DateMeDoc, Recommendation, UserProfile};
use validator::Validate;

fn candidate(name: &str, interests: &[&str], location: &str, age: u8) -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": uuid::Uuid::new_v4(),
        "auth_user_id": format!("auth-{}", name),
        "email": format!("{}@example.com", name),
        "name": name,
        "age": age,
        "location": location,
        "interests": interests,
        "values": ["honesty"],
        "profile_completed": true,
    }))
    .expect("candidate profile should deserialize")
}

#[test]
fn test_end_to_end_candidate_ranking() {
    let engine = MatchEngine::with_default_weights();
    let user = candidate("me", &["hiking", "jazz", "cooking"], "Berlin", 30);

    let pool = vec![
        candidate("ideal", &["hiking", "jazz", "cooking"], "Berlin", 31),
        candidate("good", &["hiking", "jazz"], "Berlin", 33),
        candidate("moderate", &["hiking"], "Hamburg", 35),
        candidate("poor", &["gaming"], "Tokyo", 50),
        candidate("distant", &["chess"], "Oslo", 48),
    ];

    let result = engine.rank_candidates(&user, pool, 3);

    assert_eq!(result.total_candidates, 5);
    assert_eq!(result.ranked.len(), 3);
    assert_eq!(result.ranked[0].profile.name.as_deref(), Some("ideal"));

    // Scores must be monotonically non-increasing
    for pair in result.ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_ranking_respects_deal_breakers() {
    let engine = MatchEngine::with_default_weights();

    let mut user = candidate("me", &["hiking"], "Berlin", 30);
    user.deal_breakers = vec!["smoking".to_string()];

    let mut smoker = candidate("smoker", &["hiking"], "Berlin", 30);
    smoker.bio = Some("Social smoking on weekends".to_string());
    let clean = candidate("clean", &["hiking"], "Berlin", 30);

    let result = engine.rank_candidates(&user, vec![smoker, clean], 2);

    assert_eq!(result.ranked[0].profile.name.as_deref(), Some("clean"));
    assert!(result.ranked[0].score - result.ranked[1].score >= 49.0);
}

#[test]
fn test_match_profiles_with_and_without_url_context() {
    let engine = MatchEngine::with_default_weights();
    let owner = candidate("owner", &["hiking", "jazz"], "Berlin", 30);
    let applicant = candidate("applicant", &["hiking", "jazz"], "Berlin", 31);

    let text_only = engine.match_profiles(
        &MatchInput::from(&owner),
        &MatchInput::from(&applicant),
        None,
    );
    assert_eq!(text_only.overall_score, 100.0);
    assert_eq!(text_only.recommendation, Recommendation::ExcellentMatch);

    // A weak AI signal pulls the combined score down: 100*0.4 + 20*0.6 = 52
    let with_url = engine.match_profiles(
        &MatchInput::from(&owner),
        &MatchInput::from(&applicant),
        Some(20.0),
    );
    assert_eq!(with_url.overall_score, 52.0);
    assert_eq!(with_url.recommendation, Recommendation::ModerateMatch);
}

#[test]
fn test_submit_application_request_wire_format() {
    let json = serde_json::json!({
        "applicant_email": "alex@example.com",
        "applicant_name": "Alex",
        "answers": { "q1": "I love long hikes" },
        "submitted_links": [
            { "type": "website", "url": "https://alex.example.com" },
            { "type": "twitter", "url": "https://twitter.com/alex", "handle": "@alex" }
        ]
    });

    let req: SubmitApplicationRequest = serde_json::from_value(json).unwrap();
    assert!(req.validate().is_ok());
    assert_eq!(req.submitted_links.len(), 2);
}

#[test]
fn test_submit_application_request_rejects_bad_email() {
    let json = serde_json::json!({
        "applicant_email": "not-an-email",
        "applicant_name": "Alex",
        "answers": {},
        "submitted_links": [
            { "type": "website", "url": "https://alex.example.com" }
        ]
    });

    let req: SubmitApplicationRequest = serde_json::from_value(json).unwrap();
    assert!(req.validate().is_err());
}

#[test]
fn test_doc_row_wire_format() {
    // A representative hosted-DB row, including fields this service
    // never touches directly
    let json = serde_json::json!({
        "id": "6a4f2f5e-9a0f-4d9c-8b77-0e9a3a8f1b21",
        "user_id": "9c0de3bb-31a2-4a56-a2a4-0f3cf44f7f01",
        "slug": "hike-with-me",
        "title": "Hike with me",
        "description": "Looking for a hiking partner",
        "about_me": "I spend weekends in the mountains",
        "interests": ["hiking", "photography"],
        "deal_breakers": ["smoking"],
        "form_questions": [
            {
                "id": "q1",
                "question": "What is your favorite trail?",
                "type": "textarea",
                "required": true,
                "order": 0
            }
        ],
        "preferences": { "age_range": { "min": 25, "max": 40 } },
        "is_active": true,
        "is_public": true,
        "view_count": 41,
        "application_count": 3,
        "created_at": "2025-05-01T10:00:00Z"
    });

    let doc: DateMeDoc = serde_json::from_value(json).unwrap();
    assert_eq!(doc.slug, "hike-with-me");
    assert_eq!(doc.form_questions.len(), 1);
    assert!(doc.form_questions[0].required);
    assert_eq!(doc.view_count, 41);
}

#[test]
fn test_match_outcome_serialization_keys() {
    let engine = MatchEngine::with_default_weights();
    let a = MatchInput {
        interests: vec!["hiking".to_string()],
        values: vec![],
        location: None,
        age: None,
    };

    let outcome = engine.match_profiles(&a, &a.clone(), Some(75.0));
    let json = serde_json::to_value(&outcome).unwrap();

    assert!(json.get("text_match_score").is_some());
    assert!(json.get("url_context_score").is_some());
    assert!(json.get("overall_score").is_some());
    assert!(json.get("breakdown").is_some());
    assert!(json.get("recommendation").is_some());
}
