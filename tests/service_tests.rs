// Mock-server tests for the hosted-DB, analyzer, and extractor clients

use datemedoc_api::config::{ExtractionSettings, OpenAiSettings, SupabaseSettings, TableSettings};
use datemedoc_api::services::{AnalyzerClient, AnalyzerError, ContentExtractor, SupabaseClient};
use mockito::Matcher;

fn tables() -> TableSettings {
    TableSettings {
        user_profiles: "user_profiles".to_string(),
        date_me_docs: "date_me_docs".to_string(),
        applications: "applications".to_string(),
        content_analysis: "content_analysis".to_string(),
        matchmaking_scores: "matchmaking_scores".to_string(),
    }
}

fn supabase_client(endpoint: String) -> SupabaseClient {
    SupabaseClient::new(
        SupabaseSettings {
            endpoint,
            service_key: "service-key".to_string(),
            anon_key: String::new(),
        },
        tables(),
    )
}

fn analyzer_client(endpoint: String) -> AnalyzerClient {
    AnalyzerClient::new(OpenAiSettings {
        endpoint,
        api_key: "sk-test".to_string(),
        model: "gpt-4-turbo-preview".to_string(),
        timeout_secs: 5,
    })
}

#[tokio::test]
async fn test_get_doc_by_slug_parses_row() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/rest/v1/date_me_docs")
        .match_query(Matcher::UrlEncoded("slug".into(), "eq.hike-with-me".into()))
        .match_header("apikey", "service-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{
                "id": "6a4f2f5e-9a0f-4d9c-8b77-0e9a3a8f1b21",
                "user_id": "9c0de3bb-31a2-4a56-a2a4-0f3cf44f7f01",
                "slug": "hike-with-me",
                "title": "Hike with me",
                "is_active": true,
                "view_count": 7
            }]"#,
        )
        .create_async()
        .await;

    let client = supabase_client(server.url());
    let doc = client.get_doc_by_slug("hike-with-me").await.unwrap();

    mock.assert_async().await;
    let doc = doc.expect("doc should be found");
    assert_eq!(doc.slug, "hike-with-me");
    assert_eq!(doc.view_count, 7);
}

#[tokio::test]
async fn test_get_doc_by_slug_empty_result() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/rest/v1/date_me_docs")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = supabase_client(server.url());
    let doc = client.get_doc_by_slug("missing").await.unwrap();

    assert!(doc.is_none());
}

#[tokio::test]
async fn test_insert_application_returns_representation() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/rest/v1/applications")
        .match_header("prefer", "return=representation")
        .with_status(201)
        .with_body(
            r#"[{
                "id": "2f1f7a1e-0000-4d9c-8b77-0e9a3a8f1b21",
                "date_me_doc_id": "6a4f2f5e-9a0f-4d9c-8b77-0e9a3a8f1b21",
                "applicant_name": "Alex",
                "applicant_email": "alex@example.com",
                "status": "pending"
            }]"#,
        )
        .create_async()
        .await;

    let client = supabase_client(server.url());
    let application = client
        .insert_application(&serde_json::json!({
            "date_me_doc_id": "6a4f2f5e-9a0f-4d9c-8b77-0e9a3a8f1b21",
            "applicant_name": "Alex",
            "applicant_email": "alex@example.com",
            "status": "pending",
        }))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(application.applicant_name, "Alex");
    assert_eq!(
        application.status,
        datemedoc_api::models::ApplicationStatus::Pending
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_typed_error() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/rest/v1/user_profiles")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"JWT invalid"}"#)
        .create_async()
        .await;

    let client = supabase_client(server.url());
    let result = client.get_profile_by_auth_id("someone").await;

    assert!(matches!(
        result,
        Err(datemedoc_api::services::SupabaseError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_analyze_profile_parses_response() {
    let mut server = mockito::Server::new_async().await;

    let content = serde_json::json!({
        "interests": ["climbing", "poetry"],
        "values": ["curiosity"],
        "green_flags": ["writes thoughtfully"],
        "overall_summary": "A reflective outdoors enthusiast.",
        "thinking_style": "creative"
    })
    .to_string();

    let body = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 900, "completion_tokens": 300, "total_tokens": 1200 }
    });

    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = analyzer_client(server.url());
    let analysis = client
        .analyze_profile("I climb mountains and write poems.", &serde_json::json!({}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(analysis.result.interests, vec!["climbing", "poetry"]);
    assert_eq!(analysis.tokens_used, 1200);
    assert_eq!(
        analysis.result.extra.get("thinking_style").unwrap(),
        "creative"
    );
}

#[tokio::test]
async fn test_analyzer_rate_limit_maps_to_typed_error() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"rate limited"}}"#)
        .create_async()
        .await;

    let client = analyzer_client(server.url());
    let result = client
        .analyze_profile("text", &serde_json::json!({}))
        .await;

    assert!(matches!(result, Err(AnalyzerError::RateLimited)));
}

#[tokio::test]
async fn test_calculate_compatibility_parses_score() {
    let mut server = mockito::Server::new_async().await;

    let content = serde_json::json!({
        "overall_compatibility_score": 82,
        "confidence_level": 0.9,
        "recommendation": "strong_match",
        "compatibility_breakdown": {
            "interests_overlap": 88,
            "values_alignment": 75
        }
    })
    .to_string();

    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "choices": [{ "message": { "content": content } }],
                "usage": { "total_tokens": 800 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = analyzer_client(server.url());
    let analysis = client
        .calculate_compatibility(
            &serde_json::json!({ "interests": ["hiking"] }),
            &serde_json::json!({ "interests": ["hiking"] }),
            &serde_json::json!({}),
        )
        .await
        .unwrap();

    assert_eq!(analysis.result.overall_compatibility_score, 82.0);
    assert_eq!(analysis.result.recommendation.as_deref(), Some("strong_match"));
}

#[tokio::test]
async fn test_extractor_strips_markup_and_captures_title() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(
            r#"<html>
                <head>
                    <title>Alex's Blog</title>
                    <meta name="description" content="Notes on climbing">
                    <script>var tracking = true;</script>
                </head>
                <body>
                    <nav>Home About</nav>
                    <article><p>I spent the weekend in the &amp; mountains.</p></article>
                </body>
            </html>"#,
        )
        .create_async()
        .await;

    let extractor = ContentExtractor::new(&ExtractionSettings {
        max_content_length: 50_000,
        fetch_timeout_secs: 5,
    });

    let content = extractor.extract_from_website(&server.url()).await.unwrap();

    assert_eq!(content.title.as_deref(), Some("Alex's Blog"));
    assert_eq!(content.meta_description.as_deref(), Some("Notes on climbing"));
    assert!(content.body.contains("weekend in the & mountains"));
    assert!(!content.body.contains("tracking"));
    assert!(!content.body.contains("<p>"));
}

#[tokio::test]
async fn test_extractor_respects_length_cap() {
    let mut server = mockito::Server::new_async().await;

    let long_body = format!("<html><body>{}</body></html>", "word ".repeat(10_000));
    server
        .mock("GET", "/")
        .with_status(200)
        .with_body(long_body)
        .create_async()
        .await;

    let extractor = ContentExtractor::new(&ExtractionSettings {
        max_content_length: 1_000,
        fetch_timeout_secs: 5,
    });

    let content = extractor.extract_from_website(&server.url()).await.unwrap();
    assert!(content.body.len() <= 1_000);
}
