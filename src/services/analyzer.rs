use crate::config::OpenAiSettings;
use crate::models::{ApplicationMatchReport, CompatibilityReport, PsychProfile};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from the hosted AI completion API
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Failed to parse analysis: {0}")]
    ParseError(String),

    #[error("Analyzer not configured: {0}")]
    NotConfigured(String),
}

/// A completed analysis with provider accounting
#[derive(Debug, Clone)]
pub struct Analysis<T> {
    pub result: T,
    pub tokens_used: u32,
    pub analyzed_at: DateTime<Utc>,
}

/// Client for the hosted LLM chat-completions API
///
/// All "psychological" work happens provider-side: this client builds the
/// prompt, forces a JSON response, and parses the blob into typed reports.
pub struct AnalyzerClient {
    config: OpenAiSettings,
    client: Client,
}

impl AnalyzerClient {
    pub fn new(config: OpenAiSettings) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Analyze personality and psychological profile from a text corpus
    pub async fn analyze_profile(
        &self,
        corpus: &str,
        metadata: &Value,
    ) -> Result<Analysis<PsychProfile>, AnalyzerError> {
        let prompt = build_profile_prompt(corpus, metadata);

        let (json, tokens_used) = self
            .complete_json(
                "You are an expert psychologist specializing in personality analysis \
                 and compatibility assessment. Provide detailed, evidence-based insights \
                 in valid JSON format only.",
                &prompt,
            )
            .await?;

        let profile: PsychProfile = serde_json::from_value(json)
            .map_err(|e| AnalyzerError::ParseError(e.to_string()))?;

        Ok(Analysis {
            result: profile,
            tokens_used,
            analyzed_at: Utc::now(),
        })
    }

    /// Calculate compatibility between two profiles, optionally against
    /// the first person's stated preferences
    pub async fn calculate_compatibility(
        &self,
        profile_a: &Value,
        profile_b: &Value,
        preferences: &Value,
    ) -> Result<Analysis<CompatibilityReport>, AnalyzerError> {
        let prompt = build_compatibility_prompt(profile_a, profile_b, preferences);

        let (json, tokens_used) = self
            .complete_json(
                "You are an expert matchmaker and relationship counselor. Provide \
                 detailed, honest compatibility assessments in valid JSON format only.",
                &prompt,
            )
            .await?;

        let report: CompatibilityReport = serde_json::from_value(json)
            .map_err(|e| AnalyzerError::ParseError(e.to_string()))?;

        Ok(Analysis {
            result: report,
            tokens_used,
            analyzed_at: Utc::now(),
        })
    }

    /// Evaluate how well application answers match the doc owner's preferences
    pub async fn analyze_application_match(
        &self,
        doc_preferences: &Value,
        owner_profile: &Value,
        answers: &Value,
        applicant_profile: &Value,
    ) -> Result<Analysis<ApplicationMatchReport>, AnalyzerError> {
        let prompt = build_application_match_prompt(
            doc_preferences,
            owner_profile,
            answers,
            applicant_profile,
        );

        let (json, tokens_used) = self
            .complete_json(
                "You are an expert at evaluating dating applications. Provide honest, \
                 detailed assessments in valid JSON format only.",
                &prompt,
            )
            .await?;

        let report: ApplicationMatchReport = serde_json::from_value(json)
            .map_err(|e| AnalyzerError::ParseError(e.to_string()))?;

        Ok(Analysis {
            result: report,
            tokens_used,
            analyzed_at: Utc::now(),
        })
    }

    /// Verify the client is configured with an API key
    pub fn health_check(&self) -> Result<(), AnalyzerError> {
        if self.config.api_key.is_empty() {
            return Err(AnalyzerError::NotConfigured(
                "AI provider API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Send a chat completion forced to JSON output, returning the parsed
    /// body and the total token count
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<(Value, u32), AnalyzerError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.3,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        tracing::debug!(
            model = %self.config.model,
            prompt_len = user.len(),
            "Sending request to completion API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalyzerError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(AnalyzerError::RateLimited);
            }

            return Err(AnalyzerError::ApiError(format!(
                "Completion API error {}: {}",
                status, error_text
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::ApiError(format!("Failed to parse response: {}", e)))?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or(AnalyzerError::EmptyResponse)?;

        let json: Value = serde_json::from_str(&content)
            .map_err(|e| AnalyzerError::ParseError(e.to_string()))?;

        let tokens_used = api_response
            .usage
            .map(|u| u.total_tokens)
            .unwrap_or_default();

        Ok((json, tokens_used))
    }
}

/// Corpus text is capped before prompting (provider context limits)
const MAX_CORPUS_CHARS: usize = 15_000;

fn truncate_corpus(corpus: &str) -> &str {
    match corpus.char_indices().nth(MAX_CORPUS_CHARS) {
        Some((idx, _)) => &corpus[..idx],
        None => corpus,
    }
}

fn build_profile_prompt(corpus: &str, metadata: &Value) -> String {
    let sources = metadata
        .get("sources")
        .and_then(|s| s.as_array())
        .map(|sources| {
            sources
                .iter()
                .filter_map(|s| {
                    let kind = s.get("type").and_then(|t| t.as_str())?;
                    let url = s.get("url").and_then(|u| u.as_str())?;
                    Some(format!("{}: {}", kind, url))
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    format!(
        "You are an expert psychologist and personality analyst. Analyze the following \
         content written by or about a person and provide a comprehensive psychological \
         profile.\n\nContent to analyze:\n{}\n{}\n\
         Respond with a JSON object containing: personality_traits (big-five, 0-1 scores), \
         communication_style (primary_style, tone, vocabulary_level, authenticity_score), \
         interests, passions, values, thinking_style, humor_type, emotional_intelligence, \
         social_orientation, lifestyle_indicators, relationship_indicators, red_flags, \
         green_flags, conversation_topics, life_stage, overall_summary.\n\
         Be thorough, nuanced, and base your analysis on concrete evidence from the text.",
        truncate_corpus(corpus),
        if sources.is_empty() {
            String::new()
        } else {
            format!("\nSources: {}\n", sources)
        },
    )
}

fn build_compatibility_prompt(profile_a: &Value, profile_b: &Value, preferences: &Value) -> String {
    let prefs_section = if preferences.as_object().map(|o| o.is_empty()).unwrap_or(true) {
        String::new()
    } else {
        format!(
            "\nPerson 1's stated preferences:\n{}\n",
            serde_json::to_string_pretty(preferences).unwrap_or_default()
        )
    };

    format!(
        "You are an expert relationship counselor and matchmaker. Analyze the \
         compatibility between two people based on their psychological profiles.\n\n\
         Person 1 Profile:\n{}\n\nPerson 2 Profile:\n{}\n{}\
         Respond with a JSON object containing: overall_compatibility_score (0-100), \
         confidence_level (0-1), compatibility_breakdown (personality_match, \
         interests_overlap, values_alignment, communication_compatibility, \
         lifestyle_compatibility, each 0-100), matching_factors, conversation_potential, \
         relationship_potential, red_flags, green_flags, areas_of_growth, date_ideas, \
         recommendation, summary, conversation_starters.\n\
         Be honest, nuanced, and evidence-based. Consider both compatibility and \
         complementarity.",
        serde_json::to_string_pretty(profile_a).unwrap_or_default(),
        serde_json::to_string_pretty(profile_b).unwrap_or_default(),
        prefs_section,
    )
}

fn build_application_match_prompt(
    doc_preferences: &Value,
    owner_profile: &Value,
    answers: &Value,
    applicant_profile: &Value,
) -> String {
    format!(
        "Analyze how well an application matches the date-me-doc creator's preferences \
         and questions.\n\nDoc Owner's Profile:\n{}\n\nDoc Owner's Preferences:\n{}\n\n\
         Applicant's Profile:\n{}\n\nApplicant's Answers:\n{}\n\n\
         Respond with a JSON object containing: preference_match_score (0-100), \
         answer_quality_score (0-100), authenticity_score (0-100), effort_score (0-100), \
         preference_matches, standout_answers, concerning_answers, overall_impression, \
         recommendation, summary.",
        serde_json::to_string_pretty(owner_profile).unwrap_or_default(),
        serde_json::to_string_pretty(doc_preferences).unwrap_or_default(),
        serde_json::to_string_pretty(applicant_profile).unwrap_or_default(),
        serde_json::to_string_pretty(answers).unwrap_or_default(),
    )
}

// ============================================================================
// Completion API request/response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiSettings;

    fn test_settings() -> OpenAiSettings {
        OpenAiSettings {
            endpoint: "https://api.test/v1".to_string(),
            api_key: "sk-test".to_string(),
            model: "gpt-4-turbo-preview".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_health_check_requires_key() {
        let client = AnalyzerClient::new(OpenAiSettings {
            api_key: String::new(),
            ..test_settings()
        });
        assert!(client.health_check().is_err());

        let client = AnalyzerClient::new(test_settings());
        assert!(client.health_check().is_ok());
    }

    #[test]
    fn test_truncate_corpus() {
        let short = "hello";
        assert_eq!(truncate_corpus(short), "hello");

        let long = "a".repeat(MAX_CORPUS_CHARS + 100);
        assert_eq!(truncate_corpus(&long).len(), MAX_CORPUS_CHARS);
    }

    #[test]
    fn test_profile_prompt_includes_sources() {
        let metadata = serde_json::json!({
            "sources": [
                { "type": "website", "url": "https://blog.example.com", "success": true }
            ]
        });

        let prompt = build_profile_prompt("Some writing.", &metadata);
        assert!(prompt.contains("website: https://blog.example.com"));
        assert!(prompt.contains("Some writing."));
    }

    #[test]
    fn test_compatibility_prompt_skips_empty_preferences() {
        let a = serde_json::json!({ "interests": ["hiking"] });
        let b = serde_json::json!({ "interests": ["reading"] });

        let without = build_compatibility_prompt(&a, &b, &serde_json::json!({}));
        assert!(!without.contains("stated preferences"));

        let with = build_compatibility_prompt(&a, &b, &serde_json::json!({ "age": 30 }));
        assert!(with.contains("stated preferences"));
    }
}
